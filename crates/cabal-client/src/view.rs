//! Per-cabal view state derived from the log.
//!
//! Everything here is plain data plus the rules for changing it; no I/O.
//! The dispatcher feeds it log reads and live events and turns the results
//! into UI events.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use cabal_shared::constants::DEFAULT_USERNAME;

use crate::backend::UserInfo;
use crate::models::{Message, User};

/// Record of a live message subscription on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListener {
    pub channel: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionView {
    /// Channel currently shown for this cabal.
    pub channel: String,
    /// Joined channels in join order.
    channels: Vec<String>,
    users: IndexMap<String, User>,
    /// Key of this client's own feed, once the log library has told us.
    local_key: Option<String>,
    channel_messages: HashMap<String, Vec<Message>>,
    channel_messages_unread: BTreeMap<String, u64>,
    all_channels_unread_count: u64,
    listeners: HashMap<String, ChannelListener>,
    topics: HashMap<String, String>,
}

impl SessionView {
    pub fn new(default_channel: impl Into<String>) -> Self {
        Self {
            channel: default_channel.into(),
            channels: Vec::new(),
            users: IndexMap::new(),
            local_key: None,
            channel_messages: HashMap::new(),
            channel_messages_unread: BTreeMap::new(),
            all_channels_unread_count: 0,
            listeners: HashMap::new(),
            topics: HashMap::new(),
        }
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    // ------------------------------------------------------------------
    // Channel listeners
    // ------------------------------------------------------------------

    pub fn has_listener(&self, channel: &str) -> bool {
        self.listeners.contains_key(channel)
    }

    /// Join `channel` and record a listener for it.
    ///
    /// Returns `false` when a listener already exists, in which case nothing
    /// changes.
    pub fn add_listener(&mut self, channel: &str) -> bool {
        if self.listeners.contains_key(channel) {
            return false;
        }
        if !self.channels.iter().any(|c| c == channel) {
            self.channels.push(channel.to_string());
        }
        self.listeners.insert(
            channel.to_string(),
            ChannelListener {
                channel: channel.to_string(),
                since: Utc::now(),
            },
        );
        true
    }

    /// Drop every listener, returning the channels they were on.
    pub fn take_listeners(&mut self) -> Vec<String> {
        self.listeners.drain().map(|(channel, _)| channel).collect()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Channel after the current one, wrapping to the first.
    pub fn next_channel(&self) -> Option<&str> {
        if self.channels.is_empty() {
            return None;
        }
        let next = match self.position() {
            Some(i) if i + 1 < self.channels.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        Some(&self.channels[next])
    }

    /// Channel before the current one, wrapping to the last.
    pub fn previous_channel(&self) -> Option<&str> {
        if self.channels.is_empty() {
            return None;
        }
        let prev = match self.position() {
            Some(i) if i > 0 => i - 1,
            _ => self.channels.len() - 1,
        };
        Some(&self.channels[prev])
    }

    fn position(&self) -> Option<usize> {
        self.channels.iter().position(|c| *c == self.channel)
    }

    // ------------------------------------------------------------------
    // Message buffers
    // ------------------------------------------------------------------

    pub fn messages(&self, channel: &str) -> &[Message] {
        self.channel_messages
            .get(channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replace the whole buffer of `channel`.
    pub fn replace_messages(&mut self, channel: &str, messages: Vec<Message>) {
        self.channel_messages.insert(channel.to_string(), messages);
    }

    pub fn push_message(&mut self, channel: &str, message: Message) {
        self.channel_messages
            .entry(channel.to_string())
            .or_default()
            .push(message);
    }

    // ------------------------------------------------------------------
    // Unread counters
    // ------------------------------------------------------------------

    pub fn unread(&self, channel: &str) -> u64 {
        self.channel_messages_unread.get(channel).copied().unwrap_or(0)
    }

    pub fn unread_counts(&self) -> &BTreeMap<String, u64> {
        &self.channel_messages_unread
    }

    pub fn all_unread(&self) -> u64 {
        self.all_channels_unread_count
    }

    /// Set the counter of `channel`, or bump it by one when `count` is
    /// `None`. The aggregate is recomputed from the per-channel counters.
    pub fn set_unread(&mut self, channel: &str, count: Option<u64>) -> u64 {
        let entry = self
            .channel_messages_unread
            .entry(channel.to_string())
            .or_insert(0);
        match count {
            Some(n) => *entry = n,
            None => *entry += 1,
        }
        self.all_channels_unread_count = self.channel_messages_unread.values().sum();
        self.all_channels_unread_count
    }

    // ------------------------------------------------------------------
    // Topics
    // ------------------------------------------------------------------

    pub fn topic(&self, channel: &str) -> Option<&str> {
        self.topics.get(channel).map(String::as_str)
    }

    pub fn set_topic(&mut self, channel: &str, topic: impl Into<String>) {
        self.topics.insert(channel.to_string(), topic.into());
    }

    // ------------------------------------------------------------------
    // User directory
    // ------------------------------------------------------------------

    pub fn users(&self) -> &IndexMap<String, User> {
        &self.users
    }

    pub fn local_key(&self) -> Option<&str> {
        self.local_key.as_deref()
    }

    /// Display name for `key`, falling back to the default username.
    pub fn author_name(&self, key: &str) -> String {
        self.users
            .get(key)
            .and_then(|u| u.name.clone())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }

    /// Replace the directory with a full listing from the log.
    pub fn load_users(&mut self, users: Vec<UserInfo>) {
        self.users = users
            .into_iter()
            .map(|info| {
                let user = User {
                    key: info.key.clone(),
                    name: info.name,
                    online: false,
                    local: false,
                };
                (info.key, user)
            })
            .collect();
    }

    /// Record `key` as this client's own identity.
    ///
    /// Inserts an entry named `username` when the directory has none,
    /// marks that entry (and only that entry) local and online, and returns
    /// the name the identity should go by from now on.
    pub fn resolve_local(&mut self, key: &str, username: &str) -> String {
        self.local_key = Some(key.to_string());

        let user = self.users.entry(key.to_string()).or_insert_with(|| User {
            key: key.to_string(),
            name: Some(username.to_string()),
            online: true,
            local: true,
        });
        user.local = true;
        user.online = true;
        let name = user.name.get_or_insert_with(|| username.to_string()).clone();

        for (k, user) in self.users.iter_mut() {
            if k != key {
                user.local = false;
            }
        }
        name
    }

    /// Merge a fetched directory entry into the cache.
    pub fn merge_user(&mut self, info: UserInfo) {
        let user = self
            .users
            .entry(info.key.clone())
            .or_insert_with(|| User::new(info.key.clone()));
        if let Some(name) = info.name {
            user.name = Some(name);
        }
        if user.name.is_none() {
            user.name = Some(DEFAULT_USERNAME.to_string());
        }
    }

    /// Mark `key` online, inserting an entry for a peer never seen before.
    pub fn peer_connected(&mut self, key: &str) {
        self.users
            .entry(key.to_string())
            .or_insert_with(|| User::new(key))
            .online = true;
    }

    /// Mark `key` offline. Unknown peers are ignored; returns whether an
    /// entry was found.
    pub fn peer_disconnected(&mut self, key: &str) -> bool {
        match self.users.get_mut(key) {
            Some(user) => {
                user.online = false;
                true
            }
            None => false,
        }
    }
}
