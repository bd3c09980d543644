//! In-process implementation of the log library contract.
//!
//! Keeps every cabal in memory and never touches the network. Useful for
//! running the client offline and for exercising the dispatcher in tests:
//! the `inject_*` helpers play the part of remote peers.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use cabal_shared::identity::generate_address;
use cabal_shared::Address;

use crate::backend::{
    BackendResult, CabalStore, EventSender, LogBackend, LogEntry, LogEvent, OpenOptions,
    OutgoingMessage, PeerConnection, SessionEvent, Swarm, UserInfo,
};
use crate::error::BackendError;

/// Backend handing out [`MemoryStore`]s, one per address.
///
/// Opening the same address twice returns the same store, so history
/// survives a remove / re-add cycle within one process.
#[derive(Default)]
pub struct MemoryBackend {
    stores: Mutex<HashMap<Address, Arc<MemoryStore>>>,
    broken: Mutex<HashSet<Address>>,
    keyless: Mutex<HashSet<Address>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store opened for `addr`, if any.
    pub fn store(&self, addr: &Address) -> Option<Arc<MemoryStore>> {
        lock(&self.stores).get(addr).cloned()
    }

    /// Make the store for `addr` fail its readiness check.
    pub fn break_store(&self, addr: &Address) {
        lock(&self.broken).insert(addr.clone());
    }

    /// Make the store for `addr` load fine but never report its own key.
    pub fn withhold_local_key(&self, addr: &Address) {
        lock(&self.keyless).insert(addr.clone());
    }
}

#[async_trait]
impl LogBackend for MemoryBackend {
    async fn open(
        &self,
        dir: &Path,
        addr: &Address,
        options: OpenOptions,
        events: EventSender,
    ) -> BackendResult<Arc<dyn CabalStore>> {
        debug!(dir = %dir.display(), addr = %addr.short(), max_feeds = options.max_feeds, "Opening memory store");

        let broken = lock(&self.broken).contains(addr);
        let keyless = lock(&self.keyless).contains(addr);
        let mut stores = lock(&self.stores);
        let store = stores
            .entry(addr.clone())
            .or_insert_with(|| Arc::new(MemoryStore::new(addr.clone(), events.clone())));
        store.reattach(events, broken, keyless);
        Ok(store.clone() as Arc<dyn CabalStore>)
    }
}

#[derive(Default)]
struct Inner {
    channels: Vec<String>,
    /// Per channel, in append order.
    messages: HashMap<String, Vec<LogEntry>>,
    topics: HashMap<String, String>,
    users: IndexMap<String, UserInfo>,
    watched: HashSet<String>,
    broken: bool,
    keyless: bool,
    clock: i64,
}

/// One cabal held in memory.
pub struct MemoryStore {
    addr: Address,
    local_key: String,
    events: Mutex<EventSender>,
    inner: Mutex<Inner>,
    connections: Arc<Mutex<Vec<Arc<MemoryConnection>>>>,
}

impl MemoryStore {
    pub fn new(addr: Address, events: EventSender) -> Self {
        Self {
            addr,
            local_key: generate_address().to_string(),
            events: Mutex::new(events),
            inner: Mutex::new(Inner::default()),
            connections: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn reattach(&self, events: EventSender, broken: bool, keyless: bool) {
        *lock(&self.events) = events;
        let mut inner = lock(&self.inner);
        inner.broken = broken;
        inner.keyless = keyless;
        inner.watched.clear();
    }

    pub fn local_feed_key(&self) -> &str {
        &self.local_key
    }

    fn emit(&self, event: LogEvent) {
        let sent = lock(&self.events).send(SessionEvent {
            addr: self.addr.clone(),
            event,
        });
        if sent.is_err() {
            debug!(addr = %self.addr.short(), "Dropping log event, nobody is listening");
        }
    }

    fn append(&self, entry: LogEntry) {
        let (new_channel, watched) = {
            let mut inner = lock(&self.inner);
            inner.clock = inner.clock.max(entry.timestamp);
            let new_channel = !inner.channels.contains(&entry.channel);
            if new_channel {
                inner.channels.push(entry.channel.clone());
            }
            inner
                .messages
                .entry(entry.channel.clone())
                .or_default()
                .push(entry.clone());
            (new_channel, inner.watched.contains(&entry.channel))
        };
        if new_channel {
            self.emit(LogEvent::ChannelAdded(entry.channel.clone()));
        }
        if watched {
            self.emit(LogEvent::Message(entry));
        }
    }

    /// Append an entry written by another participant.
    pub fn inject_message(&self, entry: LogEntry) {
        self.append(entry);
    }

    /// Store a directory entry and announce the change.
    pub fn inject_user(&self, key: &str, name: Option<&str>) {
        lock(&self.inner).users.insert(
            key.to_string(),
            UserInfo {
                key: key.to_string(),
                name: name.map(str::to_string),
            },
        );
        self.emit(LogEvent::UserUpdated(key.to_string()));
    }

    /// Create a channel without posting to it.
    pub fn inject_channel(&self, channel: &str) {
        let added = {
            let mut inner = lock(&self.inner);
            if inner.channels.iter().any(|c| c == channel) {
                false
            } else {
                inner.channels.push(channel.to_string());
                true
            }
        };
        if added {
            self.emit(LogEvent::ChannelAdded(channel.to_string()));
        }
    }

    /// Open a connection to a peer.
    pub fn inject_peer(&self, key: &str) -> Arc<MemoryConnection> {
        let conn = Arc::new(MemoryConnection {
            remote_key: key.to_string(),
            attached: AtomicBool::new(true),
        });
        lock(&self.connections).push(conn.clone());
        self.emit(LogEvent::PeerAdded(key.to_string()));
        conn
    }

    pub fn drop_peer(&self, key: &str) {
        lock(&self.connections).retain(|c| c.remote_key != key);
        self.emit(LogEvent::PeerDropped(key.to_string()));
    }

    pub fn is_watching(&self, channel: &str) -> bool {
        lock(&self.inner).watched.contains(channel)
    }

    pub fn topic(&self, channel: &str) -> Option<String> {
        lock(&self.inner).topics.get(channel).cloned()
    }

    /// Every entry of `channel`, oldest first.
    pub fn entries(&self, channel: &str) -> Vec<LogEntry> {
        lock(&self.inner)
            .messages
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    fn check_ready(&self) -> BackendResult<()> {
        if lock(&self.inner).broken {
            Err(BackendError::NotReady(format!("store {} failed to load", self.addr.short())))
        } else {
            Ok(())
        }
    }

    fn next_timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut inner = lock(&self.inner);
        inner.clock = now.max(inner.clock + 1);
        inner.clock
    }
}

#[async_trait]
impl CabalStore for MemoryStore {
    async fn ready(&self) -> BackendResult<()> {
        self.check_ready()
    }

    async fn join_swarm(&self) -> BackendResult<Arc<dyn Swarm>> {
        self.check_ready()?;
        Ok(Arc::new(MemorySwarm {
            connections: self.connections.clone(),
        }))
    }

    async fn get_channels(&self) -> BackendResult<Vec<String>> {
        self.check_ready()?;
        Ok(lock(&self.inner).channels.clone())
    }

    fn watch_channel(&self, channel: &str) {
        lock(&self.inner).watched.insert(channel.to_string());
    }

    fn unwatch_channel(&self, channel: &str) {
        lock(&self.inner).watched.remove(channel);
    }

    async fn read_messages(&self, channel: &str, limit: usize) -> BackendResult<Vec<LogEntry>> {
        self.check_ready()?;
        let inner = lock(&self.inner);
        let mut entries = inner.messages.get(channel).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries.into_iter().rev().take(limit).collect())
    }

    async fn get_topic(&self, channel: &str) -> BackendResult<Option<String>> {
        self.check_ready()?;
        Ok(lock(&self.inner).topics.get(channel).cloned())
    }

    async fn get_users(&self) -> BackendResult<Vec<UserInfo>> {
        self.check_ready()?;
        Ok(lock(&self.inner).users.values().cloned().collect())
    }

    async fn get_user(&self, key: &str) -> BackendResult<UserInfo> {
        self.check_ready()?;
        lock(&self.inner)
            .users
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("user {key}")))
    }

    async fn local_key(&self) -> BackendResult<String> {
        self.check_ready()?;
        if lock(&self.inner).keyless {
            return Err(BackendError::NotFound("local key".into()));
        }
        Ok(self.local_key.clone())
    }

    async fn publish_nick(&self, nick: &str) -> BackendResult<()> {
        self.check_ready()?;
        self.inject_user(&self.local_key, Some(nick));
        Ok(())
    }

    async fn publish(&self, message: OutgoingMessage) -> BackendResult<()> {
        self.check_ready()?;
        let timestamp = self.next_timestamp();
        self.append(LogEntry {
            key: self.local_key.clone(),
            channel: message.channel,
            kind: message.kind,
            timestamp,
            text: message.text,
        });
        Ok(())
    }

    async fn publish_topic(&self, channel: &str, topic: &str) -> BackendResult<()> {
        self.check_ready()?;
        lock(&self.inner)
            .topics
            .insert(channel.to_string(), topic.to_string());
        Ok(())
    }
}

struct MemorySwarm {
    connections: Arc<Mutex<Vec<Arc<MemoryConnection>>>>,
}

impl Swarm for MemorySwarm {
    fn connections(&self) -> Vec<Arc<dyn PeerConnection>> {
        lock(&self.connections)
            .iter()
            .map(|c| c.clone() as Arc<dyn PeerConnection>)
            .collect()
    }
}

/// A fake peer connection that remembers whether it was detached.
pub struct MemoryConnection {
    remote_key: String,
    attached: AtomicBool,
}

impl MemoryConnection {
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl PeerConnection for MemoryConnection {
    fn remote_key(&self) -> Option<String> {
        Some(self.remote_key.clone())
    }

    fn remove_all_listeners(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
