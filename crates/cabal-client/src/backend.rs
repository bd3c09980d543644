//! Contract with the peer-to-peer log library.
//!
//! Replication, swarm discovery and log merging all happen behind these
//! traits. The client only reads channels, messages, topics and users out
//! of a store and publishes new entries into it.
//!
//! Live changes are pushed back as [`SessionEvent`]s over the unbounded
//! channel handed to [`LogBackend::open`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use cabal_shared::Address;

use crate::error::BackendError;
use crate::models::MessageType;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Sender half the backend pushes live events into.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// A message entry as stored in a channel's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Key of the feed (participant) that wrote the entry.
    pub key: String,
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Milliseconds since the Unix epoch, as reported by the author.
    pub timestamp: i64,
    pub text: String,
}

/// A message about to be published by the local identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub channel: String,
    pub text: String,
}

impl OutgoingMessage {
    pub fn text(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Text,
            channel: channel.into(),
            text: text.into(),
        }
    }

    pub fn emote(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Emote,
            channel: channel.into(),
            text: text.into(),
        }
    }
}

/// A user directory entry as the log library knows it.
///
/// Fields the library has no value for are `None` and must not overwrite
/// what the client already knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub key: String,
    pub name: Option<String>,
}

/// Options for opening a store.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub max_feeds: usize,
    pub username: String,
}

/// A live change inside one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    ChannelAdded(String),
    /// A message arrived on a watched channel.
    Message(LogEntry),
    /// A user directory entry changed; carries the user key.
    UserUpdated(String),
    PeerAdded(String),
    PeerDropped(String),
}

/// A [`LogEvent`] tagged with the cabal it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub addr: Address,
    pub event: LogEvent,
}

/// Factory for stores.
#[async_trait]
pub trait LogBackend: Send + Sync {
    /// Open (or create) the store for `addr` rooted at `dir`.
    async fn open(
        &self,
        dir: &Path,
        addr: &Address,
        options: OpenOptions,
        events: EventSender,
    ) -> BackendResult<Arc<dyn CabalStore>>;
}

/// One opened cabal.
#[async_trait]
pub trait CabalStore: Send + Sync {
    /// Resolves once the underlying logs are loaded.
    async fn ready(&self) -> BackendResult<()>;

    /// Start replicating with the swarm for this cabal.
    async fn join_swarm(&self) -> BackendResult<Arc<dyn Swarm>>;

    async fn get_channels(&self) -> BackendResult<Vec<String>>;

    /// Start delivering [`LogEvent::Message`] for `channel`.
    fn watch_channel(&self, channel: &str);

    fn unwatch_channel(&self, channel: &str);

    /// Up to `limit` newest entries of `channel`, newest first.
    async fn read_messages(&self, channel: &str, limit: usize) -> BackendResult<Vec<LogEntry>>;

    async fn get_topic(&self, channel: &str) -> BackendResult<Option<String>>;

    async fn get_users(&self) -> BackendResult<Vec<UserInfo>>;

    async fn get_user(&self, key: &str) -> BackendResult<UserInfo>;

    /// Key of the local writer feed.
    async fn local_key(&self) -> BackendResult<String>;

    async fn publish_nick(&self, nick: &str) -> BackendResult<()>;

    async fn publish(&self, message: OutgoingMessage) -> BackendResult<()>;

    async fn publish_topic(&self, channel: &str, topic: &str) -> BackendResult<()>;
}

/// Replication handle of a store.
pub trait Swarm: Send + Sync {
    /// Currently open peer connections.
    fn connections(&self) -> Vec<Arc<dyn PeerConnection>>;
}

pub trait PeerConnection: Send + Sync {
    fn remote_key(&self) -> Option<String>;

    /// Detach every callback registered on this connection so that nothing
    /// fires after its cabal is gone.
    fn remove_all_listeners(&self);
}
