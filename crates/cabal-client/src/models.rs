//! View-level records handed to the UI.

use serde::{Deserialize, Serialize};

use crate::backend::LogEntry;

/// Type tag of a message.
///
/// The log library may define types this client does not know about; they
/// are carried through as [`MessageType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// `chat/text`
    Text,
    /// `chat/emote`
    Emote,
    /// `local/system`, generated by this client and never published.
    LocalSystem,
    Other(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "chat/text",
            Self::Emote => "chat/emote",
            Self::LocalSystem => "local/system",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "chat/text" => Self::Text,
            "chat/emote" => Self::Emote,
            "local/system" => Self::LocalSystem,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<MessageType> for String {
    fn from(t: MessageType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as shown in a channel buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub content: String,
    /// Author key followed by the timestamp. Two messages from the same
    /// author with the same timestamp share a key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(rename = "type")]
    pub kind: MessageType,
}

impl Message {
    pub fn from_entry(entry: &LogEntry, author: String) -> Self {
        Self {
            author: Some(author),
            content: entry.text.clone(),
            key: Some(format!("{}{}", entry.key, entry.timestamp)),
            time: Some(entry.timestamp),
            kind: entry.kind.clone(),
        }
    }

    pub fn local_system(content: impl Into<String>) -> Self {
        Self {
            author: None,
            content: content.into(),
            key: None,
            time: None,
            kind: MessageType::LocalSystem,
        }
    }
}

/// An entry of a cabal's user directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub online: bool,
    /// Set on the entry belonging to this client's own identity.
    pub local: bool,
}

impl User {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }
}
