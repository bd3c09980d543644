//! State-change events emitted to the UI.
//!
//! Every event serializes with a `type` tag (`VIEW_CABAL`, `UPDATE_CABAL`,
//! ...) and carries only what the UI needs to re-render.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use cabal_shared::Address;
use cabal_store::CabalSettings;

use crate::models::{Message, User};

/// Top-level screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Main,
    AddCabal,
}

/// Partial update of one cabal. Only the fields that changed are set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CabalUpdate {
    pub addr: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<CabalSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<IndexMap<String, User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_messages_unread: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_channels_unread_count: Option<u64>,
}

impl CabalUpdate {
    pub fn new(addr: Address) -> Self {
        Self {
            addr,
            username: None,
            settings: None,
            messages: None,
            users: None,
            channel_messages_unread: None,
            all_channels_unread_count: None,
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn settings(mut self, settings: CabalSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn users(mut self, users: IndexMap<String, User>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn unread(mut self, per_channel: BTreeMap<String, u64>, total: u64) -> Self {
        self.channel_messages_unread = Some(per_channel);
        self.all_channels_unread_count = Some(total);
        self
    }
}

/// Everything the UI shows for one cabal. Connection handles are never
/// part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CabalSnapshot {
    pub addr: Address,
    pub all_channels_unread_count: u64,
    pub channel: String,
    pub channel_messages_unread: BTreeMap<String, u64>,
    pub channels: Vec<String>,
    pub messages: Vec<Message>,
    pub settings: CabalSettings,
    pub username: String,
    pub users: IndexMap<String, User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateEvent {
    ViewCabal {
        addr: Address,
        channel: String,
    },
    UpdateCabal(CabalUpdate),
    AddCabal(Box<CabalSnapshot>),
    DeleteCabal {
        addr: Address,
    },
    ChangeScreen {
        screen: Screen,
        #[serde(skip_serializing_if = "Option::is_none")]
        addr: Option<Address>,
    },
    UpdateTopic {
        addr: Address,
        topic: String,
    },
    UpdateWindowBadge {
        #[serde(rename = "badgeCount")]
        badge_count: u64,
    },
    ShowCabalSettings {
        addr: Address,
    },
    HideCabalSettings,
    ShowEmojiPicker,
    HideEmojiPicker,
}

/// Sending side of the UI event stream.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<StateEvent>,
}

impl EventEmitter {
    pub fn new(tx: mpsc::UnboundedSender<StateEvent>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: StateEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::error!(event = ?e.0, "Failed to emit event, UI receiver is gone");
        }
    }
}
