//! Intents the UI sends to the dispatcher.

use serde::Deserialize;

use cabal_shared::Address;
use cabal_store::CabalSettings;

use crate::backend::OutgoingMessage;
use crate::events::Screen;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    LoadFromDisk,
    /// Add, join or create a cabal. With neither `addr` nor a decodable
    /// `input` a brand-new cabal is created.
    AddCabal {
        #[serde(default)]
        addr: Option<Address>,
        #[serde(default)]
        input: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        settings: Option<CabalSettings>,
    },
    ViewCabal {
        addr: Address,
        #[serde(default)]
        channel: Option<String>,
    },
    /// Asks for confirmation first.
    RemoveCabal {
        addr: Address,
    },
    ConfirmRemoveCabal {
        addr: Address,
    },
    ShowCabalSettings {
        addr: Address,
    },
    HideCabalSettings,
    SaveCabalSettings {
        addr: Address,
        settings: CabalSettings,
    },
    ChangeUsername {
        addr: Address,
        username: String,
    },
    JoinChannel {
        addr: Address,
        channel: String,
    },
    LeaveChannel {
        addr: Address,
        channel: String,
    },
    ViewChannel {
        addr: Address,
        channel: String,
    },
    ViewNextChannel {
        addr: Address,
    },
    ViewPreviousChannel {
        addr: Address,
    },
    GetMessages {
        addr: Address,
        channel: String,
        count: usize,
    },
    AddMessage {
        addr: Address,
        message: OutgoingMessage,
    },
    AddLocalSystemMessage {
        addr: Address,
        #[serde(default)]
        channel: Option<String>,
        content: String,
    },
    SetChannelTopic {
        addr: Address,
        channel: String,
        topic: String,
    },
    /// Raw text from the composer; slash commands are interpreted.
    Command {
        addr: Address,
        input: String,
    },
    UpdateAppIconBadge {
        #[serde(default, rename = "badgeCount")]
        badge_count: Option<u64>,
    },
    ShowEmojiPicker,
    HideEmojiPicker,
    ChangeScreen {
        screen: Screen,
        #[serde(default)]
        addr: Option<Address>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_actions() {
        let addr = "ab".repeat(32);
        let action: Action = serde_json::from_value(serde_json::json!({
            "type": "VIEW_CABAL",
            "addr": addr,
        }))
        .unwrap();
        assert_eq!(
            action,
            Action::ViewCabal {
                addr: Address::from_hex(&addr).unwrap(),
                channel: None
            }
        );

        let action: Action = serde_json::from_value(serde_json::json!({
            "type": "ADD_CABAL",
            "input": "cabal://whatever",
        }))
        .unwrap();
        assert!(matches!(action, Action::AddCabal { addr: None, input: Some(_), .. }));

        let action: Action = serde_json::from_value(serde_json::json!({
            "type": "ADD_MESSAGE",
            "addr": addr,
            "message": { "type": "chat/text", "channel": "default", "text": "hi" },
        }))
        .unwrap();
        assert!(matches!(action, Action::AddMessage { .. }));
    }

    #[test]
    fn test_rejects_bad_address() {
        let result = serde_json::from_value::<Action>(serde_json::json!({
            "type": "VIEW_CABAL",
            "addr": "short",
        }));
        assert!(result.is_err());
    }
}
