//! Records persisted in the state file.
//!
//! Field names are camelCase on disk so the file stays readable by older
//! clients that wrote it.

use serde::{Deserialize, Serialize};

use cabal_shared::Address;

/// Per-cabal client settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CabalSettings {
    /// Raise a desktop notification for messages arriving while the
    /// window is unfocused.
    pub enable_notifications: bool,
    /// Local nickname for the cabal itself, shown instead of its key.
    pub alias: String,
}

/// One entry of the state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedCabal {
    pub username: String,
    pub addr: Address,
    #[serde(default)]
    pub settings: CabalSettings,
}
