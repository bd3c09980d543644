/// Application name
pub const APP_NAME: &str = "Cabal Desktop";

/// On-disk layout version of the underlying log database.
/// The data directory is `~/.cabal-desktop/v<DATABASE_VERSION>`.
pub const DATABASE_VERSION: u32 = 1;

/// Name of the data directory under the user's home directory
pub const DATA_DIR_NAME: &str = ".cabal-desktop";

/// File holding the persisted per-cabal client settings
pub const STATE_FILE_NAME: &str = "cabals.json";

/// Channel every cabal starts in
pub const DEFAULT_CHANNEL: &str = "default";

/// Display name used when a participant has not published a nick
pub const DEFAULT_USERNAME: &str = "conspirator";

/// Display name for local system messages without an author
pub const SYSTEM_USERNAME: &str = "Cabalbot";

/// Upper bound on feeds a single cabal store will replicate
pub const MAX_FEEDS: usize = 1000;

/// Number of messages fetched when a channel is (re)viewed
pub const HISTORY_LIMIT: usize = 100;

/// Cabal keys are 32-byte public keys, hex encoded
pub const KEY_SIZE: usize = 32;

/// Length of a hex-encoded cabal key (and of an identity directory name)
pub const KEY_HEX_LEN: usize = KEY_SIZE * 2;

/// URL schemes accepted in front of a key in an invite
pub const INVITE_SCHEMES: &[&str] = &["cabal://", "dat://"];
