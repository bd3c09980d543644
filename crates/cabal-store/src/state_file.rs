//! The state file and the identity directories beside it.
//!
//! Layout of the data directory:
//!
//! ```text
//! ~/.cabal-desktop/v1/
//!   cabals.json        <- this module
//!   .tmp/              <- scratch space, never an identity
//!   <64 hex chars>/    <- one log directory per cabal
//! ```
//!
//! The state file is a JSON object keyed by cabal address whose values are
//! themselves JSON-encoded [`PersistedCabal`] strings. It is rewritten whole
//! on every change.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use indexmap::IndexMap;
use tracing::{debug, warn};

use cabal_shared::constants::{DATABASE_VERSION, DATA_DIR_NAME, KEY_HEX_LEN, STATE_FILE_NAME};
use cabal_shared::Address;

use crate::error::{Result, StoreError};
use crate::models::PersistedCabal;

/// Default data directory: `~/.cabal-desktop/v<DATABASE_VERSION>`.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().ok_or(StoreError::NoHomeDir)?;
    Ok(base
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(format!("v{DATABASE_VERSION}")))
}

/// Handle on the data directory and its state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    data_dir: PathBuf,
    state_path: PathBuf,
}

impl StateStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let state_path = data_dir.join(STATE_FILE_NAME);
        Self {
            data_dir,
            state_path,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Directory the log library keeps a cabal's data in.
    pub fn cabal_dir(&self, addr: &Address) -> PathBuf {
        self.data_dir.join(addr.as_str())
    }

    /// Read every persisted cabal.
    ///
    /// Never fails: a missing or unreadable file yields an empty list, and
    /// entries that do not decode are skipped.
    pub async fn read(&self) -> Vec<PersistedCabal> {
        match self.try_read().await {
            Ok(cabals) => cabals,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.state_path.display(), "No state file yet");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.state_path.display(), error = %e, "Ignoring unreadable state file");
                Vec::new()
            }
        }
    }

    async fn try_read(&self) -> Result<Vec<PersistedCabal>> {
        let raw = tokio::fs::read_to_string(&self.state_path).await?;
        let doc: IndexMap<String, String> = serde_json::from_str(&raw)?;

        let mut cabals = Vec::with_capacity(doc.len());
        for (key, encoded) in doc {
            match serde_json::from_str::<PersistedCabal>(&encoded) {
                Ok(cabal) => cabals.push(cabal),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed state entry"),
            }
        }
        Ok(cabals)
    }

    /// Replace the state file with exactly `cabals`, in order.
    pub async fn write(&self, cabals: &[PersistedCabal]) -> Result<()> {
        let mut doc: IndexMap<&str, String> = IndexMap::with_capacity(cabals.len());
        for cabal in cabals {
            doc.insert(cabal.addr.as_str(), serde_json::to_string(cabal)?);
        }
        let json = serde_json::to_string_pretty(&doc)?;

        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::write(&self.state_path, json).await?;

        debug!(path = %self.state_path.display(), count = cabals.len(), "State file written");
        Ok(())
    }

    /// Names of the identity directories under the data dir.
    ///
    /// Creates the data dir when it does not exist yet, in which case the
    /// list is empty.
    pub async fn list_identity_dirs(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&self.data_dir).await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        filter_for_keys(&mut names);
        Ok(names)
    }
}

/// Drop every name that is not exactly one hex key long.
///
/// Walks from the back and fills each hole with the current last element,
/// so the vector is compacted in place without a second allocation.
/// Relative order of the survivors is not preserved.
pub fn filter_for_keys(names: &mut Vec<String>) {
    let mut i = names.len();
    while i > 0 {
        i -= 1;
        if names[i].len() != KEY_HEX_LEN {
            names.swap_remove(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CabalSettings;

    fn addr(byte: u8) -> Address {
        Address::from_bytes(&[byte; 32])
    }

    #[test]
    fn test_filter_for_keys() {
        let key = "a".repeat(64);
        let mut names = vec![
            ".tmp".to_string(),
            key.clone(),
            "cabals.json".to_string(),
            "b".repeat(63),
        ];
        filter_for_keys(&mut names);
        assert_eq!(names, vec![key]);
    }

    #[test]
    fn test_filter_for_keys_keeps_all_valid() {
        let mut names = vec!["a".repeat(64), "b".repeat(64), "c".repeat(64)];
        filter_for_keys(&mut names);
        names.sort();
        assert_eq!(names, vec!["a".repeat(64), "b".repeat(64), "c".repeat(64)]);

        let mut empty: Vec<String> = Vec::new();
        filter_for_keys(&mut empty);
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let cabals = vec![
            PersistedCabal {
                username: "alice".into(),
                addr: addr(1),
                settings: CabalSettings {
                    enable_notifications: true,
                    alias: "work".into(),
                },
            },
            PersistedCabal {
                username: "bob".into(),
                addr: addr(2),
                settings: CabalSettings::default(),
            },
        ];

        store.write(&cabals).await.unwrap();
        assert_eq!(store.read().await, cabals);
    }

    #[tokio::test]
    async fn test_on_disk_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let cabal = PersistedCabal {
            username: "alice".into(),
            addr: addr(3),
            settings: CabalSettings {
                enable_notifications: true,
                alias: String::new(),
            },
        };
        store.write(std::slice::from_ref(&cabal)).await.unwrap();

        let raw = std::fs::read_to_string(store.state_path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let encoded = doc[addr(3).as_str()].as_str().unwrap();
        let entry: serde_json::Value = serde_json::from_str(encoded).unwrap();

        assert_eq!(entry["username"], "alice");
        assert_eq!(entry["addr"], addr(3).as_str());
        assert_eq!(entry["settings"]["enableNotifications"], true);
        assert_eq!(entry["settings"]["alias"], "");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested"));
        assert!(store.read().await.is_empty());

        std::fs::create_dir_all(store.data_dir()).unwrap();
        std::fs::write(store.state_path(), "{ not json").unwrap();
        assert!(store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let good = PersistedCabal {
            username: "carol".into(),
            addr: addr(4),
            settings: CabalSettings::default(),
        };
        let doc = serde_json::json!({
            "garbage": "{\"username\": 5}",
            good.addr.as_str(): serde_json::to_string(&good).unwrap(),
        });
        std::fs::write(store.state_path(), doc.to_string()).unwrap();

        assert_eq!(store.read().await, vec![good]);
    }

    #[tokio::test]
    async fn test_list_identity_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let key = "c".repeat(64);
        std::fs::create_dir(dir.path().join(&key)).unwrap();
        std::fs::create_dir(dir.path().join(".tmp")).unwrap();

        assert_eq!(store.list_identity_dirs().await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn test_list_identity_dirs_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("v1"));

        assert!(store.list_identity_dirs().await.unwrap().is_empty());
        assert!(store.data_dir().is_dir());
    }
}
