//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so the client starts with zero
//! configuration.

use std::path::PathBuf;

use cabal_shared::constants::{DEFAULT_CHANNEL, DEFAULT_USERNAME, HISTORY_LIMIT, MAX_FEEDS};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root holding the state file and one log directory per cabal.
    /// Env: `CABAL_DATA_DIR`
    /// Default: `~/.cabal-desktop/v1`
    pub data_dir: PathBuf,

    /// Username for cabals added without one.
    /// Env: `CABAL_DEFAULT_USERNAME`
    /// Default: `conspirator`
    pub default_username: String,

    /// Channel every session starts on.
    /// Env: `CABAL_DEFAULT_CHANNEL`
    /// Default: `default`
    pub default_channel: String,

    /// Maximum number of feeds a store replicates.
    /// Env: `CABAL_MAX_FEEDS`
    /// Default: `1000`
    pub max_feeds: usize,

    /// Messages loaded when a channel is viewed.
    /// Env: `CABAL_HISTORY_LIMIT`
    /// Default: `100`
    pub history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = cabal_store::default_data_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "No home directory, using the working directory");
            PathBuf::from(cabal_shared::constants::DATA_DIR_NAME)
        });
        Self {
            data_dir,
            default_username: DEFAULT_USERNAME.to_string(),
            default_channel: DEFAULT_CHANNEL.to_string(),
            max_feeds: MAX_FEEDS,
            history_limit: HISTORY_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Defaults, rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("CABAL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(name) = lookup("CABAL_DEFAULT_USERNAME") {
            if name.trim().is_empty() {
                tracing::warn!("Empty CABAL_DEFAULT_USERNAME, using default");
            } else {
                config.default_username = name.trim().to_string();
            }
        }

        if let Some(channel) = lookup("CABAL_DEFAULT_CHANNEL") {
            if channel.trim().is_empty() {
                tracing::warn!("Empty CABAL_DEFAULT_CHANNEL, using default");
            } else {
                config.default_channel = channel.trim().to_string();
            }
        }

        if let Some(val) = lookup("CABAL_MAX_FEEDS") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_feeds = n,
                _ => tracing::warn!(value = %val, "Invalid CABAL_MAX_FEEDS, using default"),
            }
        }

        if let Some(val) = lookup("CABAL_HISTORY_LIMIT") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.history_limit = n,
                _ => tracing::warn!(value = %val, "Invalid CABAL_HISTORY_LIMIT, using default"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.default_username, "conspirator");
        assert_eq!(config.default_channel, "default");
        assert_eq!(config.max_feeds, 1000);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CABAL_DATA_DIR", "/tmp/cabal"),
            ("CABAL_DEFAULT_USERNAME", "alice"),
            ("CABAL_DEFAULT_CHANNEL", "lobby"),
            ("CABAL_MAX_FEEDS", "50"),
            ("CABAL_HISTORY_LIMIT", "20"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cabal"));
        assert_eq!(config.default_username, "alice");
        assert_eq!(config.default_channel, "lobby");
        assert_eq!(config.max_feeds, 50);
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CABAL_DEFAULT_USERNAME", "   "),
            ("CABAL_MAX_FEEDS", "lots"),
            ("CABAL_HISTORY_LIMIT", "0"),
        ]));
        assert_eq!(config.default_username, "conspirator");
        assert_eq!(config.max_feeds, 1000);
        assert_eq!(config.history_limit, 100);
    }
}
