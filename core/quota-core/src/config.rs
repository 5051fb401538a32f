//! Configuration loading and saving.
//!
//! `config.json` holds the grace-window durations and the key names used for
//! the secret and the legacy plaintext setting. Missing or corrupt files
//! degrade to defaults; only saving can fail.

use chrono::Duration;
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};
use crate::storage::{write_json_atomic, StorageConfig};

/// How long a secure write is assumed visible before the store confirms it.
pub const DEFAULT_SECURE_ASSUME_MS: u64 = 5_000;
/// How long a kept plaintext copy is assumed present after a keep-migration.
pub const DEFAULT_LEGACY_RETAIN_MS: u64 = 5_000;
/// How long a cleared plaintext copy is hidden from stale reads.
pub const DEFAULT_LEGACY_SUPPRESS_MS: u64 = 3_000;

pub const DEFAULT_SECRET_KEY: &str = "quotaHud.token";
pub const DEFAULT_LEGACY_SETTING_KEY: &str = "quotaHud.token";

/// Durations of the three grace windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowDurations {
    pub secure_assume_ms: u64,
    pub legacy_retain_ms: u64,
    pub legacy_suppress_ms: u64,
}

impl Default for WindowDurations {
    fn default() -> Self {
        Self {
            secure_assume_ms: DEFAULT_SECURE_ASSUME_MS,
            legacy_retain_ms: DEFAULT_LEGACY_RETAIN_MS,
            legacy_suppress_ms: DEFAULT_LEGACY_SUPPRESS_MS,
        }
    }
}

impl WindowDurations {
    pub fn secure_assume(&self) -> Duration {
        millis(self.secure_assume_ms)
    }

    pub fn legacy_retain(&self) -> Duration {
        millis(self.legacy_retain_ms)
    }

    pub fn legacy_suppress(&self) -> Duration {
        millis(self.legacy_suppress_ms)
    }
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenConfig {
    pub windows: WindowDurations,
    /// Key the token is stored under in the secret store.
    pub secret_key: String,
    /// Setting that historically held the token in plaintext.
    pub legacy_setting_key: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            windows: WindowDurations::default(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            legacy_setting_key: DEFAULT_LEGACY_SETTING_KEY.to_string(),
        }
    }
}

/// Reads `config.json`. A missing file yields defaults; an unreadable or
/// malformed one is an error.
pub fn read_token_config(storage: &StorageConfig) -> Result<TokenConfig> {
    let path = storage.config_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TokenConfig::default())
        }
        Err(source) => {
            return Err(TokenError::Io {
                context: "read token config".to_string(),
                source,
            })
        }
    };

    serde_json::from_str(&content).map_err(|err| TokenError::ConfigMalformed {
        path,
        details: err.to_string(),
    })
}

/// Loads the token configuration, returning defaults if the file is missing
/// or unreadable.
pub fn load_token_config(storage: &StorageConfig) -> TokenConfig {
    read_token_config(storage).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Failed to load token config, using defaults");
        TokenConfig::default()
    })
}

pub fn save_token_config(storage: &StorageConfig, config: &TokenConfig) -> Result<()> {
    write_json_atomic(&storage.config_file(), config)
}
