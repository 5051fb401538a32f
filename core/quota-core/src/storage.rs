//! Storage configuration and path management for Quota HUD.
//!
//! All file paths used by the file-backed token store, the config loader and
//! the CLI log sink are derived from a single root. Production code uses
//! `StorageConfig::new()` which points to `~/.quota-hud/`; tests use
//! `StorageConfig::with_root(temp_dir)` for isolation.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Result, TokenError};

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all Quota HUD data (default: ~/.quota-hud)
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the default root under the user's home directory.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().ok_or(TokenError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(".quota-hud"),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to config.json (window durations and key names).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to secrets.json (file-backed stand-in for the OS credential store).
    pub fn secrets_file(&self) -> PathBuf {
        self.root.join("secrets.json")
    }

    /// Path to settings.json (layered plaintext settings).
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Serializes `value` as pretty JSON and writes it via temp file + rename,
/// so readers never observe a partial file.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|source| TokenError::Json {
        context: format!("serialize {}", path.display()),
        source,
    })?;

    let parent_dir = path.parent().ok_or_else(|| TokenError::Io {
        context: format!("{} has no parent directory", path.display()),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    fs::create_dir_all(parent_dir).map_err(|source| TokenError::Io {
        context: format!("create {}", parent_dir.display()),
        source,
    })?;

    let io_err = |context: &str| {
        let context = format!("{} {}", context, path.display());
        move |source: std::io::Error| TokenError::Io { context, source }
    };

    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(io_err("create temp for"))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(io_err("write temp for"))?;
    temp_file.flush().map_err(io_err("flush temp for"))?;
    temp_file
        .persist(path)
        .map_err(|e| io_err("persist")(e.error))?;

    Ok(())
}
