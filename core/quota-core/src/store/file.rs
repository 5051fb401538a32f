//! File-backed token store.
//!
//! Secrets live in `secrets.json`, layered settings in `settings.json`, both
//! under the storage root. Every read goes back to disk so edits made by
//! another process are picked up on the next query.
//!
//! # File Format
//!
//! ```json
//! { "version": 1, "secrets": { "quotaHud.token": "..." } }
//! { "version": 1, "scopes": { "global": { "quotaHud.token": "..." } } }
//! ```
//!
//! Empty, corrupt or wrong-version files read as empty (logged), so a bad
//! file degrades to "no credential" instead of an error.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};
use crate::storage::{write_json_atomic, StorageConfig};

use super::{SettingScope, TokenStore};

const FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SecretsFile {
    version: u32,
    #[serde(default)]
    secrets: HashMap<String, String>,
}

impl Default for SecretsFile {
    fn default() -> Self {
        Self {
            version: FILE_VERSION,
            secrets: HashMap::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    version: u32,
    #[serde(default)]
    scopes: BTreeMap<SettingScope, HashMap<String, String>>,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            version: FILE_VERSION,
            scopes: BTreeMap::new(),
        }
    }
}

trait Versioned {
    fn version(&self) -> u32;
}

impl Versioned for SecretsFile {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for SettingsFile {
    fn version(&self) -> u32 {
        self.version
    }
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    secrets_path: PathBuf,
    settings_path: PathBuf,
}

impl FileTokenStore {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            secrets_path: storage.secrets_file(),
            settings_path: storage.settings_file(),
        }
    }

    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn load_secrets(&self) -> Result<SecretsFile> {
        load_versioned(&self.secrets_path)
    }

    fn load_settings(&self) -> Result<SettingsFile> {
        load_versioned(&self.settings_path)
    }

    fn save_secrets(&self, file: &SecretsFile) -> Result<()> {
        write_json_atomic(&self.secrets_path, file)?;
        restrict_permissions(&self.secrets_path)
    }
}

fn load_versioned<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default + Versioned,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(TokenError::Io {
                context: format!("read {}", path.display()),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        tracing::warn!(path = %path.display(), "Empty store file, treating as empty");
        return Ok(T::default());
    }

    match serde_json::from_str::<T>(&content) {
        Ok(file) if file.version() == FILE_VERSION => Ok(file),
        Ok(file) => {
            tracing::warn!(
                path = %path.display(),
                version = file.version(),
                expected = FILE_VERSION,
                "Unsupported store file version, treating as empty"
            );
            Ok(T::default())
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Failed to parse store file, treating as empty"
            );
            Ok(T::default())
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
        TokenError::Io {
            context: format!("chmod {}", path.display()),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn secret_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_secrets()?.secrets.remove(key))
    }

    fn secret_set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut file = self.load_secrets()?;
        file.secrets.insert(key.to_string(), value.to_string());
        self.save_secrets(&file)
    }

    fn secret_delete(&mut self, key: &str) -> Result<()> {
        let mut file = self.load_secrets()?;
        if file.secrets.remove(key).is_none() {
            return Ok(());
        }
        self.save_secrets(&file)
    }

    fn setting_get(&self, key: &str) -> Result<Option<String>> {
        let mut file = self.load_settings()?;
        Ok(SettingScope::PRECEDENCE
            .iter()
            .find_map(|scope| file.scopes.get_mut(scope).and_then(|layer| layer.remove(key))))
    }

    fn setting_set(&mut self, key: &str, value: Option<&str>, scope: SettingScope) -> Result<()> {
        let mut file = self.load_settings()?;
        match value {
            Some(value) => {
                file.scopes
                    .entry(scope)
                    .or_default()
                    .insert(key.to_string(), value.to_string());
            }
            None => {
                let removed = file
                    .scopes
                    .get_mut(&scope)
                    .and_then(|layer| layer.remove(key));
                if removed.is_none() {
                    return Ok(());
                }
            }
        }
        write_json_atomic(&self.settings_path, &file)
    }
}
