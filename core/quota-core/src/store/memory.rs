//! In-memory token store.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, TokenError};

use super::{SettingScope, TokenStore};

#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    secrets: HashMap<String, String>,
    settings: BTreeMap<SettingScope, HashMap<String, String>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every secret and setting read return an error.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Makes every write return an error without changing state.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Value stored at exactly `scope`, ignoring other layers.
    pub fn setting_at(&self, key: &str, scope: SettingScope) -> Option<&str> {
        self.settings
            .get(&scope)
            .and_then(|layer| layer.get(key))
            .map(String::as_str)
    }

    fn check_read(&self, key: &str) -> Result<()> {
        if self.fail_reads {
            return Err(TokenError::SecretStore {
                operation: "read",
                key: key.to_string(),
                details: "store unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_writes {
            return Err(TokenError::SecretStore {
                operation: "write",
                key: key.to_string(),
                details: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl TokenStore for MemoryTokenStore {
    fn secret_get(&self, key: &str) -> Result<Option<String>> {
        self.check_read(key)?;
        Ok(self.secrets.get(key).cloned())
    }

    fn secret_set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_write(key)?;
        self.secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn secret_delete(&mut self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.secrets.remove(key);
        Ok(())
    }

    fn setting_get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(TokenError::SettingStore {
                operation: "read",
                key: key.to_string(),
                details: "settings unavailable".to_string(),
            });
        }
        Ok(SettingScope::PRECEDENCE
            .iter()
            .find_map(|scope| self.setting_at(key, *scope))
            .map(str::to_string))
    }

    fn setting_set(&mut self, key: &str, value: Option<&str>, scope: SettingScope) -> Result<()> {
        if self.fail_writes {
            return Err(TokenError::SettingStore {
                operation: "write",
                key: key.to_string(),
                details: "settings unavailable".to_string(),
            });
        }
        let layer = self.settings.entry(scope).or_default();
        match value {
            Some(value) => {
                layer.insert(key.to_string(), value.to_string());
            }
            None => {
                layer.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_set_get_delete() {
        let mut store = MemoryTokenStore::new();
        assert_eq!(store.secret_get("k").unwrap(), None);

        store.secret_set("k", "v").unwrap();
        assert_eq!(store.secret_get("k").unwrap().as_deref(), Some("v"));

        store.secret_delete("k").unwrap();
        assert_eq!(store.secret_get("k").unwrap(), None);
    }

    #[test]
    fn test_setting_resolves_most_specific_scope() {
        let mut store = MemoryTokenStore::new();
        store
            .setting_set("token", Some("global"), SettingScope::Global)
            .unwrap();
        store
            .setting_set("token", Some("folder"), SettingScope::WorkspaceFolder)
            .unwrap();

        assert_eq!(store.setting_get("token").unwrap().as_deref(), Some("folder"));

        store
            .setting_set("token", None, SettingScope::WorkspaceFolder)
            .unwrap();
        assert_eq!(store.setting_get("token").unwrap().as_deref(), Some("global"));
    }

    #[test]
    fn test_failure_injection() {
        let mut store = MemoryTokenStore::new();
        store.set_fail_writes(true);
        assert!(store.secret_set("k", "v").is_err());
        assert!(store
            .setting_set("k", Some("v"), SettingScope::Global)
            .is_err());

        store.set_fail_writes(false);
        store.set_fail_reads(true);
        assert!(store.secret_get("k").is_err());
        assert!(store.setting_get("k").is_err());
    }
}
