//! Credential storage seen by the reconciler.
//!
//! The host owns the real stores; this crate only talks to them through
//! [`TokenStore`]. Implementations:
//!
//! - [`MemoryTokenStore`]: in-process maps, with failure injection for tests
//! - [`FileTokenStore`]: JSON files under the storage root (used by the CLI)
//! - [`LaggedTokenStore`]: wraps another store and delays write visibility,
//!   reproducing the eventual consistency of the host stores

mod file;
mod lagged;
mod memory;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use file::FileTokenStore;
pub use lagged::LaggedTokenStore;
pub use memory::MemoryTokenStore;

/// Settings layer a plaintext value is written to. Reads resolve the most
/// specific layer that defines the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingScope {
    Global,
    Workspace,
    WorkspaceFolder,
}

impl SettingScope {
    /// Most specific first, the order reads resolve in.
    pub const PRECEDENCE: [SettingScope; 3] = [
        SettingScope::WorkspaceFolder,
        SettingScope::Workspace,
        SettingScope::Global,
    ];
}

pub trait TokenStore {
    fn secret_get(&self, key: &str) -> Result<Option<String>>;

    fn secret_set(&mut self, key: &str, value: &str) -> Result<()>;

    fn secret_delete(&mut self, key: &str) -> Result<()>;

    /// Resolved value across all scopes.
    fn setting_get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` at `scope`; `None` removes the key from that scope.
    fn setting_set(&mut self, key: &str, value: Option<&str>, scope: SettingScope) -> Result<()>;
}
