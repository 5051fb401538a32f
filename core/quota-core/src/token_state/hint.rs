//! Maps a derived state to the single user-facing hint shown for it.

use serde::Serialize;

use super::types::TokenState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, uniffi::Enum)]
#[serde(rename_all = "kebab-case")]
pub enum TokenHint {
    /// No credential anywhere.
    SetToken,
    /// Only the plaintext setting holds the token.
    MigrateToSecure,
    /// Secure token present, plaintext copy still lingering.
    ClearPlaintext,
    FullyMigrated,
}

impl TokenHint {
    pub fn for_state(state: TokenState) -> Self {
        match state {
            TokenState::None => TokenHint::SetToken,
            TokenState::LegacyOnly => TokenHint::MigrateToSecure,
            TokenState::Both => TokenHint::ClearPlaintext,
            TokenState::SecureOnly => TokenHint::FullyMigrated,
        }
    }

    /// Stable identifier for the UI layer.
    pub fn id(self) -> &'static str {
        match self {
            TokenHint::SetToken => "set-token",
            TokenHint::MigrateToSecure => "migrate",
            TokenHint::ClearPlaintext => "clear-plaintext",
            TokenHint::FullyMigrated => "fully-migrated",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            TokenHint::SetToken => "No token configured. Set one to enable billing status.",
            TokenHint::MigrateToSecure => {
                "Token is stored in plaintext settings. Migrate it to secure storage."
            }
            TokenHint::ClearPlaintext => {
                "Token is in secure storage but a plaintext copy remains. Clear it."
            }
            TokenHint::FullyMigrated => "Token is stored securely.",
        }
    }
}
