//! Error types for quota-core operations.
//! Keep TokenFfiError minimal and stable to avoid breaking FFI clients.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin/Python)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum TokenFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for TokenFfiError {
    fn from(message: String) -> Self {
        TokenFfiError::General { message }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur while reading or mutating credential storage.
///
/// The state machine itself never fails; these come from the stores and
/// the actions layered on top of them.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    // ─────────────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Secret store {operation} failed for {key}: {details}")]
    SecretStore {
        operation: &'static str,
        key: String,
        details: String,
    },

    #[error("Setting store {operation} failed for {key}: {details}")]
    SettingStore {
        operation: &'static str,
        key: String,
        details: String,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Action Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No plaintext token found in setting {0}")]
    NoLegacyToken(String),

    #[error("Token value is empty")]
    EmptyToken,

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Malformed config at {}: {details}", path.display())]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using TokenError.
pub type Result<T> = std::result::Result<T, TokenError>;
