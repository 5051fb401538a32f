//! # quota-core
//!
//! Core library for Quota HUD, the billing-status indicator. Owns the logic
//! that decides which API token is effectively configured while the secure
//! credential store and the legacy plaintext setting catch up with each
//! other.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Store writes that land
//!   later are modelled by the store, not by futures.
//! - **One machine per session**: Grace windows live on a
//!   [`TokenStateMachine`] instance, never in globals.
//! - **Graceful degradation**: Unreadable stores and config files read as
//!   empty/default values, not errors.
//! - **FFI-ready**: UniFFI annotations on the value types and
//!   [`TokenStateHandle`]. Prefer additive public API changes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quota_core::{MemoryTokenStore, TokenConfig, TokenReconciler};
//!
//! let mut reconciler = TokenReconciler::new(MemoryTokenStore::new(), TokenConfig::default());
//! reconciler.set_token("ghp_example")?;
//! assert!(reconciler.current_state().secure_pat_only);
//! ```

uniffi::setup_scaffolding!();

pub mod clock;
pub mod config;
pub mod error;
pub mod ffi;
pub mod reconciler;
pub mod storage;
pub mod store;
pub mod token_state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    load_token_config, read_token_config, save_token_config, TokenConfig, WindowDurations,
};
pub use error::{Result, TokenError, TokenFfiError};
pub use ffi::TokenStateHandle;
pub use reconciler::{TokenReconciler, TokenSample};
pub use storage::StorageConfig;
pub use store::{FileTokenStore, LaggedTokenStore, MemoryTokenStore, SettingScope, TokenStore};
pub use token_state::*;
