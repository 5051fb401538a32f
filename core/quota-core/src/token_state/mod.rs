//! Token Reconciliation
//!
//! Decides which credential is *effectively* present from two stores that
//! update independently and asynchronously:
//!
//! 1. **Secure store** (primary): OS-backed secret storage. Writes land some
//!    time after they are issued.
//! 2. **Legacy setting**: a plaintext configuration value that historically
//!    held the same token. Writes propagate through layered settings scopes.
//!
//! Sampling both stores right after a write can observe either side stale,
//! which would flash `Both` or `None` in the UI. The machine bridges that gap
//! with short **grace windows** opened at the moment a write is issued.
//!
//! # Module Structure
//!
//! - [`types`]: `TokenState` and the derived result
//! - [`windows`]: window bookkeeping and the pure derivation
//! - [`machine`]: `TokenStateMachine`, which owns windows plus a clock
//! - [`observer`]: audit hooks for recorder calls
//! - [`hint`]: the user-facing hint per state

mod hint;
mod machine;
mod observer;
mod types;
mod windows;

pub use hint::TokenHint;
pub use machine::TokenStateMachine;
pub use observer::{
    RecordingObserver, TokenObserver, TracingObserver, WindowEvent, WindowEventKind,
};
pub use types::{token_value_present, DerivedTokenState, TokenInputs, TokenState};
pub use windows::{derive_token_state, GraceWindows, LegacyOverride, WindowSnapshot};
