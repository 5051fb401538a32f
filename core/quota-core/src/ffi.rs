//! FFI surface for hosts that sample the stores themselves.
//!
//! The host keeps one handle per session, calls a recorder the moment it
//! issues a credential write, and calls `derive` with its own store samples.
//! Timestamps cross the boundary as epoch milliseconds.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::config::WindowDurations;
use crate::error::TokenFfiError;
use crate::token_state::{
    DerivedTokenState, TokenHint, TokenInputs, TokenState, TokenStateMachine, WindowSnapshot,
};

#[derive(uniffi::Object)]
pub struct TokenStateHandle {
    machine: Mutex<TokenStateMachine>,
}

impl TokenStateHandle {
    pub fn from_machine(machine: TokenStateMachine) -> Self {
        Self {
            machine: Mutex::new(machine),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TokenStateMachine> {
        self.machine.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[uniffi::export]
impl TokenStateHandle {
    /// Creates a handle with the given window durations (milliseconds).
    #[uniffi::constructor]
    pub fn new(secure_assume_ms: u64, legacy_retain_ms: u64, legacy_suppress_ms: u64) -> Self {
        let durations = WindowDurations {
            secure_assume_ms,
            legacy_retain_ms,
            legacy_suppress_ms,
        };
        Self::from_machine(TokenStateMachine::new(durations))
    }

    /// Classifies the host's samples. `now_ms` overrides the wall clock.
    pub fn derive(
        &self,
        secret_present: bool,
        legacy_present_raw: bool,
        now_ms: Option<i64>,
    ) -> Result<DerivedTokenState, TokenFfiError> {
        let mut inputs = TokenInputs::new(secret_present, legacy_present_raw);
        if let Some(ms) = now_ms {
            inputs = inputs.at(from_epoch_ms(ms)?);
        }
        Ok(self.lock().derive(inputs))
    }

    pub fn record_secure_set(&self) {
        self.lock().record_secure_set();
    }

    pub fn record_migration_keep(&self) {
        self.lock().record_migration_keep();
    }

    pub fn record_secure_cleared(&self) {
        self.lock().record_secure_cleared();
    }

    pub fn record_plaintext_cleared(&self) {
        self.lock().record_plaintext_cleared();
    }

    pub fn reset_all_windows(&self) {
        self.lock().reset_all_windows();
    }

    pub fn windows(&self) -> WindowSnapshot {
        let machine = self.lock();
        machine.snapshot_at(machine.now())
    }

    pub fn debug_snapshot(&self) -> String {
        self.lock().debug_snapshot()
    }
}

/// Hint for a state, exported for hosts that render it themselves.
#[uniffi::export]
pub fn hint_for_state(state: TokenState) -> TokenHint {
    TokenHint::for_state(state)
}

fn from_epoch_ms(ms: i64) -> Result<DateTime<Utc>, TokenFfiError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| TokenFfiError::from(format!("Timestamp out of range: {}", ms)))
}
