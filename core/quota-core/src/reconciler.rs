//! TokenReconciler - credential actions and state queries for one session.
//!
//! Pairs a [`TokenStore`] with a [`TokenStateMachine`]. Every mutating action
//! calls its recorder *before* issuing the store writes, so a query that
//! lands while those writes are still propagating already reflects the
//! user's intent. Reads are fail-safe: an unreadable store counts as
//! "credential absent" and never turns into an error.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use quota_core::{MemoryTokenStore, TokenConfig, TokenReconciler};
//!
//! let mut reconciler = TokenReconciler::new(MemoryTokenStore::new(), TokenConfig::default());
//! reconciler.set_token("ghp_example")?;
//! let hint = reconciler.current_hint();
//! ```

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::TokenConfig;
use crate::error::{Result, TokenError};
use crate::store::{SettingScope, TokenStore};
use crate::token_state::{
    token_value_present, DerivedTokenState, TokenHint, TokenInputs, TokenObserver,
    TokenStateMachine,
};

/// Raw presence read from both stores at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenSample {
    pub secret_present: bool,
    pub legacy_present_raw: bool,
}

impl From<TokenSample> for TokenInputs {
    fn from(sample: TokenSample) -> Self {
        TokenInputs::new(sample.secret_present, sample.legacy_present_raw)
    }
}

pub struct TokenReconciler<S> {
    store: S,
    machine: TokenStateMachine,
    secret_key: String,
    legacy_setting_key: String,
}

impl<S: TokenStore> TokenReconciler<S> {
    pub fn new(store: S, config: TokenConfig) -> Self {
        Self::with_machine(store, TokenStateMachine::new(config.windows), &config)
    }

    pub fn with_clock(store: S, config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_machine(
            store,
            TokenStateMachine::with_clock(config.windows, clock),
            &config,
        )
    }

    pub fn with_machine(store: S, machine: TokenStateMachine, config: &TokenConfig) -> Self {
        Self {
            store,
            machine,
            secret_key: config.secret_key.clone(),
            legacy_setting_key: config.legacy_setting_key.clone(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TokenObserver>) -> Self {
        self.machine = self.machine.with_observer(observer);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn machine(&self) -> &TokenStateMachine {
        &self.machine
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn sample(&self) -> TokenSample {
        let secret_present = match self.store.secret_get(&self.secret_key) {
            Ok(value) => token_value_present(value.as_deref()),
            Err(err) => {
                tracing::warn!(error = %err, "Secret read failed, treating token as absent");
                false
            }
        };

        let legacy_present_raw = match self.store.setting_get(&self.legacy_setting_key) {
            Ok(value) => token_value_present(value.as_deref()),
            Err(err) => {
                tracing::warn!(error = %err, "Setting read failed, treating plaintext as absent");
                false
            }
        };

        TokenSample {
            secret_present,
            legacy_present_raw,
        }
    }

    pub fn current_state(&self) -> DerivedTokenState {
        self.machine.derive(self.sample().into())
    }

    pub fn current_hint(&self) -> TokenHint {
        TokenHint::for_state(self.current_state().state)
    }

    /// Token the billing poller should authenticate with: the secure value
    /// first, then the plaintext fallback.
    pub fn active_token(&self) -> Option<String> {
        let secure = self
            .store
            .secret_get(&self.secret_key)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Secret read failed while resolving token");
                None
            })
            .filter(|v| token_value_present(Some(v.as_str())));
        if secure.is_some() {
            return secure;
        }

        self.read_legacy_value()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────────

    /// Stores `token` securely and removes any plaintext copy.
    pub fn set_token(&mut self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::EmptyToken);
        }

        self.machine.record_secure_set();
        self.store.secret_set(&self.secret_key, token)?;
        self.clear_legacy_setting()?;
        tracing::info!("Token stored in secure storage");
        Ok(())
    }

    pub fn clear_token(&mut self) -> Result<()> {
        self.machine.record_secure_cleared();
        self.store.secret_delete(&self.secret_key)?;
        tracing::info!("Secure token cleared");
        Ok(())
    }

    /// Copies the plaintext token into secure storage, optionally leaving the
    /// plaintext setting in place.
    pub fn migrate(&mut self, keep_plaintext: bool) -> Result<()> {
        let token = self
            .read_legacy_value()
            .ok_or_else(|| TokenError::NoLegacyToken(self.legacy_setting_key.clone()))?;

        if keep_plaintext {
            self.machine.record_migration_keep();
            self.store.secret_set(&self.secret_key, &token)?;
        } else {
            self.machine.record_secure_set();
            self.store.secret_set(&self.secret_key, &token)?;
            self.clear_legacy_setting()?;
        }

        tracing::info!(keep_plaintext, "Token migrated to secure storage");
        Ok(())
    }

    /// Removes the plaintext copy and keeps the secure token.
    pub fn clear_plaintext(&mut self) -> Result<()> {
        self.machine.record_plaintext_cleared();
        self.clear_legacy_setting()?;
        tracing::info!("Plaintext token cleared");
        Ok(())
    }

    pub fn reset_windows(&mut self) {
        self.machine.reset_all_windows();
    }

    fn read_legacy_value(&self) -> Option<String> {
        self.store
            .setting_get(&self.legacy_setting_key)
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Setting read failed while resolving token");
                None
            })
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn clear_legacy_setting(&mut self) -> Result<()> {
        for scope in SettingScope::PRECEDENCE {
            self.store
                .setting_set(&self.legacy_setting_key, None, scope)?;
        }
        Ok(())
    }
}
