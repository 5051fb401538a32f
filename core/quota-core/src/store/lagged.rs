//! Eventually-consistent wrapper around another store.
//!
//! Writes are accepted immediately but only reach the inner store once the
//! injected clock passes `issued_at + lag`. Reads see the inner store as it
//! stands after applying every write that has come due. A write the inner
//! store rejects at that point is dropped with a warning, which is how a
//! host store fails silently after reporting success.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;
use crate::error::Result;

use super::{SettingScope, TokenStore};

#[derive(Debug, Clone)]
enum PendingOp {
    SecretSet { key: String, value: String },
    SecretDelete { key: String },
    Setting {
        key: String,
        value: Option<String>,
        scope: SettingScope,
    },
}

impl PendingOp {
    fn label(&self) -> &'static str {
        match self {
            PendingOp::SecretSet { .. } => "secret_set",
            PendingOp::SecretDelete { .. } => "secret_delete",
            PendingOp::Setting { .. } => "setting_set",
        }
    }

    fn key(&self) -> &str {
        match self {
            PendingOp::SecretSet { key, .. }
            | PendingOp::SecretDelete { key }
            | PendingOp::Setting { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingWrite {
    visible_at: DateTime<Utc>,
    op: PendingOp,
}

struct LaggedState<S> {
    inner: S,
    pending: Vec<PendingWrite>,
}

impl<S: TokenStore> LaggedState<S> {
    fn apply_due(&mut self, now: DateTime<Utc>) {
        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|write| write.visible_at <= now);
        self.pending = waiting;

        for write in due {
            self.apply(write.op);
        }
    }

    fn apply_all(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for write in pending {
            self.apply(write.op);
        }
    }

    fn apply(&mut self, op: PendingOp) {
        let result = match &op {
            PendingOp::SecretSet { key, value } => self.inner.secret_set(key, value),
            PendingOp::SecretDelete { key } => self.inner.secret_delete(key),
            PendingOp::Setting { key, value, scope } => {
                self.inner.setting_set(key, value.as_deref(), *scope)
            }
        };
        if let Err(err) = result {
            tracing::warn!(
                error = %err,
                op = op.label(),
                key = op.key(),
                "Delayed store write failed"
            );
        }
    }
}

pub struct LaggedTokenStore<S> {
    state: Mutex<LaggedState<S>>,
    clock: Arc<dyn Clock>,
    secret_lag: Duration,
    setting_lag: Duration,
}

impl<S: TokenStore> LaggedTokenStore<S> {
    pub fn new(inner: S, clock: Arc<dyn Clock>, secret_lag: Duration, setting_lag: Duration) -> Self {
        Self {
            state: Mutex::new(LaggedState {
                inner,
                pending: Vec::new(),
            }),
            clock,
            secret_lag,
            setting_lag,
        }
    }

    pub fn pending_writes(&self) -> usize {
        self.lock().pending.len()
    }

    /// Applies every pending write regardless of the clock.
    pub fn settle(&self) {
        self.lock().apply_all();
    }

    /// Runs `f` against the inner store after applying due writes.
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let now = self.clock.now();
        let mut state = self.lock();
        state.apply_due(now);
        f(&mut state.inner)
    }

    pub fn into_inner(self) -> S {
        let mut state = self.state.into_inner().unwrap_or_else(|e| e.into_inner());
        state.apply_all();
        state.inner
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LaggedState<S>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<R>(&self, f: impl FnOnce(&S) -> Result<R>) -> Result<R> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.apply_due(now);
        f(&state.inner)
    }

    fn enqueue(&self, lag: Duration, op: PendingOp) {
        let visible_at = self.clock.now() + lag;
        let mut state = self.lock();
        state.pending.push(PendingWrite { visible_at, op });
    }
}

impl<S: TokenStore> TokenStore for LaggedTokenStore<S> {
    fn secret_get(&self, key: &str) -> Result<Option<String>> {
        self.read(|inner| inner.secret_get(key))
    }

    fn secret_set(&mut self, key: &str, value: &str) -> Result<()> {
        self.enqueue(
            self.secret_lag,
            PendingOp::SecretSet {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
        Ok(())
    }

    fn secret_delete(&mut self, key: &str) -> Result<()> {
        self.enqueue(
            self.secret_lag,
            PendingOp::SecretDelete {
                key: key.to_string(),
            },
        );
        Ok(())
    }

    fn setting_get(&self, key: &str) -> Result<Option<String>> {
        self.read(|inner| inner.setting_get(key))
    }

    fn setting_set(&mut self, key: &str, value: Option<&str>, scope: SettingScope) -> Result<()> {
        self.enqueue(
            self.setting_lag,
            PendingOp::Setting {
                key: key.to_string(),
                value: value.map(str::to_string),
                scope,
            },
        );
        Ok(())
    }
}
