//! The token state machine: grace windows plus the recorders that open them.
//!
//! Recorders run synchronously at the moment a credential write is *issued*,
//! before the store has necessarily made it visible. A derivation arriving
//! while the write is still in flight then follows the user's intent instead
//! of the stale read.
//!
//! ```text
//! None       --(secure set)------------------> SecureOnly
//! SecureOnly --(migrate-keep / re-added)-----> Both
//! Both       --(clear plaintext)-------------> SecureOnly
//! SecureOnly --(secure cleared)--------------> None | LegacyOnly
//! LegacyOnly --(migrate, remove setting)-----> SecureOnly
//! LegacyOnly --(migrate, keep setting)-------> Both
//! Both       --(secure cleared)--------------> LegacyOnly
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::clock::{Clock, SystemClock};
use crate::config::WindowDurations;

use super::observer::{TokenObserver, TracingObserver, WindowEvent, WindowEventKind};
use super::types::{DerivedTokenState, TokenInputs};
use super::windows::{derive_token_state, GraceWindows, LegacyOverride, WindowSnapshot};

pub struct TokenStateMachine {
    windows: GraceWindows,
    durations: WindowDurations,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn TokenObserver>,
}

impl Default for TokenStateMachine {
    fn default() -> Self {
        Self::new(WindowDurations::default())
    }
}

impl TokenStateMachine {
    pub fn new(durations: WindowDurations) -> Self {
        Self::with_clock(durations, Arc::new(SystemClock))
    }

    pub fn with_clock(durations: WindowDurations, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: GraceWindows::default(),
            durations,
            clock,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn TokenObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn durations(&self) -> WindowDurations {
        self.durations
    }

    pub fn windows(&self) -> GraceWindows {
        self.windows
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Derivation
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn derive(&self, inputs: TokenInputs) -> DerivedTokenState {
        let now = inputs.now.unwrap_or_else(|| self.clock.now());
        derive_token_state(
            &self.windows,
            inputs.secret_present,
            inputs.legacy_present_raw,
            now,
        )
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Recorders
    // ─────────────────────────────────────────────────────────────────────────────

    /// A secure write was issued together with a plaintext clear.
    ///
    /// Assumes the secret present and hides the plaintext copy; any retain
    /// window is replaced.
    pub fn record_secure_set(&mut self) {
        let now = self.clock.now();
        self.windows.secure_assume_until = Some(window_end(now, self.durations.secure_assume()));
        self.windows.legacy =
            LegacyOverride::suppress(window_end(now, self.durations.legacy_suppress()));
        self.emit(WindowEventKind::SecureSet, now);
    }

    /// Migration into secure storage that keeps the plaintext copy.
    ///
    /// An unexpired suppress window is left in place and keeps precedence
    /// while it lasts; the retain window is queued behind it and still runs
    /// to its own expiry.
    pub fn record_migration_keep(&mut self) {
        let now = self.clock.now();
        self.windows.secure_assume_until = Some(window_end(now, self.durations.secure_assume()));
        let retain_until = window_end(now, self.durations.legacy_retain());
        self.windows.legacy = match self.windows.legacy {
            LegacyOverride::Suppress { until, .. } if now < until => {
                tracing::debug!(
                    suppress_ms = self.windows.snapshot(now).legacy_suppress_ms,
                    "Retain window queued behind active suppress window"
                );
                LegacyOverride::Suppress {
                    until,
                    retain_until: Some(retain_until),
                }
            }
            _ => LegacyOverride::Retain {
                until: retain_until,
            },
        };
        self.emit(WindowEventKind::MigrationKeep, now);
    }

    /// The secure credential was removed. Only the secure window closes.
    pub fn record_secure_cleared(&mut self) {
        let now = self.clock.now();
        self.windows.secure_assume_until = None;
        self.emit(WindowEventKind::SecureCleared, now);
    }

    /// Only the plaintext copy was removed; the secure token stays.
    pub fn record_plaintext_cleared(&mut self) {
        let now = self.clock.now();
        self.windows.legacy =
            LegacyOverride::suppress(window_end(now, self.durations.legacy_suppress()));
        self.emit(WindowEventKind::PlaintextCleared, now);
    }

    pub fn reset_all_windows(&mut self) {
        let now = self.clock.now();
        self.windows = GraceWindows::default();
        self.emit(WindowEventKind::Reset, now);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> WindowSnapshot {
        self.windows.snapshot(now)
    }

    /// Remaining time on each window, for logs and bug reports.
    pub fn debug_snapshot(&self) -> String {
        self.snapshot_at(self.clock.now()).to_string()
    }

    fn emit(&self, kind: WindowEventKind, at: DateTime<Utc>) {
        let windows = self.windows.snapshot(at);
        self.observer.on_window_event(&WindowEvent { kind, at, windows });
    }
}

/// `now + length`, saturating at the latest representable instant.
fn window_end(now: DateTime<Utc>, length: Duration) -> DateTime<Utc> {
    now.checked_add_signed(length).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
