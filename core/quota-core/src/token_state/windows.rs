//! Grace windows and the pure derivation over them.
//!
//! A window is an expiry instant; it is active while `now < until` and
//! lapses on its own once time passes it. The two legacy windows express
//! opposite intents, so they share one slot. A retain requested while a
//! suppress window is open rides along inside it and takes over once the
//! suppression lapses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::DerivedTokenState;

/// Override applied to the raw plaintext-setting sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyOverride {
    #[default]
    None,
    /// Treat the plaintext copy as present until `until`.
    Retain { until: DateTime<Utc> },
    /// Treat the plaintext copy as absent until `until`, then as present
    /// until `retain_until` if a retain was requested meanwhile.
    Suppress {
        until: DateTime<Utc>,
        retain_until: Option<DateTime<Utc>>,
    },
}

impl LegacyOverride {
    /// `Some(forced)` while the override is active, `None` once it lapsed.
    pub fn forced_presence(&self, now: DateTime<Utc>) -> Option<bool> {
        match *self {
            LegacyOverride::Suppress { until, .. } if now < until => Some(false),
            LegacyOverride::Suppress {
                retain_until: Some(until),
                ..
            }
            | LegacyOverride::Retain { until } if now < until => Some(true),
            _ => None,
        }
    }

    /// Suppression with no retain behind it.
    pub fn suppress(until: DateTime<Utc>) -> Self {
        LegacyOverride::Suppress {
            until,
            retain_until: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraceWindows {
    pub secure_assume_until: Option<DateTime<Utc>>,
    pub legacy: LegacyOverride,
}

impl GraceWindows {
    pub fn secure_assumed(&self, now: DateTime<Utc>) -> bool {
        self.secure_assume_until.is_some_and(|until| now < until)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> WindowSnapshot {
        let (retain_until, suppress_until) = match self.legacy {
            LegacyOverride::None => (None, None),
            LegacyOverride::Retain { until } => (Some(until), None),
            LegacyOverride::Suppress {
                until,
                retain_until,
            } => (retain_until, Some(until)),
        };

        WindowSnapshot {
            secure_assume_ms: remaining_ms(self.secure_assume_until, now),
            legacy_retain_ms: remaining_ms(retain_until, now),
            legacy_suppress_ms: remaining_ms(suppress_until, now),
        }
    }
}

fn remaining_ms(until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    until
        .map(|until| until.signed_duration_since(now).num_milliseconds())
        .and_then(|ms| u64::try_from(ms).ok())
        .unwrap_or(0)
}

/// Remaining lifetime of each window at one instant. Lapsed windows read 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, uniffi::Record)]
pub struct WindowSnapshot {
    pub secure_assume_ms: u64,
    pub legacy_retain_ms: u64,
    pub legacy_suppress_ms: u64,
}

impl WindowSnapshot {
    pub fn is_idle(&self) -> bool {
        *self == WindowSnapshot::default()
    }
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenWindows secureAssume={}ms legacyRetain={}ms legacySuppress={}ms",
            self.secure_assume_ms, self.legacy_retain_ms, self.legacy_suppress_ms
        )
    }
}

/// Classifies the effective credential state from raw samples and windows.
///
/// Effective legacy is `(raw || retained) && !suppressed`; effective secure
/// is `raw || assumed`. Total over all inputs.
pub fn derive_token_state(
    windows: &GraceWindows,
    secret_present: bool,
    legacy_present_raw: bool,
    now: DateTime<Utc>,
) -> DerivedTokenState {
    let has_secure = secret_present || windows.secure_assumed(now);
    let has_legacy = windows
        .legacy
        .forced_presence(now)
        .unwrap_or(legacy_present_raw);

    DerivedTokenState::from_presence(has_secure, has_legacy)
}
