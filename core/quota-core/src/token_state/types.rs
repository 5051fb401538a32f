//! Value types produced by the token state derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Effective credential state. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenState {
    None,
    LegacyOnly,
    SecureOnly,
    Both,
}

impl TokenState {
    pub const ALL: [TokenState; 4] = [
        TokenState::None,
        TokenState::LegacyOnly,
        TokenState::SecureOnly,
        TokenState::Both,
    ];

    pub fn from_presence(has_secure: bool, has_legacy: bool) -> Self {
        match (has_secure, has_legacy) {
            (true, true) => TokenState::Both,
            (true, false) => TokenState::SecureOnly,
            (false, true) => TokenState::LegacyOnly,
            (false, false) => TokenState::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TokenState::None => "NONE",
            TokenState::LegacyOnly => "LEGACY_ONLY",
            TokenState::SecureOnly => "SECURE_ONLY",
            TokenState::Both => "BOTH",
        }
    }
}

/// Result of one derivation. Recomputed on every query, never stored.
///
/// Build through [`DerivedTokenState::from_presence`] so the projections
/// cannot drift from `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct DerivedTokenState {
    pub state: TokenState,
    pub has_secure: bool,
    pub has_legacy: bool,
    /// A secure token exists but the plaintext copy is still around.
    pub residual_plaintext: bool,
    /// Fully migrated: secure token only.
    pub secure_pat_only: bool,
}

impl DerivedTokenState {
    pub fn from_presence(has_secure: bool, has_legacy: bool) -> Self {
        let state = TokenState::from_presence(has_secure, has_legacy);
        Self {
            state,
            has_secure,
            has_legacy,
            residual_plaintext: state == TokenState::Both,
            secure_pat_only: state == TokenState::SecureOnly,
        }
    }
}

/// Raw store samples handed to the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenInputs {
    pub secret_present: bool,
    pub legacy_present_raw: bool,
    /// Overrides the machine's clock. Tests pass explicit instants.
    pub now: Option<DateTime<Utc>>,
}

impl TokenInputs {
    pub fn new(secret_present: bool, legacy_present_raw: bool) -> Self {
        Self {
            secret_present,
            legacy_present_raw,
            now: None,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Presence test for a stored token value: set and not just whitespace.
/// Applies to both the secret and the plaintext setting.
pub fn token_value_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_presence_table() {
        assert_eq!(TokenState::from_presence(false, false), TokenState::None);
        assert_eq!(TokenState::from_presence(false, true), TokenState::LegacyOnly);
        assert_eq!(TokenState::from_presence(true, false), TokenState::SecureOnly);
        assert_eq!(TokenState::from_presence(true, true), TokenState::Both);
    }

    #[test]
    fn test_projections_follow_state() {
        for has_secure in [false, true] {
            for has_legacy in [false, true] {
                let derived = DerivedTokenState::from_presence(has_secure, has_legacy);
                assert_eq!(derived.residual_plaintext, derived.state == TokenState::Both);
                assert_eq!(
                    derived.secure_pat_only,
                    derived.state == TokenState::SecureOnly
                );
            }
        }
    }

    #[test]
    fn test_token_value_present_trims() {
        assert!(!token_value_present(None));
        assert!(!token_value_present(Some("")));
        assert!(!token_value_present(Some("   \n\t")));
        assert!(token_value_present(Some(" ghp_abc ")));
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        let json = serde_json::to_string(&TokenState::SecureOnly).unwrap();
        assert_eq!(json, "\"SECURE_ONLY\"");
    }
}
