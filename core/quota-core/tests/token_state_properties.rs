//! Integration coverage for derivation properties and recorder windows.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use quota_core::{
    DerivedTokenState, ManualClock, TokenInputs, TokenState, TokenStateMachine, WindowDurations,
};

fn machine_at(start: DateTime<Utc>) -> TokenStateMachine {
    TokenStateMachine::with_clock(
        WindowDurations::default(),
        Arc::new(ManualClock::new(start)),
    )
}

fn derive_at(
    machine: &TokenStateMachine,
    secret: bool,
    legacy: bool,
    at: DateTime<Utc>,
) -> DerivedTokenState {
    machine.derive(TokenInputs::new(secret, legacy).at(at))
}

#[test]
fn test_raw_combination_when_windows_long_expired() {
    let start = Utc::now();
    let mut machine = machine_at(start);
    machine.record_secure_set();
    machine.record_migration_keep();
    let later = start + Duration::hours(1);

    assert_eq!(derive_at(&machine, false, false, later).state, TokenState::None);
    assert_eq!(
        derive_at(&machine, false, true, later).state,
        TokenState::LegacyOnly
    );
    assert_eq!(
        derive_at(&machine, true, false, later).state,
        TokenState::SecureOnly
    );
    assert_eq!(derive_at(&machine, true, true, later).state, TokenState::Both);
}

#[test]
fn test_projections_hold_for_every_reachable_state() {
    let start = Utc::now();
    let machine = machine_at(start);
    let mut seen = Vec::new();

    for secret in [false, true] {
        for legacy in [false, true] {
            let derived = derive_at(&machine, secret, legacy, start);
            assert_eq!(derived.residual_plaintext, derived.state == TokenState::Both);
            assert_eq!(
                derived.secure_pat_only,
                derived.state == TokenState::SecureOnly
            );
            assert_eq!(derived.state, TokenState::from_presence(derived.has_secure, derived.has_legacy));
            seen.push(derived.state);
        }
    }

    for state in TokenState::ALL {
        assert!(seen.contains(&state), "{:?} not reached", state);
    }
}

#[test]
fn test_secure_set_hides_stale_plaintext() {
    let start = Utc::now();
    let mut machine = machine_at(start);
    machine.record_secure_set();

    let derived = derive_at(&machine, false, true, start + Duration::milliseconds(1));
    assert_eq!(derived.state, TokenState::SecureOnly);
    assert!(!derived.has_legacy);
}

#[test]
fn test_migration_keep_shows_both_before_setting_read_catches_up() {
    let start = Utc::now();
    let mut machine = machine_at(start);
    machine.record_migration_keep();

    let derived = derive_at(&machine, true, false, start + Duration::milliseconds(1));
    assert_eq!(derived.state, TokenState::Both);
}

#[test]
fn test_retention_lapses_after_window() {
    let start = Utc::now();
    let mut machine = machine_at(start);
    machine.record_migration_keep();
    let retain = machine.durations().legacy_retain();

    let derived = derive_at(
        &machine,
        true,
        false,
        start + retain + Duration::milliseconds(1),
    );
    assert_eq!(derived.state, TokenState::SecureOnly);
}

#[test]
fn test_cleared_secure_leaves_no_residual_assumption() {
    let start = Utc::now();
    let mut machine = machine_at(start);
    machine.record_secure_set();
    machine.record_secure_cleared();

    let derived = derive_at(&machine, false, false, start + Duration::milliseconds(1));
    assert!(!derived.has_secure);
}

#[test]
fn test_reset_twice_matches_reset_once() {
    let start = Utc::now();
    let mut once = machine_at(start);
    once.record_secure_set();
    once.reset_all_windows();

    let mut twice = machine_at(start);
    twice.record_migration_keep();
    twice.reset_all_windows();
    twice.reset_all_windows();

    assert_eq!(once.windows(), twice.windows());
    assert_eq!(once.debug_snapshot(), twice.debug_snapshot());
}

#[test]
fn test_debug_snapshot_always_has_three_fields() {
    let start = Utc::now();
    let mut machine = machine_at(start);

    let mut snapshots = vec![machine.debug_snapshot()];
    machine.record_secure_set();
    snapshots.push(machine.debug_snapshot());
    machine.record_migration_keep();
    snapshots.push(machine.debug_snapshot());
    machine.reset_all_windows();
    snapshots.push(machine.debug_snapshot());

    for snapshot in snapshots {
        for field in ["secureAssume=", "legacyRetain=", "legacySuppress="] {
            assert!(snapshot.contains(field), "{} missing from {}", field, snapshot);
        }
    }
}

#[test]
fn test_separate_machines_do_not_share_windows() {
    let start = Utc::now();
    let mut first = machine_at(start);
    let second = machine_at(start);

    first.record_secure_set();
    let at = start + Duration::milliseconds(1);

    assert_eq!(derive_at(&first, false, false, at).state, TokenState::SecureOnly);
    assert_eq!(derive_at(&second, false, false, at).state, TokenState::None);
}
