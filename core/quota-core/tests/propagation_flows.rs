//! End-to-end credential actions over stores whose writes land late.
//!
//! Each flow performs one action, then samples the reconciler every 10ms
//! until well after every window and every delayed write has settled. The
//! observed state sequence must never show a contradictory intermediate.

use std::sync::Arc;

use chrono::{Duration, Utc};
use quota_core::{
    LaggedTokenStore, ManualClock, MemoryTokenStore, RecordingObserver, SettingScope, TokenConfig,
    TokenReconciler, TokenState, TokenStore, WindowEventKind,
};

const SECRET_LAG_MS: i64 = 1_500;
const SETTING_LAG_MS: i64 = 800;
const OBSERVE_MS: i64 = 10_000;
const STEP_MS: i64 = 10;

type Reconciler = TokenReconciler<LaggedTokenStore<MemoryTokenStore>>;

fn setup() -> (Reconciler, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = LaggedTokenStore::new(
        MemoryTokenStore::new(),
        clock.clone(),
        Duration::milliseconds(SECRET_LAG_MS),
        Duration::milliseconds(SETTING_LAG_MS),
    );
    let reconciler = TokenReconciler::with_clock(store, TokenConfig::default(), clock.clone());
    (reconciler, clock)
}

fn seed(reconciler: &Reconciler, secret: Option<&str>, plaintext: Option<&str>) {
    let config = TokenConfig::default();
    reconciler.store().with_inner(|inner| {
        if let Some(secret) = secret {
            inner.secret_set(&config.secret_key, secret).unwrap();
        }
        inner
            .setting_set(&config.legacy_setting_key, plaintext, SettingScope::Global)
            .unwrap();
    });
}

/// Distinct consecutive states seen while time runs forward.
fn observe(reconciler: &Reconciler, clock: &ManualClock) -> Vec<TokenState> {
    let mut states: Vec<TokenState> = Vec::new();
    let mut elapsed = 0;
    while elapsed <= OBSERVE_MS {
        let state = reconciler.current_state().state;
        if states.last() != Some(&state) {
            states.push(state);
        }
        clock.advance_ms(STEP_MS);
        elapsed += STEP_MS;
    }
    states
}

#[test]
fn test_set_token_from_nothing_is_steady() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, None, None);
    assert_eq!(reconciler.current_state().state, TokenState::None);

    reconciler.set_token("ghp_new").unwrap();

    assert_eq!(observe(&reconciler, &clock), vec![TokenState::SecureOnly]);
    assert_eq!(reconciler.store().pending_writes(), 0);
}

#[test]
fn test_migrate_remove_never_flashes_legacy_or_both() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, None, Some("ghp_plain"));
    assert_eq!(reconciler.current_state().state, TokenState::LegacyOnly);

    reconciler.migrate(false).unwrap();

    // Raw samples alone still read the old world for a while.
    let raw = reconciler.sample();
    assert!(!raw.secret_present);
    assert!(raw.legacy_present_raw);

    assert_eq!(observe(&reconciler, &clock), vec![TokenState::SecureOnly]);
}

#[test]
fn test_migrate_keep_is_both_throughout() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, None, Some("ghp_plain"));

    reconciler.migrate(true).unwrap();

    assert_eq!(observe(&reconciler, &clock), vec![TokenState::Both]);
    assert!(reconciler.current_state().residual_plaintext);
}

#[test]
fn test_clear_plaintext_goes_straight_to_secure_only() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, Some("ghp_secure"), Some("ghp_plain"));
    assert_eq!(reconciler.current_state().state, TokenState::Both);

    reconciler.clear_plaintext().unwrap();

    assert_eq!(observe(&reconciler, &clock), vec![TokenState::SecureOnly]);
}

#[test]
fn test_clear_secure_transitions_once() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, Some("ghp_secure"), Some("ghp_plain"));

    reconciler.clear_token().unwrap();

    // The stale secret read is still honored until the delete lands; after
    // that the state settles and never comes back.
    assert_eq!(
        observe(&reconciler, &clock),
        vec![TokenState::Both, TokenState::LegacyOnly]
    );
}

#[test]
fn test_clear_secure_without_plaintext_reaches_none() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, Some("ghp_secure"), None);

    reconciler.clear_token().unwrap();

    assert_eq!(
        observe(&reconciler, &clock),
        vec![TokenState::SecureOnly, TokenState::None]
    );
}

#[test]
fn test_silently_failed_secret_write_self_heals() {
    let (mut reconciler, clock) = setup();
    seed(&reconciler, None, None);
    reconciler
        .store()
        .with_inner(|inner| inner.set_fail_writes(true));

    reconciler.set_token("ghp_lost").unwrap();

    // The assumption holds for the secure window, then the real (empty)
    // store wins.
    assert_eq!(
        observe(&reconciler, &clock),
        vec![TokenState::SecureOnly, TokenState::None]
    );
}

#[test]
fn test_observer_audits_full_lifecycle() {
    let (reconciler, clock) = setup();
    let observer = Arc::new(RecordingObserver::new());
    let mut reconciler = reconciler.with_observer(observer.clone());
    seed(&reconciler, None, Some("ghp_plain"));

    reconciler.migrate(true).unwrap();
    clock.advance_ms(OBSERVE_MS);
    reconciler.clear_plaintext().unwrap();
    clock.advance_ms(OBSERVE_MS);
    reconciler.clear_token().unwrap();
    clock.advance_ms(OBSERVE_MS);

    assert_eq!(
        observer.kinds(),
        vec![
            WindowEventKind::MigrationKeep,
            WindowEventKind::PlaintextCleared,
            WindowEventKind::SecureCleared,
        ]
    );
    let events = observer.events();
    assert!(events.windows(2).all(|pair| pair[0].at <= pair[1].at));
    assert_eq!(reconciler.current_state().state, TokenState::None);
}
