//! Integration coverage for the file-backed store driven by the reconciler.

use quota_core::{
    load_token_config, save_token_config, FileTokenStore, SettingScope, StorageConfig,
    TokenConfig, TokenHint, TokenReconciler, TokenState, TokenStore, WindowDurations,
};
use tempfile::tempdir;

fn config() -> TokenConfig {
    TokenConfig {
        windows: WindowDurations {
            secure_assume_ms: 0,
            legacy_retain_ms: 0,
            legacy_suppress_ms: 0,
        },
        secret_key: "billing.pat".to_string(),
        legacy_setting_key: "billing.token".to_string(),
    }
}

#[test]
fn test_full_token_lifecycle_on_disk() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    let mut store = FileTokenStore::new(&storage);
    store
        .setting_set("billing.token", Some("ghp_plain"), SettingScope::Workspace)
        .unwrap();

    let mut reconciler = TokenReconciler::new(store, config());
    assert_eq!(reconciler.current_hint(), TokenHint::MigrateToSecure);

    reconciler.migrate(true).unwrap();
    assert_eq!(reconciler.current_state().state, TokenState::Both);

    reconciler.clear_plaintext().unwrap();
    assert_eq!(reconciler.current_state().state, TokenState::SecureOnly);
    assert_eq!(reconciler.current_hint(), TokenHint::FullyMigrated);

    reconciler.clear_token().unwrap();
    assert_eq!(reconciler.current_state().state, TokenState::None);
}

#[test]
fn test_state_survives_process_restart() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());

    let mut first = TokenReconciler::new(FileTokenStore::new(&storage), config());
    first.set_token("ghp_secure").unwrap();

    let second = TokenReconciler::new(FileTokenStore::new(&storage), config());
    assert_eq!(second.current_state().state, TokenState::SecureOnly);
    assert_eq!(second.active_token().as_deref(), Some("ghp_secure"));
}

#[test]
fn test_config_round_trip_drives_keys() {
    let temp = tempdir().unwrap();
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    save_token_config(&storage, &config()).unwrap();

    let loaded = load_token_config(&storage);
    let mut reconciler = TokenReconciler::new(FileTokenStore::new(&storage), loaded);
    reconciler.set_token("ghp_secure").unwrap();

    let raw = FileTokenStore::new(&storage);
    assert_eq!(
        raw.secret_get("billing.pat").unwrap().as_deref(),
        Some("ghp_secure")
    );
}
