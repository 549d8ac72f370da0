use super::test_helpers::*;
use super::*;
use crate::activity::MAX_LOG_ENTRIES;
use crate::storage::MemoryStorage;
use crate::store::{CUSTOMERS_KEY, ORDERS_KEY, PRODUCTS_KEY};

fn export_text(state: &AppState<MemoryStorage>) -> String {
    state.backup().to_json_pretty().unwrap()
}

// =============================================================================
// open / persistence observer
// =============================================================================

#[test]
fn open_on_empty_storage_is_empty() {
    let state = test_app_state();
    assert!(state.collections().is_empty());
    assert!(state.logs().is_empty());
}

#[test]
fn setters_persist_their_collection() {
    let state = seeded_app_state();
    let storage = state.storage();
    for key in [PRODUCTS_KEY, CUSTOMERS_KEY, ORDERS_KEY] {
        let raw = storage.get_item(key).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(1), "{key}");
    }
}

#[test]
fn reopen_sees_persisted_state() {
    let state = seeded_app_state();
    let expected = state.collections().clone();
    let storage: MemoryStorage = state.storage().clone();
    let reopened = AppState::open(storage);
    assert_eq!(reopened.collections(), &expected);
}

#[test]
fn update_closure_persists_and_returns_value() {
    let mut state = seeded_app_state();
    let removed = state.update_products(|products| products.pop());
    assert_eq!(removed.map(|p| p.id), Some("p1".to_owned()));
    assert_eq!(state.storage().get_item(PRODUCTS_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn open_ignores_unparsable_blobs() {
    let mut storage = MemoryStorage::new();
    storage.set_item(PRODUCTS_KEY, "<<garbage>>").unwrap();
    let state = AppState::open(storage);
    assert!(state.products().is_empty());
}

#[test]
fn failed_write_keeps_change_and_logs_error() {
    let mut state = AppState::open(ReadOnlyStorage);
    state.set_customers(vec![dummy_customer("c1")]);
    assert_eq!(state.customers().len(), 1);
    let latest = state.logs().latest().unwrap();
    assert_eq!(latest.kind, LogKind::Error);
    assert!(latest.message.contains("customers"));
}

// =============================================================================
// action log
// =============================================================================

#[test]
fn log_is_capped() {
    let mut state = test_app_state();
    for i in 0..200 {
        state.log(format!("notice {i}"), LogKind::Info);
    }
    assert_eq!(state.logs().len(), MAX_LOG_ENTRIES);
    assert_eq!(state.logs().latest().unwrap().message, "notice 199");
}

// =============================================================================
// export
// =============================================================================

#[test]
fn export_backup_writes_file_and_logs_success() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = seeded_app_state();
    let path = state.export_backup(dir.path(), "shop").unwrap();
    assert!(path.is_file());
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("shop_"));
    assert_eq!(state.logs().latest().unwrap().kind, LogKind::Success);
}

#[test]
fn export_backup_failure_logs_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "x").unwrap();
    let mut state = seeded_app_state();
    let result = state.export_backup(&blocker.join("sub"), "shop");
    assert!(result.is_err());
    assert_eq!(state.logs().latest().unwrap().kind, LogKind::Error);
}

// =============================================================================
// restore
// =============================================================================

#[test]
fn export_then_restore_is_identity() {
    let source = seeded_app_state();
    let text = export_text(&source);

    let mut target = test_app_state();
    let outcome = target.restore_backup(&text, |_| true);
    assert!(matches!(outcome, RestoreOutcome::Restored { skipped: 0 }));
    assert_eq!(target.collections(), source.collections());
}

#[test]
fn restore_twice_equals_restore_once() {
    let text = export_text(&seeded_app_state());

    let mut once = test_app_state();
    once.restore_backup(&text, |_| true);
    let mut twice = test_app_state();
    twice.restore_backup(&text, |_| true);
    twice.restore_backup(&text, |_| true);

    assert_eq!(once.collections(), twice.collections());
    assert_eq!(once.storage().get_item(ORDERS_KEY).unwrap(), twice.storage().get_item(ORDERS_KEY).unwrap());
}

#[test]
fn restore_replaces_rather_than_merges() {
    let mut state = seeded_app_state();
    let text = r#"{"products":[{"id":"p9","name":"Only","price":1}]}"#;
    state.restore_backup(text, |_| true);
    assert_eq!(state.products().len(), 1);
    assert_eq!(state.products()[0].id, "p9");
    assert!(state.customers().is_empty());
    assert!(state.orders().is_empty());
    assert_eq!(state.storage().get_item(CUSTOMERS_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn restore_malformed_leaves_state_and_logs_one_error() {
    let mut state = seeded_app_state();
    let before = state.collections().clone();
    let logs_before = state.logs().len();

    let mut asked = false;
    let outcome = state.restore_backup("this is not json", |_| {
        asked = true;
        true
    });

    assert!(matches!(outcome, RestoreOutcome::Rejected(BackupError::Malformed(_))));
    assert!(!asked);
    assert_eq!(state.collections(), &before);
    assert_eq!(state.logs().len(), logs_before + 1);
    assert_eq!(state.logs().latest().unwrap().kind, LogKind::Error);
}

#[test]
fn restore_without_collections_empties_state() {
    let mut state = seeded_app_state();
    let outcome = state.restore_backup(r#"{"version":"x"}"#, |_| true);
    assert!(matches!(outcome, RestoreOutcome::Restored { skipped: 0 }));
    assert!(state.collections().is_empty());
    assert!(state.logs().entries().all(|e| e.kind != LogKind::Error));
}

#[test]
fn restore_declined_changes_nothing() {
    let mut state = seeded_app_state();
    let before = state.collections().clone();
    let outcome = state.restore_backup(r#"{"version":"x"}"#, |_| false);
    assert!(matches!(outcome, RestoreOutcome::Declined));
    assert_eq!(state.collections(), &before);
    assert!(state.logs().is_empty());
}

#[test]
fn restore_confirm_sees_plan() {
    let mut state = test_app_state();
    let text = export_text(&seeded_app_state());
    state.restore_backup(&text, |plan| {
        assert_eq!(plan.collections.orders.len(), 1);
        assert!(plan.version.is_some());
        false
    });
}

#[test]
fn restore_reports_skipped_records() {
    let mut state = test_app_state();
    let outcome = state.restore_backup(r#"{"customers":[{"id":"c1","name":"A"},{"id":5}]}"#, |_| true);
    assert!(matches!(outcome, RestoreOutcome::Restored { skipped: 1 }));
    assert!(state.logs().latest().unwrap().message.contains("1 unreadable"));
}

#[test]
fn restore_onto_failing_storage_keeps_data_and_logs_error() {
    let mut state = AppState::open(ReadOnlyStorage);
    let outcome = state.restore_backup(r#"{"customers":[{"id":"c1","name":"A"}]}"#, |_| true);
    assert!(matches!(outcome, RestoreOutcome::Restored { skipped: 0 }));
    assert_eq!(state.customers().len(), 1);
    let kinds: Vec<LogKind> = state.logs().entries().map(|e| e.kind).collect();
    assert_eq!(kinds, [LogKind::Success, LogKind::Error]);
}
