use chrono::{TimeZone, Utc};
use openduck::error::PersistenceError;
use openduck::store::{backup_path, QueryStore};
use std::fs;
use tempfile::TempDir;

fn store_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("query_store.json")
}

#[test]
fn test_store_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);

    let (mut store, warning) = QueryStore::load(&path);
    assert!(warning.is_none());
    assert!(store.list_history().is_empty());
    store.record("SELECT 1").unwrap();
    store.record("SELECT 2").unwrap();
    store.save("daily", "SELECT * FROM sales").unwrap();
    drop(store);

    let (store, warning) = QueryStore::load(&path);
    assert!(warning.is_none());
    let history: Vec<&str> = store.list_history().iter().map(|h| h.sql.as_str()).collect();
    assert_eq!(history, vec!["SELECT 1", "SELECT 2"]);
    assert!(store.list_history()[0].timestamp <= store.list_history()[1].timestamp);
    let saved = store.saved("daily").unwrap();
    assert_eq!(saved.sql, "SELECT * FROM sales");
    assert_eq!(store.list_saved().count(), 1);
}

#[test]
fn test_corrupt_file_yields_empty_store_and_warning() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    fs::write(&path, "{ this is not json").unwrap();

    let (mut store, warning) = QueryStore::load(&path);
    assert!(matches!(warning, Some(PersistenceError::Parse { .. })));
    assert!(store.list_history().is_empty());
    assert_eq!(store.list_saved().count(), 0);

    // The next write replaces the broken file.
    store.record("SELECT 1").unwrap();
    let (reloaded, warning) = QueryStore::load(&path);
    assert!(warning.is_none());
    assert_eq!(reloaded.list_history().len(), 1);
}

#[test]
fn test_unknown_fields_ignored_and_missing_lists_default() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    fs::write(
        &path,
        r#"{
  "version": 7,
  "history": [
    { "sql": "SELECT 42", "timestamp": "2024-05-01T12:00:00Z", "tab": "Main" }
  ]
}"#,
    )
    .unwrap();

    let (store, warning) = QueryStore::load(&path);
    assert!(warning.is_none());
    assert_eq!(store.last_history().unwrap().sql, "SELECT 42");
    assert_eq!(store.list_saved().count(), 0);
}

#[test]
fn test_history_limit_applies_on_load() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let (mut store, _) = QueryStore::load(&path);
    for n in 0..5 {
        store.record(&format!("SELECT {n}")).unwrap();
    }

    let (store, _) = QueryStore::load(&path);
    let store = store.with_history_limit(3);
    let history: Vec<&str> = store.list_history().iter().map(|h| h.sql.as_str()).collect();
    assert_eq!(history, vec!["SELECT 2", "SELECT 3", "SELECT 4"]);
}

#[test]
fn test_clear_history_keeps_saved_queries() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let (mut store, _) = QueryStore::load(&path);
    store.record("SELECT 1").unwrap();
    store.save("keep", "SELECT 2").unwrap();
    store.clear_history().unwrap();

    let (store, _) = QueryStore::load(&path);
    assert!(store.list_history().is_empty());
    assert!(store.saved("keep").is_some());
}

#[test]
fn test_timestamps_without_offset_are_read_as_utc() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    fs::write(
        &path,
        r#"{
  "history": [{ "sql": "SELECT 1", "timestamp": "2024-05-01T12:00:00" }],
  "saved_queries": [
    { "name": "daily", "sql": "SELECT 2", "timestamp": "2024-05-02 08:30:00.250" }
  ]
}"#,
    )
    .unwrap();

    let (store, warning) = QueryStore::load(&path);
    assert!(warning.is_none());
    assert_eq!(
        store.last_history().unwrap().timestamp,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    );
    let saved = store.saved("daily").unwrap();
    assert_eq!(saved.sql, "SELECT 2");
    assert_eq!(saved.timestamp.timestamp_subsec_millis(), 250);
}

#[test]
fn test_unparsable_file_is_backed_up_before_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = store_path(&dir);
    let broken = r#"{"history":[{"sql":"SELECT 1","timestamp":"last tuesday"}]}"#;
    fs::write(&path, broken).unwrap();

    let (mut store, warning) = QueryStore::load(&path);
    assert!(matches!(warning, Some(PersistenceError::Parse { .. })));
    let backup = backup_path(&path);
    assert_eq!(backup, dir.path().join("query_store.json.bak"));
    assert_eq!(fs::read_to_string(&backup).unwrap(), broken);

    store.record("SELECT 2").unwrap();
    assert_eq!(fs::read_to_string(&backup).unwrap(), broken);
    let (reloaded, warning) = QueryStore::load(&path);
    assert!(warning.is_none());
    assert_eq!(reloaded.last_history().unwrap().sql, "SELECT 2");
}
