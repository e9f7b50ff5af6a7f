//! Snapshot and config file helpers.

use labstore_core::storage;
use labstore_core::{FileFormat, Store, StoreConfig, StoreError};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_snapshot_file_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sessions").join("p1.json");

    let mut store = Store::new();
    store.set_value("participant", "p1").unwrap();
    store.set_value("rt", 350).unwrap();
    store.commit().unwrap();
    store.set_value("rt", 420).unwrap();
    store.commit().unwrap();

    storage::save_snapshot(&path, &store.snapshot()).unwrap();
    assert!(path.exists(), "parent directories should be created");

    let mut restored = Store::new();
    restored.hydrate(storage::load_snapshot(&path).unwrap());

    assert_eq!(restored.len(), 2);
    assert_eq!(restored.get("rt"), Some(json!(420)));
    assert_eq!(restored.export_csv(",", true), store.export_csv(",", true));
}

#[test]
fn test_snapshot_fields_default_to_empty() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("partial.json");
    std::fs::write(&path, r#"{"data": [{"a": 1}]}"#).unwrap();

    let snapshot = storage::load_snapshot(&path).unwrap();
    assert_eq!(snapshot.data.len(), 1);
    assert!(snapshot.state.is_empty());
}

#[test]
fn test_load_snapshot_reports_bad_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(storage::load_snapshot(&path), Err(StoreError::Json(_))));
    assert!(matches!(
        storage::load_snapshot(&tmp.path().join("missing.json")),
        Err(StoreError::Io(_))
    ));
}

#[test]
fn test_missing_config_gives_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = storage::load_config(&tmp.path().join("store.yaml")).unwrap();
    assert_eq!(config, StoreConfig::default());
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.yaml");
    std::fs::write(&path, "csv_separator: \";\"\nid_columns: [subject]\n").unwrap();

    let config = storage::load_config(&path).unwrap();
    assert_eq!(config.csv_separator, ";");
    assert_eq!(config.id_columns, vec!["subject"]);
    assert!(config.clean);
    assert_eq!(config.priority_columns, StoreConfig::default().priority_columns);
}

#[test]
fn test_config_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("conf").join("store.yaml");
    let config = StoreConfig::default()
        .with_clean(false)
        .with_filename_prefix("pilot")
        .with_priority_columns(["trial"]);

    storage::save_config(&path, &config).unwrap();
    assert_eq!(storage::load_config(&path).unwrap(), config);
}

#[test]
fn test_write_blob() {
    let tmp = TempDir::new().unwrap();
    let mut store = Store::new();
    store.set_value("a", "x").unwrap();
    store.commit().unwrap();

    let download = store.download(FileFormat::Csv).unwrap();
    let path = tmp.path().join("out").join("export.csv");
    storage::write_blob(&path, &download.blob).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nx");
}
