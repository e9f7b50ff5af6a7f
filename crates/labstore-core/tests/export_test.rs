//! CSV / JSON / JSONL exporters, blobs and filename suggestions.

use chrono::{TimeZone, Utc};
use labstore_core::{FileFormat, Row, Snapshot, Store, StoreConfig, StoreError};
use serde_json::{json, Value};

fn row(value: Value) -> Row {
    value.as_object().cloned().expect("row literal must be an object")
}

fn store_with(rows: Vec<Value>) -> Store {
    let mut store = Store::new();
    store.hydrate(Snapshot {
        data: rows.into_iter().map(row).collect(),
        state: Row::new(),
    });
    store
}

#[test]
fn test_csv_clean_drops_underscore_columns() {
    let store = store_with(vec![json!({"a": 1, "_b": 2}), json!({"a": 3})]);
    let csv = store.export_csv(",", true);

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["a", "1", "3"]);
}

#[test]
fn test_csv_raw_keeps_underscore_columns() {
    let store = store_with(vec![json!({"a": 1, "_b": 2}), json!({"a": 3})]);
    assert_eq!(store.export_csv(",", false), "_b,a\n2,1\n,3");
}

#[test]
fn test_csv_missing_and_null_cells_are_empty() {
    let store = store_with(vec![
        json!({"sender": "s", "x": 1}),
        json!({"y": null}),
    ]);
    assert_eq!(store.export_csv(",", true), "sender,x,y\ns,1,\n,,");
}

#[test]
fn test_csv_quotes_only_when_needed() {
    let store = store_with(vec![json!({
        "plain": "hello",
        "comma": "a,b",
        "quote": "say \"hi\"",
        "newline": "line1\nline2",
        "nested": {"k": [1, 2]},
        "flag": true,
        "num": 2.5,
    })]);
    let csv = store.export_csv(",", true);

    assert_eq!(
        csv,
        "comma,flag,nested,newline,num,plain,quote\n\
         \"a,b\",true,\"{\"\"k\"\":[1,2]}\",\"line1\nline2\",2.5,hello,\"say \"\"hi\"\"\""
    );
}

#[test]
fn test_csv_quoting_depends_on_separator() {
    let store = store_with(vec![json!({"a": "x,y", "b": "p;q"})]);
    assert_eq!(store.export_csv(";", true), "a;b\nx,y;\"p;q\"");
}

#[test]
fn test_json_round_trip() {
    let store = store_with(vec![
        json!({"a": 1, "_hidden": "h", "nested": {"xs": [1, 2]}}),
        json!({"b": "two"}),
    ]);
    let parsed: Vec<Row> = serde_json::from_str(&store.export_json(false).unwrap()).unwrap();
    assert_eq!(parsed, store.data());

    let cleaned: Vec<Row> = serde_json::from_str(&store.export_json(true).unwrap()).unwrap();
    assert_eq!(cleaned, store.clean_data());
}

#[test]
fn test_json_keeps_row_key_order() {
    let store = store_with(vec![json!({"zeta": 1, "alpha": 2})]);
    assert_eq!(store.export_json(true).unwrap(), r#"[{"zeta":1,"alpha":2}]"#);
}

#[test]
fn test_jsonl_one_object_per_line_without_trailing_newline() {
    let store = store_with(vec![json!({"a": 1, "_x": 0}), json!({"b": 2})]);
    assert_eq!(store.export_jsonl(true).unwrap(), "{\"a\":1}\n{\"b\":2}");
    assert_eq!(
        store.export_jsonl(false).unwrap(),
        "{\"a\":1,\"_x\":0}\n{\"b\":2}"
    );
    assert_eq!(Store::new().export_jsonl(true).unwrap(), "");
}

#[test]
fn test_blob_mime_types() {
    let store = store_with(vec![json!({"a": 1})]);

    let csv = store.export_blob(FileFormat::Csv, true).unwrap();
    assert_eq!(csv.mime, "text/csv");
    assert_eq!(csv.bytes, b"a\n1".to_vec());

    let json = store.export_blob_str("json", true).unwrap();
    assert_eq!(json.mime, "application/json");
    assert_eq!(json.bytes, br#"[{"a":1}]"#.to_vec());

    let jsonl = store.export_blob_str("jsonl", true).unwrap();
    assert_eq!(jsonl.mime, "application/jsonl");
    assert_eq!(jsonl.len(), 7);
    assert!(!jsonl.is_empty());

    let empty = Store::new().export_blob(FileFormat::JsonL, true).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.mime, "application/jsonl");
}

#[test]
fn test_blob_uses_configured_separator() {
    let mut store = Store::with_config(StoreConfig::default().with_csv_separator("\t"));
    store.set_value("a", 1).unwrap();
    store.set_value("b", 2).unwrap();
    store.commit().unwrap();

    let blob = store.export_blob(FileFormat::Csv, true).unwrap();
    assert_eq!(String::from_utf8(blob.bytes).unwrap(), "a\tb\n1\t2");
}

#[test]
fn test_unsupported_format() {
    let store = Store::new();
    match store.export_blob_str("xlsx", true) {
        Err(StoreError::UnsupportedFormat(format)) => assert_eq!(format, "xlsx"),
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
    assert!("CSV".parse::<FileFormat>().is_err(), "format names are case-sensitive");
}

#[test]
fn test_make_filename_without_id() {
    let store = Store::new();
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    assert_eq!(
        store.make_filename_at("study", Some("csv"), &now),
        "study--2024-03-09--14:05:07.csv"
    );
    assert_eq!(
        store.make_filename_at("study", None, &now),
        "study--2024-03-09--14:05:07"
    );
}

#[test]
fn test_make_filename_with_guessed_id() {
    let mut store = Store::new();
    store.set_value("participant_id", "p-42").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    assert_eq!(
        store.make_filename_at("data", Some("json"), &now),
        "data--p-42--2024-03-09--14:05:07.json"
    );

    // `participant` is checked before `participant_id`
    store.set_value("participant", 17).unwrap();
    assert_eq!(
        store.make_filename_at("data", Some("json"), &now),
        "data--17--2024-03-09--14:05:07.json"
    );
}

#[test]
fn test_make_filename_skips_falsy_id() {
    let mut store = Store::new();
    store.set_value("id", "").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    assert_eq!(store.guess_id(), Some(json!("")));
    assert_eq!(
        store.make_filename_at("study", Some("csv"), &now),
        "study--2024-03-09--14:05:07.csv"
    );
}

#[test]
fn test_make_filename_keeps_id_inside_one_path_component() {
    let mut store = Store::new();
    store.set_value("participant", "../../escaped").unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    assert_eq!(
        store.make_filename_at("study", Some("csv"), &now),
        "study--.._.._escaped--2024-03-09--14:05:07.csv"
    );

    store.set_value("participant", "a\\b\nc").unwrap();
    assert_eq!(
        store.make_filename_at("study", None, &now),
        "study--a_b_c--2024-03-09--14:05:07"
    );
}

#[test]
fn test_guess_id_from_custom_columns() {
    let mut store = Store::with_config(StoreConfig::default().with_id_columns(["subject"]));
    store.set_value("id", "ignored").unwrap();
    store.set_value("subject", "s1").unwrap();

    assert_eq!(store.guess_id(), Some(json!("s1")));
    assert_eq!(store.guess_id_from(&["id"]), Some(json!("ignored")));
}

#[test]
fn test_download_pairs_blob_and_filename() {
    let mut store = Store::new();
    store.set_value("id", "abc").unwrap();
    store.set_value("_scratch", 1).unwrap();
    store.commit().unwrap();

    let download = store.download(FileFormat::JsonL).unwrap();
    assert!(download.filename.starts_with("data--abc--"));
    assert!(download.filename.ends_with(".jsonl"));
    assert_eq!(download.blob.mime, "application/jsonl");
    assert_eq!(download.blob.bytes, br#"{"id":"abc"}"#.to_vec());
}
