//! Records written by older stores in the `{"object": ...}` wrapper format

use crate::common::*;
use std::fs;

fn write_legacy(store: &TestStore, path: &str, data: serde_json::Value) -> std::path::PathBuf {
    let file = store.record_file(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, serde_json::to_vec(&json!({ "object": data })).unwrap()).unwrap();
    file
}

#[test]
fn legacy_record_loads_with_open_acl() {
    let store = TestStore::new();
    write_legacy(&store, "/old/doc", json!({"title": "from before"}));

    let record = store.get("/old/doc");
    assert_eq!(record.data, json!({"title": "from before"}));
    assert_eq!(record.acl, Acl::open());
    assert!(record.types.is_empty());
}

#[test]
fn reading_does_not_rewrite_the_file() {
    let store = TestStore::new();
    let file = write_legacy(&store, "/old/doc", json!({"n": 1}));
    let before = fs::read(&file).unwrap();

    store.get("/old/doc");
    assert!(store.model.exists(&ctx(), &p("/old/doc")).unwrap());
    let listed = store.model.start_query().prefix(p("/old")).execute(&ctx()).unwrap();
    assert_eq!(listed.len(), 1);

    assert_eq!(fs::read(&file).unwrap(), before);
}

#[test]
fn next_write_persists_current_format() {
    let store = TestStore::new();
    let file = write_legacy(&store, "/old/doc", json!({"n": 1}));

    let updated = store
        .model
        .update(&ctx(), &p("/old/doc"), &mut |mut record: Record| -> arbordb::Result<Record> {
            record.data["n"] = json!(2);
            Ok(record)
        })
        .unwrap();
    assert_eq!(updated.data, json!({"n": 2}));

    let doc: serde_json::Value = serde_json::from_slice(&fs::read(&file).unwrap()).unwrap();
    assert!(doc.get("object").is_none());
    assert_eq!(doc["data"], json!({"n": 2}));
    assert_eq!(doc["acl"], Acl::open().into_payload());
}

#[test]
fn legacy_and_current_records_query_together() {
    let store = TestStore::new();
    write_legacy(&store, "/mixed/a", json!({"kind": "x"}));
    store.put("/mixed/b", json!({"kind": "x"}));
    store.put("/mixed/c", json!({"kind": "y"}));

    let paths: Vec<Path> = store
        .model
        .start_query()
        .prefix(p("/mixed"))
        .filter_eq("kind", json!("x"))
        .execute_paths(&ctx())
        .unwrap()
        .collect();
    assert_eq!(paths, vec![p("/mixed/a"), p("/mixed/b")]);
}

#[test]
fn document_without_payload_is_unavailable() {
    let store = TestStore::new();
    let file = store.record_file("/broken");
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(&file, br#"{"acl": {}}"#).unwrap();

    let err = store.model.load(&ctx(), &p("/broken")).unwrap_err();
    assert_eq!(err.error_code(), "ServiceUnavailable");
}
