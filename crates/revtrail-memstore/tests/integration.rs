use revtrail_core::{EntitySchema, FieldDef, FieldType, Record};
use revtrail_memstore::MemStore;
use revtrail_track::Tracker;
use serde_json::{json, Value};

fn product_schema() -> EntitySchema {
    EntitySchema::new(
        "Product",
        "id",
        vec![
            FieldDef::new("price", FieldType::Float),
            FieldDef::new("amount", FieldType::Integer),
            FieldDef::new("description", FieldType::String),
        ],
    )
    .unwrap()
}

fn store(options: Value) -> MemStore {
    MemStore::new(Tracker::register(&product_schema(), &options).unwrap())
}

fn rec(value: Value) -> Record {
    value.as_object().unwrap().clone()
}

fn product_data() -> Record {
    rec(json!({ "price": 100, "amount": 10, "description": "product description" }))
}

#[test]
fn create_records_the_first_version() {
    let mut store = store(json!({}));

    let (record, note) = store.create(product_data()).unwrap();

    assert_eq!(record.get("_version"), Some(&json!("00001")));
    assert_eq!(record.get("_hash").and_then(Value::as_str).unwrap().len(), 10);

    assert_eq!(store.history().len(), 1);
    let row = &store.history()[0];
    assert_eq!(row.get("_action"), Some(&json!("create")));
    assert_eq!(row.get("_version"), Some(&json!("00001")));
    assert_eq!(row.get("_hash"), record.get("_hash"));
    assert_eq!(row.get("_recordId"), record.get("id"));
    assert!(row.contains_key("_update"));

    let note = note.unwrap();
    assert_eq!(note.history_row, *row);
    assert_eq!(note.instance, record);
}

#[test]
fn tracked_change_appends_exactly_one_row_and_increments() {
    let mut store = store(json!({}));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();

    let (updated, note) = store.update(id, rec(json!({ "price": 200 }))).unwrap();

    assert_eq!(updated.get("_version"), Some(&json!("00002")));
    assert_eq!(store.history().len(), 2);
    let row = &store.history()[1];
    assert_eq!(row.get("_action"), Some(&json!("update")));
    assert_eq!(row.get("_version"), Some(&json!("00002")));
    assert_eq!(row.get("price"), Some(&json!(200)));
    assert!(note.is_some());
}

#[test]
fn untracked_change_is_clean_when_fingerprinting() {
    let mut store = store(json!({ "tracked_fields": ["price"] }));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();

    let (updated, note) = store
        .update(id, rec(json!({ "description": "new description", "amount": 9 })))
        .unwrap();

    assert_eq!(updated.get("_version"), Some(&json!("00001")));
    assert_eq!(updated.get("description"), Some(&json!("new description")));
    assert_eq!(store.history().len(), 1);
    assert!(note.is_none());
}

#[test]
fn identical_update_is_clean_when_fingerprinting() {
    let mut store = store(json!({}));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();

    let (updated, note) = store.update(id, product_data()).unwrap();

    assert_eq!(updated.get("_version"), Some(&json!("00001")));
    assert_eq!(store.history().len(), 1);
    assert!(note.is_none());
}

#[test]
fn fingerprint_disabled_versions_every_update() {
    let mut store = store(json!({ "fingerprint_field": false }));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();
    assert!(!record.contains_key("_hash"));

    let (updated, _) = store.update(id, product_data()).unwrap();
    assert_eq!(updated.get("_version"), Some(&json!("00002")));

    let (updated, _) = store.update(id, rec(json!({ "description": "same" }))).unwrap();
    assert_eq!(updated.get("_version"), Some(&json!("00003")));

    assert_eq!(store.history().len(), 3);
    assert!(store.history().iter().all(|row| !row.contains_key("_hash")));
}

#[test]
fn delete_records_a_terminal_row() {
    let mut store = store(json!({}));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();
    store.update(id, rec(json!({ "price": 200 }))).unwrap();

    let note = store.delete(id).unwrap().unwrap();

    assert!(store.get(id).is_none());
    assert_eq!(store.history().len(), 3);
    let row = &store.history()[2];
    assert_eq!(row.get("_action"), Some(&json!("delete")));
    assert_eq!(row.get("_version"), Some(&json!("00003")));
    assert_eq!(row.get("price"), Some(&json!(200)));
    assert_eq!(row.get("_recordId"), Some(&json!(id)));
    assert_eq!(note.history_row, *row);
}

#[test]
fn bulk_update_never_touches_versions_or_history() {
    let mut store = store(json!({}));
    let (first, _) = store.create(product_data()).unwrap();
    let (second, _) = store
        .create(rec(json!({ "price": 300, "amount": 10, "description": "other" })))
        .unwrap();

    let matched = store
        .update_where(json!({ "amount": 10 }), rec(json!({ "price": 150 })))
        .unwrap();
    assert_eq!(matched, 2);

    // Data applied, versions untouched, no history rows.
    for record in [&first, &second] {
        let id = record.get("id").and_then(Value::as_u64).unwrap();
        let stored = store.get(id).unwrap();
        assert_eq!(stored.get("price"), Some(&json!(150)));
        assert_eq!(stored.get("_version"), Some(&json!("00001")));
    }
    assert_eq!(store.history().len(), 2);
}

#[test]
fn bulk_delete_without_identifier_skips_history() {
    let mut store = store(json!({}));
    store.create(product_data()).unwrap();
    store.create(product_data()).unwrap();

    let (deleted, note) = store.delete_where(json!({ "amount": 10 })).unwrap();

    assert_eq!(deleted, 2);
    assert!(note.is_none());
    assert!(store.is_empty());
    assert_eq!(store.history().len(), 2);
}

#[test]
fn conditional_delete_by_identifier_records_the_terminal_row() {
    let mut store = store(json!({}));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();

    let (deleted, note) = store.delete_where(json!({ "id": id })).unwrap();

    assert_eq!(deleted, 1);
    let note = note.unwrap();
    assert_eq!(note.history_row.get("_action"), Some(&json!("delete")));
    assert_eq!(note.history_row.get("_version"), Some(&json!("00002")));
}

#[test]
fn conditional_update_resolves_only_when_opted_in() {
    let mut store = store(json!({ "resolve_by_condition": true }));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();

    let matched = store
        .update_where(json!({ "amount": 10 }), rec(json!({ "price": 250 })))
        .unwrap();
    assert_eq!(matched, 1);

    // The resolved instance's version advances, but a conditional write
    // still produces no history row.
    let stored = store.get(id).unwrap();
    assert_eq!(stored.get("_version"), Some(&json!("00002")));
    assert_eq!(store.history().len(), 1);
}

#[test]
fn current_version_matches_newest_history_row() {
    let mut store = store(json!({}));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();

    for price in [110, 120, 130] {
        store.update(id, rec(json!({ "price": price }))).unwrap();
        let stored = store.get(id).unwrap();
        let rows = store.history_of(id);
        let newest = rows.last().unwrap();
        assert_eq!(stored.get("_version"), newest.get("_version"));
    }
}

#[test]
fn history_rows_copy_only_tracked_fields() {
    let mut store = store(json!({ "tracked_fields": ["price"] }));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();
    store.update(id, rec(json!({ "price": 200 }))).unwrap();

    for row in store.history() {
        assert!(row.contains_key("price"));
        assert!(!row.contains_key("amount"));
        assert!(!row.contains_key("description"));
        assert!(!row.contains_key("id"));
    }
}

#[test]
fn renamed_fields_flow_through_history_rows() {
    let mut store = store(json!({
        "tracked_fields": ["price"],
        "history_entity": "ProductChanges",
        "relation_name": "customHistory",
        "back_reference": "element",
        "foreign_key": "elementId",
        "version_field": "version",
        "fingerprint_field": "versionHash",
        "action_field": "eventName",
        "timestamp_field": "updatedAt",
    }));

    let (record, _) = store.create(product_data()).unwrap();
    assert_eq!(record.get("version"), Some(&json!("00001")));
    assert!(record.contains_key("versionHash"));
    assert!(!record.contains_key("_version"));

    let row = &store.history()[0];
    assert_eq!(row.get("version"), Some(&json!("00001")));
    assert_eq!(row.get("eventName"), Some(&json!("create")));
    assert_eq!(row.get("elementId"), record.get("id"));
    assert!(row.contains_key("versionHash"));
    assert!(row.contains_key("updatedAt"));
    assert!(!row.contains_key("_recordId"));
}

#[test]
fn disabled_action_and_timestamp_are_left_out_of_rows() {
    let mut store = store(json!({ "action_field": false, "timestamp_field": false }));
    let (record, _) = store.create(product_data()).unwrap();
    let id = record.get("id").and_then(Value::as_u64).unwrap();
    store.delete(id).unwrap();

    assert_eq!(store.history().len(), 2);
    for row in store.history() {
        assert!(!row.contains_key("_action"));
        assert!(!row.contains_key("_update"));
        assert!(row.contains_key("_version"));
    }
}

#[test]
fn history_of_scans_by_foreign_key() {
    let mut store = store(json!({}));
    let (first, _) = store.create(product_data()).unwrap();
    let (second, _) = store
        .create(rec(json!({ "price": 300, "amount": 1, "description": "other" })))
        .unwrap();
    let first_id = first.get("id").and_then(Value::as_u64).unwrap();
    let second_id = second.get("id").and_then(Value::as_u64).unwrap();
    store.update(first_id, rec(json!({ "price": 101 }))).unwrap();

    assert_eq!(store.history_of(first_id).len(), 2);
    assert_eq!(store.history_of(second_id).len(), 1);
}

#[test]
fn missing_record_updates_and_deletes_fail() {
    let mut store = store(json!({}));
    assert!(store.update(42, product_data()).is_err());
    assert!(store.delete(42).is_err());
}
