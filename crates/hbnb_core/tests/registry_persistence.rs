use hbnb_core::{
    AttrValue, JsonFileStore, LoadOutcome, MemoryStore, ObjectStore, Registry, RegistryError,
    RecordType,
};
use serde_json::Value;

fn stored_json(store: &MemoryStore) -> serde_json::Map<String, Value> {
    serde_json::from_str(&store.text().unwrap()).unwrap()
}

#[test]
fn create_registers_and_persists_under_composite_key() {
    let store = MemoryStore::new();
    let mut registry = Registry::new(&store);

    let id = registry.create(RecordType::User).unwrap();
    let key = format!("User.{id}");

    assert!(registry.all().contains_key(&key));
    assert_eq!(store.save_count(), 1);

    let stored = stored_json(&store);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[&key]["__class__"], "User");
    assert_eq!(stored[&key]["id"], id.as_str());
}

#[test]
fn every_mutation_rewrites_the_full_set() {
    let store = MemoryStore::new();
    let mut registry = Registry::new(&store);

    let user = registry.create(RecordType::User).unwrap();
    let place = registry.create(RecordType::Place).unwrap();
    registry
        .update(
            RecordType::Place,
            &place,
            vec![("name".to_string(), AttrValue::from("Loft"))],
        )
        .unwrap();
    assert_eq!(store.save_count(), 3);
    assert_eq!(stored_json(&store).len(), 2);

    registry.destroy(RecordType::User, &user).unwrap();
    assert_eq!(store.save_count(), 4);

    let stored = stored_json(&store);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[&format!("Place.{place}")]["name"], "Loft");
}

#[test]
fn load_restores_records_without_persisting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file.json");

    let id = {
        let mut registry = Registry::new(JsonFileStore::new(&path));
        let id = registry.create(RecordType::State).unwrap();
        registry
            .update(
                RecordType::State,
                &id,
                vec![
                    ("name".to_string(), AttrValue::from("California")),
                    ("code".to_string(), AttrValue::Int(6)),
                ],
            )
            .unwrap();
        id
    };
    let written = std::fs::read_to_string(&path).unwrap();

    let mut registry = Registry::new(JsonFileStore::new(&path));
    let outcome = registry.load().unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            loaded: 1,
            skipped: 0
        }
    );

    let record = registry.get(RecordType::State, &id).unwrap();
    assert_eq!(record.attribute("name"), Some(&AttrValue::from("California")));
    assert_eq!(record.attribute("code"), Some(&AttrValue::Int(6)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
}

#[test]
fn reloaded_records_match_originals_exactly() {
    let store = MemoryStore::new();
    let mut registry = Registry::new(&store);
    let id = registry.create(RecordType::Review).unwrap();
    registry
        .update(
            RecordType::Review,
            &id,
            vec![("ratio".to_string(), AttrValue::Float(0.75))],
        )
        .unwrap();
    let original = registry.get(RecordType::Review, &id).unwrap().clone();

    let mut reloaded = Registry::new(&store);
    reloaded.load().unwrap();
    assert_eq!(reloaded.get(RecordType::Review, &id), Some(&original));
}

#[test]
fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(JsonFileStore::new(dir.path().join("absent.json")));

    assert_eq!(registry.load().unwrap(), LoadOutcome::Missing);
    assert!(registry.is_empty());
}

#[test]
fn malformed_json_starts_empty() {
    let store = MemoryStore::with_text("{not json");
    let mut registry = Registry::new(&store);

    assert!(matches!(
        registry.load().unwrap(),
        LoadOutcome::Malformed { .. }
    ));
    assert!(registry.is_empty());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn one_bad_entry_discards_everything() {
    let store = MemoryStore::with_text(
        r#"{
            "User.a": {"id": "a", "created_at": "2017-09-28T21:03:54.052298",
                       "updated_at": "2017-09-28T21:03:54.052302", "__class__": "User"},
            "User.b": {"id": "b", "created_at": "not a time",
                       "updated_at": "2017-09-28T21:03:54.052302", "__class__": "User"}
        }"#,
    );
    let mut registry = Registry::new(&store);

    match registry.load().unwrap() {
        LoadOutcome::Malformed { reason } => assert!(reason.contains("User.b")),
        other => panic!("expected malformed outcome, got {other:?}"),
    }
    assert!(registry.is_empty());
}

#[test]
fn unknown_type_tags_are_skipped() {
    let store = MemoryStore::with_text(
        r#"{
            "Spaceship.x": {"id": "x", "created_at": "2017-09-28T21:03:54.052298",
                            "updated_at": "2017-09-28T21:03:54.052302", "__class__": "Spaceship"},
            "City.c": {"id": "c", "created_at": "2017-09-28T21:03:54.052298",
                       "updated_at": "2017-09-28T21:03:54.052302", "__class__": "City",
                       "name": "Lagos"}
        }"#,
    );
    let mut registry = Registry::new(&store);

    assert_eq!(
        registry.load().unwrap(),
        LoadOutcome::Loaded {
            loaded: 1,
            skipped: 1
        }
    );
    assert_eq!(registry.len(), 1);
    assert!(registry.get(RecordType::City, "c").is_some());
}

#[test]
fn load_rekeys_by_record_identity() {
    let store = MemoryStore::with_text(
        r#"{"stale-key": {"id": "c", "created_at": "2017-09-28T21:03:54.052298",
                          "updated_at": "2017-09-28T21:03:54.052302", "__class__": "City"}}"#,
    );
    let mut registry = Registry::new(&store);
    registry.load().unwrap();

    assert!(registry.all().contains_key("City.c"));
    assert!(!registry.all().contains_key("stale-key"));
}

#[test]
fn count_matches_type_prefixed_keys() {
    let mut registry = Registry::new(MemoryStore::new());
    for _ in 0..3 {
        registry.create(RecordType::User).unwrap();
    }
    registry.create(RecordType::Place).unwrap();

    for kind in RecordType::all() {
        let prefix = format!("{}.", kind.as_str());
        let by_key = registry
            .all()
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .count();
        assert_eq!(registry.count(*kind), by_key);
    }
    assert_eq!(registry.count(RecordType::User), 3);
    assert_eq!(registry.records(Some(RecordType::Place)).count(), 1);
    assert_eq!(registry.records(None).count(), 4);
}

#[test]
fn update_refreshes_updated_at_only() {
    let mut registry = Registry::new(MemoryStore::new());
    let id = registry.create(RecordType::User).unwrap();
    let before = registry.get(RecordType::User, &id).unwrap().clone();
    std::thread::sleep(std::time::Duration::from_millis(2));

    let applied = registry
        .update(
            RecordType::User,
            &id,
            vec![
                ("a".to_string(), AttrValue::Int(1)),
                ("b".to_string(), AttrValue::from("x")),
            ],
        )
        .unwrap();
    assert_eq!(applied, 2);

    let after = registry.get(RecordType::User, &id).unwrap();
    assert_eq!(after.created_at(), before.created_at());
    assert!(after.updated_at() > before.updated_at());
    assert_eq!(after.attribute("a"), Some(&AttrValue::Int(1)));
    assert_eq!(after.attribute("b"), Some(&AttrValue::from("x")));
}

#[test]
fn reserved_only_update_is_a_noop() {
    let store = MemoryStore::new();
    let mut registry = Registry::new(&store);
    let id = registry.create(RecordType::User).unwrap();
    let before = registry.get(RecordType::User, &id).unwrap().clone();

    let applied = registry
        .update(
            RecordType::User,
            &id,
            vec![("id".to_string(), AttrValue::from("hijack"))],
        )
        .unwrap();

    assert_eq!(applied, 0);
    assert_eq!(store.save_count(), 1);
    assert_eq!(registry.get(RecordType::User, &id), Some(&before));
}

#[test]
fn lookups_on_missing_records_report_not_found() {
    let mut registry = Registry::new(MemoryStore::new());

    assert!(matches!(
        registry.destroy(RecordType::User, "nope"),
        Err(RegistryError::NotFound { kind: RecordType::User, .. })
    ));
    assert!(matches!(
        registry.update(RecordType::User, "nope", Vec::new()),
        Err(RegistryError::NotFound { .. })
    ));
}

#[test]
fn same_id_under_another_type_is_a_miss() {
    let mut registry = Registry::new(MemoryStore::new());
    let id = registry.create(RecordType::User).unwrap();
    assert!(registry.get(RecordType::Place, &id).is_none());
}

#[test]
fn file_store_reports_absent_file_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("file.json"));
    assert!(store.load().unwrap().is_none());
    assert!(store.describe().starts_with("file:"));
}

#[test]
fn large_unsigned_integers_survive_reload_and_rewrite() {
    let store = MemoryStore::with_text(
        r#"{"User.1": {"id": "1", "created_at": "2017-09-28T21:03:54.052298",
                       "updated_at": "2017-09-28T21:03:54.052302", "__class__": "User",
                       "n": 18446744073709551615}}"#,
    );
    let mut registry = Registry::new(&store);
    registry.load().unwrap();

    let record = registry.get(RecordType::User, "1").unwrap();
    assert_eq!(record.attribute("n"), Some(&AttrValue::UInt(u64::MAX)));

    registry.persist().unwrap();
    let rewritten = store.text().unwrap();
    assert!(rewritten.contains(r#""n":18446744073709551615"#), "got {rewritten}");
    assert_eq!(stored_json(&store)["User.1"]["n"], u64::MAX);
}
