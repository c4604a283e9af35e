use hbnb_core::{AttrValue, Record, RecordDecodeError, RecordType};
use serde_json::json;

fn as_object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn new_record_sets_identity_and_equal_timestamps() {
    let record = Record::new(RecordType::User);

    assert!(uuid::Uuid::parse_str(record.id()).is_ok());
    assert_eq!(record.kind(), RecordType::User);
    assert_eq!(record.created_at(), record.updated_at());
    assert!(record.attributes().is_empty());
    assert_eq!(record.key(), format!("User.{}", record.id()));
}

#[test]
fn fresh_ids_are_unique() {
    let first = Record::new(RecordType::Place);
    let second = Record::new(RecordType::Place);
    assert_ne!(first.id(), second.id());
}

#[test]
fn serialized_mapping_has_wire_fields_in_order() {
    let mut record = Record::new(RecordType::City);
    record.set_attribute("name", AttrValue::from("Nairobi"));
    record.set_attribute("population", AttrValue::Int(4_397_073));

    let map = record.to_map();
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["id", "created_at", "updated_at", "name", "population", "__class__"]
    );
    assert_eq!(map["__class__"], "City");
    assert_eq!(map["population"], 4_397_073);

    let created_at = map["created_at"].as_str().unwrap();
    assert_eq!(created_at.len(), "2017-09-28T21:05:54.119427".len());
    assert_eq!(&created_at[10..11], "T");
    assert_eq!(&created_at[19..20], ".");
}

#[test]
fn round_trip_preserves_identity_timestamps_and_attributes() {
    let mut record = Record::new(RecordType::Review);
    record.set_attribute("text", AttrValue::from("Great stay"));
    record.set_attribute("stars", AttrValue::Float(4.5));
    record.set_attribute(
        "tags",
        AttrValue::List(vec![AttrValue::from("quiet"), AttrValue::Bool(true)]),
    );
    record.touch();

    let restored = Record::from_attributes(RecordType::Review, &record.to_map()).unwrap();
    assert_eq!(restored, record);

    let again = Record::from_attributes(RecordType::Review, &restored.to_map()).unwrap();
    assert_eq!(again, record);
}

#[test]
fn from_attributes_copies_unknown_entries_and_drops_type_tag() {
    let map = as_object(json!({
        "id": "56d43177-cc5f-4d6c-a0c1-e167f8c27337",
        "created_at": "2017-09-28T21:03:54.052298",
        "updated_at": "2017-09-28T21:03:54.052302",
        "my_number": 89,
        "name": "My_First_Model",
        "__class__": "BaseModel"
    }));

    let record = Record::from_attributes(RecordType::BaseModel, &map).unwrap();
    assert_eq!(record.id(), "56d43177-cc5f-4d6c-a0c1-e167f8c27337");
    assert_eq!(record.attribute("my_number"), Some(&AttrValue::Int(89)));
    assert_eq!(
        record.attribute("name"),
        Some(&AttrValue::from("My_First_Model"))
    );
    assert_eq!(record.attribute("__class__"), None);
    assert_eq!(record.attributes().len(), 2);
}

#[test]
fn from_attributes_requires_identity_fields() {
    let missing_id = as_object(json!({
        "created_at": "2017-09-28T21:03:54.052298",
        "updated_at": "2017-09-28T21:03:54.052302"
    }));
    assert_eq!(
        Record::from_attributes(RecordType::User, &missing_id).unwrap_err(),
        RecordDecodeError::MissingField("id")
    );

    let bad_time = as_object(json!({
        "id": "x",
        "created_at": "yesterday",
        "updated_at": "2017-09-28T21:03:54.052302"
    }));
    assert!(matches!(
        Record::from_attributes(RecordType::User, &bad_time).unwrap_err(),
        RecordDecodeError::InvalidField {
            field: "created_at",
            ..
        }
    ));
}

#[test]
fn reserved_attributes_cannot_be_assigned() {
    let mut record = Record::new(RecordType::User);
    let id = record.id().to_string();

    assert!(!record.set_attribute("id", AttrValue::from("other")));
    assert!(!record.set_attribute("created_at", AttrValue::Int(0)));
    assert!(!record.set_attribute("__class__", AttrValue::from("Place")));
    assert_eq!(record.id(), id);
    assert!(record.attributes().is_empty());
}

#[test]
fn reassignment_keeps_attribute_position() {
    let mut record = Record::new(RecordType::User);
    record.set_attribute("first_name", AttrValue::from("Betty"));
    record.set_attribute("last_name", AttrValue::from("Holberton"));
    record.set_attribute("first_name", AttrValue::from("Bettie"));

    let names: Vec<&str> = record.attributes().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["first_name", "last_name"]);
    assert_eq!(
        record.attribute("first_name"),
        Some(&AttrValue::from("Bettie"))
    );
}

#[test]
fn touch_moves_only_updated_at() {
    let mut record = Record::new(RecordType::Amenity);
    let created_at = record.created_at();
    std::thread::sleep(std::time::Duration::from_millis(2));
    record.touch();

    assert_eq!(record.created_at(), created_at);
    assert!(record.updated_at() > created_at);
}

#[test]
fn render_shows_type_id_and_attributes() {
    let mut record = Record::new(RecordType::User);
    record.set_attribute("first_name", AttrValue::from("Betty"));
    record.set_attribute("age", AttrValue::Int(89));

    let rendered = record.render();
    let prefix = format!("[User] ({}) {{'id': '{}', 'created_at': '", record.id(), record.id());
    assert!(rendered.starts_with(&prefix), "unexpected render: {rendered}");
    assert!(rendered.ends_with("'first_name': 'Betty', 'age': 89}"));
    assert!(rendered.contains("'updated_at': '"));
}

#[test]
fn record_type_serializes_as_its_wire_name() {
    assert_eq!(serde_json::to_value(RecordType::Place).unwrap(), "Place");
    assert_eq!(
        serde_json::from_value::<RecordType>(json!("State")).unwrap(),
        RecordType::State
    );
    assert!(serde_json::from_value::<RecordType>(json!("Spaceship")).is_err());
}
