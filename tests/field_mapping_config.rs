use bundle_scoring::AdapterError;
use bundle_scoring::config::{FieldMapping, FieldRule};

#[test]
fn mapping_loads_from_wrapped_legacy_document() {
    let mapping = FieldMapping::from_json_path("tests/fixtures/field_mapping.json").unwrap();

    assert_eq!(mapping.len(), 4);
    assert_eq!(
        mapping.target_fields().collect::<Vec<_>>(),
        vec!["AGE", "SEX", "BP", "CHOLESTEROL"]
    );
    assert_eq!(mapping.rules()[2], FieldRule::new("bp", "BP"));
}

#[test]
fn optional_field_is_rejected_at_load_time() {
    let err = FieldMapping::from_json_path("tests/fixtures/optional_field_mapping.json").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("optional fields are not supported"));
    assert!(msg.contains("'sex'"));
}

#[test]
fn missing_mapping_file_is_an_io_error() {
    let err = FieldMapping::from_json_path("tests/fixtures/does_not_exist.json").unwrap_err();
    assert!(matches!(err, AdapterError::Io(_)));
}

#[test]
fn wrong_document_shape_is_a_json_error() {
    let err = FieldMapping::from_json_str(r#"{"rules": []}"#).unwrap_err();
    assert!(matches!(err, AdapterError::Json(_)));
}
