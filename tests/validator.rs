//! Tests for metadata validation against the built-in schemas.
mod common;
use common::*;
use eegflow::prelude::*;
use serde_json::json;

#[test]
fn test_missing_required_fields_in_declaration_order() {
    let report = validate("Plot Channels", &metadata(json!({})));
    assert!(!report.valid);
    assert_eq!(
        report.errors,
        vec![
            "Missing required field: title",
            "Missing required field: n_channels",
            "Missing required field: block",
        ]
    );
}

#[test]
fn test_empty_string_counts_as_missing() {
    let report = validate("Input File", &metadata(json!({"file": ""})));
    assert_eq!(report.errors, vec!["Missing required field: file"]);
}

#[test]
fn test_unknown_type_is_always_valid() {
    let report = validate("Bandpass Filter", &metadata(json!({"low": "abc"})));
    assert!(report.valid);
    assert!(report.errors.is_empty());
}

#[test]
fn test_notch_frequency_below_min() {
    let report = validate(
        "Notch Filter",
        &metadata(json!({"frequency": -1, "include eog": true})),
    );
    assert!(!report.valid);
    assert_eq!(report.errors, vec!["frequency must be >= 0"]);
}

#[test]
fn test_valid_plot_channels() {
    let report = validate(
        "Plot Channels",
        &metadata(json!({"title": "x", "n_channels": 3, "block": true})),
    );
    assert!(report.valid);
    assert!(report.errors.is_empty());
}

#[test]
fn test_type_and_min_failures_are_both_reported() {
    let report = validate(
        "Plot Channels",
        &metadata(json!({"title": "x", "n_channels": -2, "block": true})),
    );
    assert_eq!(
        report.errors,
        vec!["n_channels must be a positive integer", "n_channels must be >= 1"]
    );
}

#[test]
fn test_kind_mismatch_messages() {
    let report = validate(
        "Plot Channels",
        &metadata(json!({"title": 7, "n_channels": 2.5, "block": "yes"})),
    );
    assert_eq!(
        report.errors,
        vec![
            "title must be a string",
            "n_channels must be a positive integer",
            "block must be true or false",
        ]
    );
}

#[test]
fn test_numeric_strings_from_form_inputs() {
    let report = validate(
        "Notch Filter",
        &metadata(json!({"frequency": "60", "include eog": false})),
    );
    assert!(report.valid);

    let report = validate(
        "Notch Filter",
        &metadata(json!({"frequency": "sixty", "include eog": false})),
    );
    assert_eq!(report.errors, vec!["frequency must be a number"]);
}

#[test]
fn test_errors_for_every_field_are_collected() {
    let report = validate(
        "Notch Filter",
        &metadata(json!({"frequency": -5, "include eog": "no"})),
    );
    assert_eq!(
        report.errors,
        vec!["frequency must be >= 0", "include eog must be true or false"]
    );
    assert_eq!(
        report.to_string(),
        "frequency must be >= 0; include eog must be true or false"
    );
}

#[test]
fn test_custom_registry_validator() {
    let registry = SchemaRegistry::empty()
        .with_type(
            "Resample",
            NodeSchema::new().with_field(
                "sfreq",
                FieldSpec::new(FieldKind::Number).required().with_min(0.5),
            ),
        )
        .unwrap();
    let validator = Validator::new(&registry);

    let report = validator.validate("Resample", &metadata(json!({"sfreq": 0.25})));
    assert_eq!(report.errors, vec!["sfreq must be >= 0.5"]);
    assert!(validator.validate("Resample", &metadata(json!({"sfreq": 256}))).valid);
}

#[test]
fn test_empty_string_on_optional_field_is_checked() {
    let registry = SchemaRegistry::empty()
        .with_type(
            "Epochs",
            NodeSchema::new()
                .with_field("flag", FieldSpec::new(FieldKind::Boolean))
                .with_field("count", FieldSpec::new(FieldKind::Integer).with_min(1.0))
                .with_field("note", FieldSpec::new(FieldKind::String)),
        )
        .unwrap();
    let validator = Validator::new(&registry);

    let report = validator.validate(
        "Epochs",
        &metadata(json!({"flag": "", "count": "", "note": ""})),
    );
    assert_eq!(
        report.errors,
        vec![
            "flag must be true or false",
            "count must be a positive integer",
            "count must be >= 1",
        ]
    );

    assert!(validator.validate("Epochs", &metadata(json!({}))).valid);
    assert!(validator.validate("Epochs", &metadata(json!({"flag": null}))).valid);
}
