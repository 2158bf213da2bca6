//! Metadata validation against a [`SchemaRegistry`].
//!
//! Validation never fails with an error: every violation is collected into a
//! [`ValidationReport`] so an editor can show all problems at once.

use crate::graph::Metadata;
use crate::schema::{FieldKind, FieldSpec, SchemaRegistry};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The outcome of validating one metadata record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// Messages in field-declaration order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            f.write_str("valid")
        } else {
            write!(f, "{}", self.errors.iter().join("; "))
        }
    }
}

/// Checks candidate metadata against the schemas of a registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validates `metadata` as a node of `node_type`.
    ///
    /// An unknown type is vacuously valid. For each declared field, in
    /// order: an absent or `null` field is only an error if it is required,
    /// and so is `""` (`"Missing required field: <k>"`). On an optional
    /// field `""` is an ordinary value. Every present value is checked
    /// against its kind and then against `min`; a value failing both checks
    /// is reported twice.
    pub fn validate(&self, node_type: &str, metadata: &Metadata) -> ValidationReport {
        let Some(schema) = self.registry.schema(node_type) else {
            return ValidationReport::from_errors(Vec::new());
        };

        let mut errors = Vec::new();
        for (key, spec) in schema.fields() {
            match metadata.get(key).filter(|v| !v.is_null()) {
                None => {
                    if spec.required {
                        errors.push(format!("Missing required field: {}", key));
                    }
                }
                Some(Value::String(s)) if s.is_empty() && spec.required => {
                    errors.push(format!("Missing required field: {}", key));
                }
                Some(value) => check_field(key, spec, value, &mut errors),
            }
        }
        ValidationReport::from_errors(errors)
    }
}

/// Validates against the built-in registry.
pub fn validate(node_type: &str, metadata: &Metadata) -> ValidationReport {
    Validator::new(SchemaRegistry::builtin()).validate(node_type, metadata)
}

fn check_field(key: &str, spec: &FieldSpec, value: &Value, errors: &mut Vec<String>) {
    let kind_ok = match spec.kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => parse_number(value).is_some(),
        FieldKind::Integer => parse_number(value).is_some_and(|n| n.fract() == 0.0 && n >= 0.0),
        FieldKind::Boolean => value.is_boolean(),
    };
    if !kind_ok {
        errors.push(format!("{} must be {}", key, spec.kind.requirement()));
    }

    if let Some(min) = spec.min {
        if coerce_number(value).is_some_and(|n| n < min) {
            errors.push(format!("{} must be >= {}", key, min));
        }
    }
}

/// A finite number, either a JSON number or a string that parses as one.
fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// Loose numeric reading used for bound checks; booleans count as 0/1 and a
/// blank string as 0. Values with no numeric reading never violate a bound.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        other => parse_number(other),
    }
}
