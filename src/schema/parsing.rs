use super::{FieldKind, FieldSpec, NodeSchema};
use crate::error::SchemaError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// On-disk shape of a single field entry.
#[derive(Deserialize)]
struct RawFieldSpec {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    description: String,
}

/// Parses `{ "<Type>": { "<field>": { ... } } }` into ordered schemas.
///
/// Relies on `serde_json`'s order-preserving map so that declaration order
/// survives the round trip.
pub(super) fn parse_schema_document(json: &str) -> Result<Vec<(String, NodeSchema)>, SchemaError> {
    let document: Map<String, Value> =
        serde_json::from_str(json).map_err(|e| SchemaError::JsonParseError(e.to_string()))?;

    let mut schemas = Vec::with_capacity(document.len());
    for (node_type, fields) in document {
        let fields: Map<String, Value> = serde_json::from_value(fields).map_err(|e| {
            SchemaError::JsonParseError(format!("node type '{}': {}", node_type, e))
        })?;

        let mut schema = NodeSchema::new();
        for (field, raw) in fields {
            let raw: RawFieldSpec = serde_json::from_value(raw).map_err(|e| {
                SchemaError::JsonParseError(format!("field '{}' of '{}': {}", field, node_type, e))
            })?;
            let kind: FieldKind = raw.kind.parse().map_err(|kind| SchemaError::UnknownKind {
                node_type: node_type.clone(),
                field: field.clone(),
                kind,
            })?;

            let spec = FieldSpec {
                kind,
                required: raw.required,
                default: raw.default.filter(|v| !v.is_null()),
                min: raw.min,
                description: raw.description,
            };
            schema = schema.with_field(field, spec);
        }
        schemas.push((node_type, schema));
    }
    Ok(schemas)
}
