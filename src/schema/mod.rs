//! Declarative node metadata schemas.
//!
//! A [`SchemaRegistry`] maps a node `Type` (e.g. `"Notch Filter"`) to a
//! [`NodeSchema`], the ordered list of metadata fields that type accepts.
//! Declaration order is significant: the validator reports errors in it and
//! the editing session rebuilds metadata in it.
//!
//! New node types are added by registering a schema, either in code or by
//! loading a JSON document shaped like the built-in table:
//!
//! ```rust
//! use eegflow::schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::builtin()
//!     .clone()
//!     .extend_from_json(r#"{
//!         "Bandpass Filter": {
//!             "low": { "type": "number", "required": true, "min": 0 },
//!             "high": { "type": "number", "required": true, "min": 0 }
//!         }
//!     }"#)
//!     .unwrap();
//!
//! assert!(registry.list_types().any(|t| t == "Bandpass Filter"));
//! ```

use crate::error::SchemaError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

mod builtin;
mod parsing;

pub use builtin::BUILTIN_TYPES;

/// Name of the metadata key that carries a node's type. It is injected by
/// the editor and never declared inside a schema.
pub const TYPE_KEY: &str = "Type";

static BUILTIN: LazyLock<SchemaRegistry> = LazyLock::new(|| {
    let mut registry = SchemaRegistry::empty();
    builtin::register_builtin_schemas(&mut registry);
    registry
});

static EMPTY_SCHEMA: NodeSchema = NodeSchema { fields: Vec::new() };

/// The value kind a metadata field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
        }
    }

    /// Human phrase used in type-mismatch messages (`"<field> must be <phrase>"`).
    pub fn requirement(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Integer => "a positive integer",
            FieldKind::Boolean => "true or false",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldKind::String),
            "number" => Ok(FieldKind::Number),
            "integer" => Ok(FieldKind::Integer),
            "boolean" => Ok(FieldKind::Boolean),
            other => Err(other.to_string()),
        }
    }
}

/// Describes one metadata field of a node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Inclusive numeric lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    pub description: String,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            min: None,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The ordered field table of a single node type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl NodeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Uniqueness is checked when the schema is registered.
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn check(&self, node_type: &str) -> Result<(), SchemaError> {
        let mut seen = AHashSet::new();
        for (name, _) in &self.fields {
            if name == TYPE_KEY {
                return Err(SchemaError::ReservedField(node_type.to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    node_type: node_type.to_string(),
                    field: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Process-wide lookup from node type to its [`NodeSchema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: Vec<(String, NodeSchema)>,
    index: AHashMap<String, usize>,
    declared_fields: AHashSet<String>,
}

impl SchemaRegistry {
    /// A registry with no node types at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in EEG processing table.
    pub fn builtin() -> &'static SchemaRegistry {
        &BUILTIN
    }

    /// Parses a registry from a JSON document. Types and fields keep the
    /// order in which they appear in the document.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::empty().extend_from_json(json)
    }

    /// Adds every node type found in `json` to this registry.
    pub fn extend_from_json(mut self, json: &str) -> Result<Self, SchemaError> {
        for (node_type, schema) in parsing::parse_schema_document(json)? {
            self.register(node_type, schema)?;
        }
        Ok(self)
    }

    pub fn with_type(
        mut self,
        node_type: impl Into<String>,
        schema: NodeSchema,
    ) -> Result<Self, SchemaError> {
        self.register(node_type, schema)?;
        Ok(self)
    }

    pub fn register(
        &mut self,
        node_type: impl Into<String>,
        schema: NodeSchema,
    ) -> Result<(), SchemaError> {
        let node_type = node_type.into();
        if self.index.contains_key(&node_type) {
            return Err(SchemaError::DuplicateType(node_type));
        }
        schema.check(&node_type)?;
        self.insert_unchecked(node_type, schema);
        Ok(())
    }

    fn insert_unchecked(&mut self, node_type: impl Into<String>, schema: NodeSchema) {
        let node_type = node_type.into();
        self.declared_fields
            .extend(schema.fields().map(|(name, _)| name.to_string()));
        self.index.insert(node_type.clone(), self.types.len());
        self.types.push((node_type, schema));
    }

    /// Looks up a node type's schema.
    pub fn schema(&self, node_type: &str) -> Option<&NodeSchema> {
        self.index.get(node_type).map(|&i| &self.types[i].1)
    }

    /// Like [`schema`](Self::schema), but an unknown type yields an empty
    /// schema ("no fields") rather than `None`.
    pub fn get_schema(&self, node_type: &str) -> &NodeSchema {
        self.schema(node_type).unwrap_or(&EMPTY_SCHEMA)
    }

    /// All known node types in declaration order.
    pub fn list_types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.index.contains_key(node_type)
    }

    /// Whether `field` is declared by any registered node type.
    pub fn declares_field(&self, field: &str) -> bool {
        self.declared_fields.contains(field)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
