//! Staged editing of one node's label and metadata.
//!
//! An [`EditingSession`] lives for as long as the metadata editor is open.
//! Nothing reaches the [`GraphStore`] until [`EditingSession::save`]
//! validates the draft and commits a cleaned record.

use crate::error::SessionError;
use crate::graph::{GraphStore, Metadata, Node, NodeData};
use crate::schema::{NodeSchema, SchemaRegistry, TYPE_KEY};
use crate::validator::{ValidationReport, Validator};
use ahash::AHashMap;
use serde_json::Value;
use tracing::debug;

/// Transient editor state for a single node.
#[derive(Debug, Clone)]
pub struct EditingSession<'r> {
    registry: &'r SchemaRegistry,
    node: Node,
    working_type: Option<String>,
    working_label: String,
    working_metadata: Metadata,
    /// Last saved or entered metadata per node type, for this session only.
    type_history: AHashMap<String, Metadata>,
}

impl EditingSession<'static> {
    /// Opens a session against the built-in schemas.
    pub fn begin(node: &Node) -> Self {
        Self::begin_with(SchemaRegistry::builtin(), node)
    }
}

impl<'r> EditingSession<'r> {
    /// Opens a session for `node`. A configured node seeds the draft and the
    /// history of its own type; a pending node starts empty.
    pub fn begin_with(registry: &'r SchemaRegistry, node: &Node) -> Self {
        let mut type_history = AHashMap::new();
        let working_type = node.data.node_type().map(str::to_string);
        let working_metadata = match &working_type {
            Some(node_type) => {
                type_history.insert(node_type.clone(), node.data.metadata.clone());
                node.data.metadata.clone()
            }
            None => Metadata::new(),
        };

        Self {
            registry,
            node: node.clone(),
            working_type,
            working_label: node.data.label.clone(),
            working_metadata,
            type_history,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node.id
    }

    pub fn working_type(&self) -> Option<&str> {
        self.working_type.as_deref()
    }

    pub fn working_label(&self) -> &str {
        &self.working_label
    }

    pub fn working_metadata(&self) -> &Metadata {
        &self.working_metadata
    }

    /// Schema of the currently selected type (empty when none is selected).
    pub fn schema(&self) -> &'r NodeSchema {
        self.registry
            .get_schema(self.working_type.as_deref().unwrap_or_default())
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.working_label = label.into();
    }

    /// Stages a field value. No validation happens until [`save`](Self::save).
    /// Setting `Type` through here switches type like [`change_type`](Self::change_type).
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if key == TYPE_KEY {
            if let Some(node_type) = value.as_str() {
                self.change_type(node_type);
            }
            return;
        }
        self.working_metadata.insert(key, value);
    }

    /// Adds a free-form key that no schema declares.
    pub fn add_custom_field(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), SessionError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SessionError::EmptyKey);
        }
        if key == TYPE_KEY {
            return Err(SessionError::ReservedKey(key.to_string()));
        }
        self.working_metadata.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        if key == TYPE_KEY {
            return None;
        }
        self.working_metadata.shift_remove(key)
    }

    /// Switches the draft to `new_type`.
    ///
    /// The draft for the type being left is remembered. The new draft holds
    /// exactly the fields `new_type` declares, each resolved from that type's
    /// history, then the field default, then `""`.
    pub fn change_type(&mut self, new_type: &str) {
        if let Some(old_type) = self.working_type.take() {
            self.type_history
                .insert(old_type, self.working_metadata.clone());
        }

        let history = self.type_history.get(new_type);
        let mut metadata = Metadata::new();
        for (field, spec) in self.registry.get_schema(new_type).fields() {
            let value = history
                .and_then(|h| h.get(field))
                .cloned()
                .or_else(|| spec.default.clone())
                .unwrap_or_else(|| Value::String(String::new()));
            metadata.insert(field.to_string(), value);
        }
        metadata.insert(TYPE_KEY.to_string(), Value::String(new_type.to_string()));

        debug!(node = %self.node.id, node_type = new_type, "switched node type");
        self.type_history
            .insert(new_type.to_string(), metadata.clone());
        self.working_metadata = metadata;
        self.working_type = Some(new_type.to_string());
    }

    /// Validates the draft and, if it passes, commits a cleaned record to
    /// `store`: inserted if the node is still pending, replaced otherwise.
    ///
    /// The cleaned record keeps `Type`, the fields of the working type, and
    /// custom keys no schema declares. Fields that belong only to other
    /// types are dropped.
    pub fn save(&mut self, store: &mut GraphStore) -> Result<NodeData, ValidationReport> {
        let Some(node_type) = self.working_type.clone() else {
            return Err(ValidationReport {
                valid: false,
                errors: vec![format!("Missing required field: {}", TYPE_KEY)],
            });
        };

        let mut candidate = self.working_metadata.clone();
        candidate.insert(TYPE_KEY.to_string(), Value::String(node_type.clone()));

        let report = Validator::new(self.registry).validate(&node_type, &candidate);
        if !report.is_valid() {
            return Err(report);
        }

        let schema = self.registry.get_schema(&node_type);
        candidate.retain(|key, _| {
            key == TYPE_KEY || schema.contains(key) || !self.registry.declares_field(key)
        });

        let data = NodeData::new(self.working_label.clone(), candidate.clone());
        if !store.update_node(&self.node.id, data.clone()) {
            store.add_node(self.node.clone().with_data(data.clone()));
        }
        debug!(node = %self.node.id, node_type = %node_type, "committed node metadata");

        self.node.data = data.clone();
        self.type_history.insert(node_type, candidate.clone());
        self.working_metadata = candidate;
        Ok(data)
    }

    /// Deletes the edited node (and its edges) from `store`, ending the session.
    pub fn remove_node(self, store: &mut GraphStore) -> Option<Node> {
        store.remove_node(&self.node.id)
    }
}
