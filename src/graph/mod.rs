//! In-memory node/edge store for the pipeline being edited.
//!
//! The store is the single owner of the graph. Both user edits and the run
//! poller mutate it; every mutation is published as a [`GraphEvent`] on a
//! broadcast channel so that any rendering layer can follow along.

use crate::error::GraphError;
use crate::schema::TYPE_KEY;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

mod order;
mod status;

pub use status::{NO_STATUS_COLOUR, NodeStatus};

/// Free-form metadata attached to a node. Insertion order is preserved.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key the poller writes each node's run status into.
pub const STATUS_KEY: &str = "status";

/// File name used when exporting the graph.
pub const EXPORT_FILE_NAME: &str = "dag_export.json";

const EVENT_CAPACITY: usize = 64;

/// Canvas coordinates. Owned by the canvas; carried through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Display label and metadata of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NodeData {
    pub fn new(label: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            label: label.into(),
            metadata,
        }
    }

    /// The node's `Type`, if one has been chosen.
    pub fn node_type(&self) -> Option<&str> {
        self.metadata
            .get(TYPE_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }

    /// The last status merged in by the run poller.
    pub fn status(&self) -> Option<NodeStatus> {
        self.metadata
            .get(STATUS_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn with_metadata(&self, metadata: Metadata) -> Self {
        Self {
            label: self.label.clone(),
            metadata,
        }
    }

    /// Copy with a single metadata key set; every other key is kept.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut metadata = self.metadata.clone();
        metadata.insert(key.into(), value.into());
        self.with_metadata(metadata)
    }

    pub fn with_status(&self, status: NodeStatus) -> Self {
        self.with_field(STATUS_KEY, status.as_str())
    }
}

/// A processing step on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// A freshly placed node with no label and no metadata.
    pub fn pending(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            data: NodeData::default(),
        }
    }

    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }

    /// Whether a `Type` has been chosen for this node.
    pub fn is_configured(&self) -> bool {
        self.data.node_type().is_some()
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// An owned copy of the graph, used for export and run submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Change notifications published by [`GraphStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded(String),
    NodeUpdated(String),
    NodeRemoved { id: String, edges_removed: usize },
    EdgeAdded(Edge),
    EdgesRemoved(usize),
    StatusesMerged(usize),
}

/// Mutable collection of nodes and edges.
#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    events: broadcast::Sender<GraphEvent>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            events,
        }
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut store = Self::new();
        store.nodes = snapshot.nodes;
        store.edges = snapshot.edges;
        store
    }

    /// Loads a graph previously written by [`export_json`](Self::export_json).
    pub fn import_json(json: &str) -> Result<Self, GraphError> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Registers a new observer. Events published before this call are not
    /// replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: GraphEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Inserts a node. Id uniqueness is the caller's responsibility.
    pub fn add_node(&mut self, node: Node) {
        let id = node.id.clone();
        self.nodes.push(node);
        self.publish(GraphEvent::NodeAdded(id));
    }

    /// Replaces a node's data wholesale. Returns `false` if no such node.
    pub fn update_node(&mut self, id: &str, data: NodeData) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.data = data;
        self.publish(GraphEvent::NodeUpdated(id.to_string()));
        true
    }

    /// Removes a node and every edge that touches it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        self.publish(GraphEvent::NodeRemoved {
            id: id.to_string(),
            edges_removed: before - self.edges.len(),
        });
        Some(node)
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge.clone());
        self.publish(GraphEvent::EdgeAdded(edge));
    }

    /// Removes every edge matching `predicate` and returns how many went.
    pub fn remove_edges_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Edge) -> bool,
    {
        let before = self.edges.len();
        self.edges.retain(|e| !predicate(e));
        let removed = before - self.edges.len();
        if removed > 0 {
            self.publish(GraphEvent::EdgesRemoved(removed));
        }
        removed
    }

    /// Removes all `source -> target` edges.
    pub fn remove_edge(&mut self, source: &str, target: &str) -> usize {
        self.remove_edges_where(|e| e.source == source && e.target == target)
    }

    /// Writes each node's status into `metadata.status`, keeping every other
    /// metadata key. Nodes missing from `statuses` become `pending`.
    pub fn merge_statuses(&mut self, statuses: &AHashMap<String, NodeStatus>) {
        for node in &mut self.nodes {
            let status = statuses.get(&node.id).copied().unwrap_or_default();
            node.data = node.data.with_status(status);
        }
        self.publish(GraphEvent::StatusesMerged(self.nodes.len()));
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Nodes in dependency order, or [`GraphError::Cycle`].
    pub fn topological_order(&self) -> Result<Vec<&Node>, GraphError> {
        order::topological_order(&self.nodes, &self.edges)
    }

    /// Pretty-printed `{nodes, edges}` document.
    pub fn export_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Writes [`EXPORT_FILE_NAME`] into `dir` and returns its path.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, GraphError> {
        let path = dir.as_ref().join(EXPORT_FILE_NAME);
        let json = self.export_json()?;
        std::fs::write(&path, json).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }

    pub fn into_shared(self) -> SharedGraph {
        SharedGraph(Arc::new(Mutex::new(self)))
    }
}

/// A [`GraphStore`] shared between the editor and the run poller.
///
/// Locks are only ever held for the duration of a synchronous mutation,
/// never across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph(Arc<Mutex<GraphStore>>);

impl SharedGraph {
    pub fn new(store: GraphStore) -> Self {
        store.into_shared()
    }

    pub fn lock(&self) -> MutexGuard<'_, GraphStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
