//! The remote executor as seen from the editor.
//!
//! [`Executor`] is the seam between the run controller and the transport:
//! [`HttpExecutor`] talks to the real backend, tests substitute scripted
//! implementations.

use crate::error::{ClientError, RunError};
use crate::graph::{Edge, GraphSnapshot, Metadata, NodeStatus};
use ahash::AHashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod http;

pub use http::HttpExecutor;

/// Per-node statuses of one run.
pub type StatusMap = AHashMap<String, NodeStatus>;

/// A node as submitted to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub metadata: Metadata,
}

/// Body of `POST /run`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub nodes: Vec<RunNode>,
    pub edges: Vec<Edge>,
}

impl RunRequest {
    /// Serializes a snapshot. Every node must have a `Type`.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, RunError> {
        let nodes = snapshot
            .nodes
            .iter()
            .map(|node| {
                let node_type = node
                    .data
                    .node_type()
                    .ok_or_else(|| RunError::Unconfigured(node.id.clone()))?;
                Ok(RunNode {
                    id: node.id.clone(),
                    node_type: node_type.to_string(),
                    metadata: node.data.metadata.clone(),
                })
            })
            .collect::<Result<Vec<_>, RunError>>()?;

        Ok(Self {
            nodes,
            edges: snapshot.edges.clone(),
        })
    }
}

/// A file the executor can read, as listed by `GET /files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
}

impl From<(String, String)> for FileEntry {
    fn from((name, path): (String, String)) -> Self {
        Self { name, path }
    }
}

/// Operations offered by the remote pipeline executor.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Liveness check; the payload is opaque.
    async fn ping(&self) -> Result<Value, ClientError>;

    async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError>;

    /// Starts a run and returns its identifier.
    async fn submit_run(&self, request: &RunRequest) -> Result<String, ClientError>;

    async fn run_status(&self, dag_id: &str) -> Result<StatusMap, ClientError>;

    async fn node_logs(&self, dag_id: &str, node_id: &str) -> Result<String, ClientError>;

    async fn run_logs(&self, dag_id: &str) -> Result<String, ClientError>;
}
