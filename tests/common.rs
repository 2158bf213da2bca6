//! Common test utilities for building graphs, metadata and scripted executors.
use async_trait::async_trait;
use eegflow::prelude::*;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds a metadata map from a JSON object literal.
#[allow(dead_code)]
pub fn metadata(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// A configured node of the given type.
#[allow(dead_code)]
pub fn configured_node(id: &str, label: &str, fields: Value) -> Node {
    Node::pending(id, Position::default()).with_data(NodeData::new(label, metadata(fields)))
}

/// A valid three-step pipeline: input -> notch -> output.
///
/// Edges: `input -> notch`, `notch -> output`.
#[allow(dead_code)]
pub fn create_linear_pipeline() -> GraphStore {
    let mut graph = GraphStore::new();
    graph.add_node(configured_node(
        "input",
        "Raw recording",
        json!({"Type": "Input File", "file": "/shared_files/subject1.edf"}),
    ));
    graph.add_node(configured_node(
        "notch",
        "Line noise",
        json!({"Type": "Notch Filter", "frequency": 50, "include eog": true}),
    ));
    graph.add_node(configured_node(
        "output",
        "Clean recording",
        json!({"Type": "Output File", "path": "clean_subject1.edf"}),
    ));
    graph.add_edge(Edge::new("input", "notch"));
    graph.add_edge(Edge::new("notch", "output"));
    graph
}

/// Builds a status response from `(node_id, status)` pairs.
#[allow(dead_code)]
pub fn statuses(pairs: &[(&str, NodeStatus)]) -> StatusMap {
    pairs
        .iter()
        .map(|(id, status)| (id.to_string(), *status))
        .collect()
}

/// An executor that replays canned status responses in order, repeating the
/// last one once the script runs out.
#[allow(dead_code)]
pub struct ScriptedExecutor {
    dag_id: String,
    fail_submit: bool,
    script: Mutex<VecDeque<StatusMap>>,
    last: Mutex<StatusMap>,
    submitted: Mutex<Option<RunRequest>>,
    pub status_calls: AtomicUsize,
    pub node_log_calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn new(dag_id: &str, script: Vec<StatusMap>) -> Self {
        Self {
            dag_id: dag_id.to_string(),
            fail_submit: false,
            script: Mutex::new(script.into()),
            last: Mutex::new(StatusMap::new()),
            submitted: Mutex::new(None),
            status_calls: AtomicUsize::new(0),
            node_log_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_submit() -> Self {
        let mut executor = Self::new("unused", Vec::new());
        executor.fail_submit = true;
        executor
    }

    pub fn submitted(&self) -> Option<RunRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn ping(&self) -> Result<Value, ClientError> {
        Ok(json!({"message": "pong"}))
    }

    async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError> {
        Ok(Vec::new())
    }

    async fn submit_run(&self, request: &RunRequest) -> Result<String, ClientError> {
        if self.fail_submit {
            return Err(ClientError::Status {
                url: "/run".to_string(),
                status: 500,
                body: "executor unavailable".to_string(),
            });
        }
        *self.submitted.lock().unwrap() = Some(request.clone());
        Ok(self.dag_id.clone())
    }

    async fn run_status(&self, _dag_id: &str) -> Result<StatusMap, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }

    async fn node_logs(&self, dag_id: &str, node_id: &str) -> Result<String, ClientError> {
        self.node_log_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}/{}: notch filter crashed", dag_id, node_id))
    }

    async fn run_logs(&self, dag_id: &str) -> Result<String, ClientError> {
        Ok(format!("transcript of {}", dag_id))
    }
}
