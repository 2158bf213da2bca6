use thiserror::Error;

/// Errors that can occur while building or loading a schema registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to parse schema JSON: {0}")]
    JsonParseError(String),

    #[error("Field '{field}' of node type '{node_type}' has an unknown kind: '{kind}'")]
    UnknownKind {
        node_type: String,
        field: String,
        kind: String,
    },

    #[error("Node type '{0}' declares the reserved field 'Type'")]
    ReservedField(String),

    #[error("Node type '{node_type}' declares field '{field}' more than once")]
    DuplicateField { node_type: String, field: String },

    #[error("Node type '{0}' is already registered")]
    DuplicateType(String),
}

/// Errors raised by graph-wide operations on the node/edge store.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Cycle detected in graph; {unresolved} node(s) could not be ordered")]
    Cycle { unresolved: usize },

    #[error("Graph JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write export file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Transport-level failures when talking to the remote executor.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to '{url}' failed: {message}")]
    RequestFailed { url: String, message: String },

    #[error("Executor returned HTTP {status} for '{url}': {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from '{url}': {message}")]
    Decode { url: String, message: String },
}

/// Errors surfaced by the run controller.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("A run is already in progress (dag '{0}')")]
    AlreadyRunning(String),

    #[error("No run has been submitted")]
    NotSubmitted,

    #[error("Run '{0}' has not finished yet")]
    NotFinished(String),

    #[error("Node '{0}' has no Type and cannot be submitted")]
    Unconfigured(String),

    #[error("Graph cannot be submitted: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Errors raised by an editing session for malformed edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Please enter a metadata key")]
    EmptyKey,

    #[error("'{0}' is reserved; use change_type to set the node type")]
    ReservedKey(String),
}
