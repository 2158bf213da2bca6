//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the eegflow crate.
//!
//! # Example
//!
//! ```rust
//! use eegflow::prelude::*;
//!
//! let mut metadata = Metadata::new();
//! metadata.insert("title".into(), "Raw EEG".into());
//! metadata.insert("n_channels".into(), 0.into());
//! metadata.insert("block".into(), true.into());
//!
//! let report = validate("Plot Channels", &metadata);
//! assert!(!report.valid);
//! assert_eq!(report.errors, vec!["n_channels must be >= 1"]);
//! ```

// Schemas and validation
pub use crate::schema::{FieldKind, FieldSpec, NodeSchema, SchemaRegistry, TYPE_KEY};
pub use crate::validator::{ValidationReport, Validator, validate};

// Graph
pub use crate::graph::{
    Edge, GraphEvent, GraphSnapshot, GraphStore, Metadata, Node, NodeData, NodeStatus, Position,
    SharedGraph,
};

// Editing
pub use crate::session::EditingSession;

// Running
pub use crate::client::{Executor, FileEntry, HttpExecutor, RunRequest, StatusMap};
pub use crate::config::ClientConfig;
pub use crate::run::{Progress, RunController, RunEvent, RunOutcome, RunPhase, RunState};

// Error types
pub use crate::error::{ClientError, GraphError, RunError, SchemaError, SessionError};
