//! # eegflow - EEG Pipeline Editing and Run Tracking
//!
//! **eegflow** is the engine behind a visual editor for EEG-processing
//! pipelines. Pipelines are directed graphs of processing steps ("nodes")
//! whose behaviour is configured through typed metadata. The crate owns
//! everything except the drawing itself: which node types exist and what
//! metadata they take, whether a node's metadata is acceptable, the graph
//! being edited, and the lifecycle of a run on the remote executor.
//!
//! ## Core Workflow
//!
//! 1.  **Describe node types**: A [`SchemaRegistry`](schema::SchemaRegistry) maps each node
//!     `Type` to its ordered fields. The built-in table covers input/output files,
//!     notch filtering and channel plotting; more types can be loaded from JSON.
//! 2.  **Edit nodes**: An [`EditingSession`](session::EditingSession) stages label and
//!     metadata changes, remembers drafts per type, and commits a validated, cleaned
//!     record into the [`GraphStore`](graph::GraphStore).
//! 3.  **Run**: A [`RunController`](run::RunController) submits the graph to an
//!     [`Executor`](client::Executor), polls its status until every node succeeded or
//!     one failed, and fetches logs.
//!
//! ## Quick Start
//!
//! ```rust
//! use eegflow::prelude::*;
//!
//! let mut graph = GraphStore::new();
//! let node = Node::pending("node-1", Position { x: 250.0, y: 150.0 });
//!
//! let mut session = EditingSession::begin(&node);
//! session.set_label("Remove line noise");
//! session.change_type("Notch Filter");
//!
//! // `frequency` is required and has no default.
//! let report = session.save(&mut graph).unwrap_err();
//! assert_eq!(report.errors, vec!["Missing required field: frequency"]);
//!
//! session.set_field("frequency", 50);
//! session.save(&mut graph).expect("metadata is valid");
//!
//! let saved = graph.node("node-1").unwrap();
//! assert_eq!(saved.data.node_type(), Some("Notch Filter"));
//! assert_eq!(saved.data.metadata["include eog"], true);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod run;
pub mod schema;
pub mod session;
pub mod validator;
