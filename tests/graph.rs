//! Tests for the node/edge store, its events and export.
mod common;
use common::*;
use eegflow::error::GraphError;
use eegflow::graph::{EXPORT_FILE_NAME, NO_STATUS_COLOUR};
use eegflow::prelude::*;
use serde_json::json;

#[test]
fn test_remove_node_leaves_no_orphan_edges() {
    let mut graph = create_linear_pipeline();
    graph.add_edge(Edge::new("input", "output"));
    graph.add_edge(Edge::new("notch", "notch"));

    let removed = graph.remove_node("notch").expect("node exists");
    assert_eq!(removed.id, "notch");
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edges(), &[Edge::new("input", "output")]);
    assert!(graph.edges().iter().all(|e| !e.touches("notch")));
}

#[test]
fn test_absent_ids_are_noops() {
    let mut graph = create_linear_pipeline();
    assert!(!graph.update_node("missing", NodeData::default()));
    assert!(graph.remove_node("missing").is_none());
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.edges().len(), 2);
}

#[test]
fn test_update_replaces_data_wholesale() {
    let mut graph = create_linear_pipeline();
    let data = NodeData::new("Renamed", metadata(json!({"Type": "Output File", "path": "x.fif"})));
    assert!(graph.update_node("output", data.clone()));
    assert_eq!(graph.node("output").unwrap().data, data);
}

#[test]
fn test_remove_edges_matching() {
    let mut graph = create_linear_pipeline();
    graph.add_edge(Edge::new("input", "notch"));
    assert_eq!(graph.remove_edge("input", "notch"), 2);
    assert_eq!(graph.remove_edges_where(|e| e.target == "nowhere"), 0);
    assert_eq!(graph.edges(), &[Edge::new("notch", "output")]);
}

#[test]
fn test_status_merge_keeps_user_metadata() {
    let mut graph = create_linear_pipeline();
    graph.merge_statuses(&statuses(&[("input", NodeStatus::Success)]));

    let input = graph.node("input").unwrap();
    assert_eq!(input.data.status(), Some(NodeStatus::Success));
    assert_eq!(input.data.metadata["file"], json!("/shared_files/subject1.edf"));
    assert_eq!(input.data.label, "Raw recording");
    assert_eq!(
        graph.node("output").unwrap().data.status(),
        Some(NodeStatus::Pending)
    );
}

#[test]
fn test_events_are_published() {
    let mut graph = GraphStore::new();
    let mut events = graph.subscribe();

    graph.add_node(Node::pending("a", Position::default()));
    graph.add_node(Node::pending("b", Position::default()));
    graph.add_edge(Edge::new("a", "b"));
    graph.remove_node("a");

    assert_eq!(events.try_recv().unwrap(), GraphEvent::NodeAdded("a".to_string()));
    assert_eq!(events.try_recv().unwrap(), GraphEvent::NodeAdded("b".to_string()));
    assert_eq!(events.try_recv().unwrap(), GraphEvent::EdgeAdded(Edge::new("a", "b")));
    assert_eq!(
        events.try_recv().unwrap(),
        GraphEvent::NodeRemoved {
            id: "a".to_string(),
            edges_removed: 1
        }
    );
    assert!(events.try_recv().is_err());
}

#[test]
fn test_topological_order() {
    let mut graph = GraphStore::new();
    graph.add_node(configured_node("output", "", json!({"Type": "Output File"})));
    graph.add_node(configured_node("input", "", json!({"Type": "Input File"})));
    graph.add_node(configured_node("notch", "", json!({"Type": "Notch Filter"})));
    graph.add_edge(Edge::new("input", "notch"));
    graph.add_edge(Edge::new("notch", "output"));

    let order: Vec<_> = graph
        .topological_order()
        .unwrap()
        .into_iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(order, vec!["input", "notch", "output"]);
}

#[test]
fn test_cycle_is_detected() {
    let mut graph = create_linear_pipeline();
    graph.add_edge(Edge::new("output", "input"));
    assert!(matches!(
        graph.topological_order(),
        Err(GraphError::Cycle { unresolved: 3 })
    ));
}

#[test]
fn test_export_and_import() {
    let graph = create_linear_pipeline();
    let dir = tempfile::tempdir().unwrap();

    let path = graph.export_to_dir(dir.path()).unwrap();
    assert!(path.ends_with(EXPORT_FILE_NAME));

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.contains("\n  \"nodes\": ["));
    let exported: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(exported["edges"][0], json!({"source": "input", "target": "notch"}));
    assert_eq!(exported["nodes"][1]["data"]["metadata"]["frequency"], json!(50));

    let restored = GraphStore::import_json(&json).unwrap();
    assert_eq!(restored.snapshot(), graph.snapshot());
}

#[test]
fn test_status_colours() {
    assert_eq!(NodeStatus::Success.colour(), "#d4edda");
    assert_eq!(NodeStatus::Failed.colour(), "#f8d7da");
    assert_eq!(NodeStatus::Running.colour(), "#fff3cd");
    assert_eq!(NodeStatus::Pending.colour(), "#d1ecf1");
    assert_eq!(NO_STATUS_COLOUR, "#ffffff");
    assert_eq!("running".parse::<NodeStatus>(), Ok(NodeStatus::Running));
    assert!("queued".parse::<NodeStatus>().is_err());
}
