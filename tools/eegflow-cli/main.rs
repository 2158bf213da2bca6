use clap::{Parser, Subcommand};
use eegflow::prelude::*;
use itertools::Itertools;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;

/// Validate and run EEG processing pipelines against a remote executor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the executor API (defaults to $EEGFLOW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Status poll interval in milliseconds (defaults to $EEGFLOW_POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    poll_ms: Option<u64>,

    /// Extra node schemas to load, as JSON
    #[arg(long, global = true)]
    schemas: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known node types and their fields
    Types,
    /// Validate every node of an exported graph
    Validate { graph: PathBuf },
    /// Check that the executor is reachable
    Ping,
    /// List files the executor can read
    Files,
    /// Submit an exported graph and follow the run to completion
    Run { graph: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url.clone() {
        config = config.with_base_url(url);
    }
    if let Some(ms) = cli.poll_ms.filter(|ms| *ms > 0) {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }

    let registry = load_registry(cli.schemas.as_ref());

    match cli.command {
        Command::Types => print_types(&registry),
        Command::Validate { graph } => {
            let store = load_graph(&graph);
            if !validate_graph(&registry, &store) {
                std::process::exit(1);
            }
        }
        Command::Ping => {
            let executor = HttpExecutor::from_config(&config);
            match executor.ping().await {
                Ok(body) => println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default()),
                Err(e) => exit_with_error(&format!("Ping failed: {}", e)),
            }
        }
        Command::Files => {
            let executor = HttpExecutor::from_config(&config);
            match executor.list_files().await {
                Ok(files) => {
                    for file in files {
                        println!("{:<30} {}", file.name, file.path);
                    }
                }
                Err(e) => exit_with_error(&format!("Could not list files: {}", e)),
            }
        }
        Command::Run { graph } => {
            let store = load_graph(&graph);
            if !validate_graph(&registry, &store) {
                exit_with_error("Refusing to submit a graph with invalid nodes.");
            }
            run_graph(store, &config).await;
        }
    }
}

fn load_registry(path: Option<&PathBuf>) -> SchemaRegistry {
    let registry = SchemaRegistry::builtin().clone();
    let Some(path) = path else {
        return registry;
    };
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read schema file '{}': {}",
            path.display(),
            e
        ))
    });
    registry
        .extend_from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid schema file: {}", e)))
}

fn load_graph(path: &PathBuf) -> GraphStore {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read graph file '{}': {}",
            path.display(),
            e
        ))
    });
    GraphStore::import_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse graph: {}", e)))
}

fn print_types(registry: &SchemaRegistry) {
    for node_type in registry.list_types() {
        println!("{}", node_type);
        for (name, spec) in registry.get_schema(node_type).fields() {
            let mut notes = vec![spec.kind.to_string()];
            if spec.required {
                notes.push("required".to_string());
            }
            if let Some(default) = &spec.default {
                notes.push(format!("default {}", default));
            }
            if let Some(min) = spec.min {
                notes.push(format!("min {}", min));
            }
            println!("  {:<14} [{}] {}", name, notes.iter().join(", "), spec.description);
        }
    }
}

/// Prints one line per node and returns whether all nodes are valid.
fn validate_graph(registry: &SchemaRegistry, store: &GraphStore) -> bool {
    let validator = Validator::new(registry);
    let mut all_valid = true;
    for node in store.nodes() {
        let Some(node_type) = node.data.node_type() else {
            println!("  ✗ {} has no Type", node.id);
            all_valid = false;
            continue;
        };
        let report = validator.validate(node_type, &node.data.metadata);
        if report.valid {
            println!("  ✓ {} ({})", node.id, node_type);
        } else {
            println!("  ✗ {} ({}): {}", node.id, node_type, report);
            all_valid = false;
        }
    }
    all_valid
}

async fn run_graph(store: GraphStore, config: &ClientConfig) {
    let started = Instant::now();
    let graph = store.into_shared();
    let executor = Arc::new(HttpExecutor::from_config(config));
    let mut controller = RunController::new(executor, graph.clone()).with_config(config);
    let mut events = controller.subscribe();

    let dag_id = controller
        .submit()
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Run submission failed: {}", e)));
    println!("Submitted run {} to {}", dag_id, config.base_url);

    loop {
        match events.recv().await {
            Ok(RunEvent::Progress(p)) => {
                println!("  {:>3}% ({}/{} nodes)", p.percent, p.completed, p.total)
            }
            Ok(RunEvent::PollFailed(message)) => println!("  poll failed: {}", message),
            Ok(RunEvent::PollingStopped { .. }) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }

    let outcome = controller.wait().await;
    println!("\nRun finished: {:?} in {:?}", outcome, started.elapsed());

    let failed: Vec<String> = graph
        .lock()
        .nodes()
        .iter()
        .filter(|n| n.data.status() == Some(NodeStatus::Failed))
        .map(|n| n.id.clone())
        .collect();
    for node_id in failed {
        match controller.select_node(&node_id).await {
            Ok(Some(logs)) => println!("\n--- {} (failed) ---\n{}", node_id, logs),
            Ok(None) => {}
            Err(e) => println!("\nCould not fetch logs for {}: {}", node_id, e),
        }
    }

    match controller.full_logs().await {
        Ok(logs) => println!("\n--- Run log ---\n{}", logs),
        Err(e) => println!("\nCould not fetch run log: {}", e),
    }

    if outcome != Some(RunOutcome::Success) {
        std::process::exit(1);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
