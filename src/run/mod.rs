//! Submitting a graph to the remote executor and tracking the run.
//!
//! The [`RunController`] moves through `Idle -> Submitting -> Polling ->
//! Terminal`. While polling, a background task fetches the run status on a
//! fixed interval and merges it into the shared [`GraphStore`]; observers
//! follow along through [`RunEvent`]s.
//!
//! ```rust,no_run
//! use eegflow::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), RunError> {
//! let graph = GraphStore::new().into_shared();
//! let executor = Arc::new(HttpExecutor::new("http://localhost:5000"));
//! let mut controller = RunController::new(executor, graph.clone());
//!
//! let dag_id = controller.submit().await?;
//! println!("submitted {}", dag_id);
//! if let Some(outcome) = controller.wait().await {
//!     println!("run ended: {:?}", outcome);
//!     println!("{}", controller.full_logs().await?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Responses of one run are applied in order because the poll task awaits
//! each request before its next tick. Responses that arrive for a
//! superseded or disposed run are dropped.

use crate::client::{Executor, RunRequest};
use crate::config::{ClientConfig, DEFAULT_POLL_INTERVAL};
use crate::error::RunError;
use crate::graph::{NodeStatus, SharedGraph};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

mod poller;
mod state;

use poller::PollTask;
pub use state::{Progress, RunOutcome, RunPhase, RunState, TickOutcome};

const EVENT_CAPACITY: usize = 64;

/// Notifications published by a [`RunController`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Submitted { dag_id: String },
    SubmitFailed(String),
    Progress(Progress),
    PollFailed(String),
    Finished(RunOutcome),
    /// Emitted exactly once per run, when polling ends for any reason.
    PollingStopped { dag_id: String },
}

pub(crate) fn lock_state(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one run at a time against an [`Executor`].
pub struct RunController<E: Executor + 'static> {
    executor: Arc<E>,
    graph: SharedGraph,
    state: Arc<Mutex<RunState>>,
    events: broadcast::Sender<RunEvent>,
    poll_interval: Duration,
    poll_task: Option<JoinHandle<()>>,
}

impl<E: Executor + 'static> RunController<E> {
    pub fn new(executor: Arc<E>, graph: SharedGraph) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            executor,
            graph,
            state: Arc::new(Mutex::new(RunState::default())),
            events,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_task: None,
        }
    }

    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.poll_interval = config.poll_interval;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// A copy of the current run state.
    pub fn state(&self) -> RunState {
        lock_state(&self.state).clone()
    }

    pub fn phase(&self) -> RunPhase {
        lock_state(&self.state).phase()
    }

    pub fn dag_id(&self) -> Option<String> {
        lock_state(&self.state).dag_id().map(str::to_string)
    }

    pub fn progress(&self) -> Progress {
        Progress::from_nodes(self.graph.lock().nodes())
    }

    fn publish(&self, event: RunEvent) {
        let _ = self.events.send(event);
    }

    /// Submits the current graph and starts polling.
    ///
    /// On any failure the controller keeps its previous phase and run, and
    /// the graph is left untouched.
    pub async fn submit(&mut self) -> Result<String, RunError> {
        let generation = lock_state(&self.state).begin_submit()?;
        if let Some(previous) = self.poll_task.take() {
            previous.abort();
        }

        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                lock_state(&self.state).submit_failed(generation);
                return Err(e);
            }
        };

        let dag_id = match self.executor.submit_run(&request).await {
            Ok(dag_id) => dag_id,
            Err(e) => {
                warn!(error = %e, "run submission failed");
                lock_state(&self.state).submit_failed(generation);
                self.publish(RunEvent::SubmitFailed(e.to_string()));
                return Err(e.into());
            }
        };

        if !lock_state(&self.state).start_polling(generation, dag_id.clone()) {
            // Disposed while the request was in flight.
            return Ok(dag_id);
        }
        info!(dag = %dag_id, nodes = request.nodes.len(), "run submitted");
        self.publish(RunEvent::Submitted {
            dag_id: dag_id.clone(),
        });

        let task = PollTask {
            executor: Arc::clone(&self.executor),
            graph: self.graph.clone(),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            dag_id: dag_id.clone(),
            generation,
            period: self.poll_interval,
        };
        self.poll_task = Some(tokio::spawn(task.run()));
        Ok(dag_id)
    }

    fn build_request(&self) -> Result<RunRequest, RunError> {
        let graph = self.graph.lock();
        graph.topological_order()?;
        RunRequest::from_snapshot(&graph.snapshot())
    }

    /// Waits for the poll task to end and returns the terminal outcome, if
    /// one was reached.
    pub async fn wait(&mut self) -> Option<RunOutcome> {
        if let Some(task) = self.poll_task.take() {
            let _ = task.await;
        }
        match self.phase() {
            RunPhase::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Fetches the log of a failed node. Nodes in any other status have no
    /// log to show and yield `None`. Logs are cached per run.
    pub async fn select_node(&self, node_id: &str) -> Result<Option<String>, RunError> {
        let status = self
            .graph
            .lock()
            .node(node_id)
            .and_then(|n| n.data.status());
        if status != Some(NodeStatus::Failed) {
            return Ok(None);
        }

        let (dag_id, generation) = {
            let state = lock_state(&self.state);
            if let Some(cached) = state.cached_node_log(node_id) {
                return Ok(Some(cached.to_string()));
            }
            let dag_id = state.dag_id().ok_or(RunError::NotSubmitted)?.to_string();
            (dag_id, state.generation())
        };

        let logs = self.executor.node_logs(&dag_id, node_id).await?;
        lock_state(&self.state).cache_node_log(generation, node_id, &logs);
        Ok(Some(logs))
    }

    /// Fetches the whole run transcript. Only available once the run is
    /// terminal.
    pub async fn full_logs(&self) -> Result<String, RunError> {
        let (dag_id, generation) = {
            let state = lock_state(&self.state);
            let dag_id = state.dag_id().ok_or(RunError::NotSubmitted)?.to_string();
            if !state.is_done() {
                return Err(RunError::NotFinished(dag_id));
            }
            if let Some(cached) = state.run_log() {
                return Ok(cached.to_string());
            }
            (dag_id, state.generation())
        };

        let logs = self.executor.run_logs(&dag_id).await?;
        lock_state(&self.state).cache_run_log(generation, &logs);
        Ok(logs)
    }

    /// Cancels polling and invalidates in-flight responses. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        let (was_polling, dag_id) = {
            let mut state = lock_state(&self.state);
            let dag_id = state.dag_id().unwrap_or_default().to_string();
            (state.dispose(), dag_id)
        };
        if was_polling {
            info!(dag = %dag_id, "polling cancelled");
            self.publish(RunEvent::PollingStopped { dag_id });
        }
    }
}

impl<E: Executor + 'static> Drop for RunController<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}
