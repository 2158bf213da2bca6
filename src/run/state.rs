use crate::client::StatusMap;
use crate::error::RunError;
use crate::graph::{GraphStore, Node, NodeStatus};
use ahash::AHashMap;
use serde::Serialize;

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failed,
}

/// Where the controller is in the submit/poll lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Terminal(RunOutcome),
}

/// Aggregate completion of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// `round(100 * completed / total)`, or 0 for an empty graph.
    pub percent: u8,
}

impl Progress {
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let total = nodes.len();
        let completed = nodes
            .iter()
            .filter(|n| n.data.status() == Some(NodeStatus::Success))
            .count();
        let percent = if total == 0 {
            0
        } else {
            (100.0 * completed as f64 / total as f64).round() as u8
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Result of applying one status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue(Progress),
    Finished(RunOutcome, Progress),
    /// The response belongs to a superseded, finished or disposed run.
    Ignored,
}

/// Client-side record of the current run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    dag_id: Option<String>,
    phase: RunPhase,
    generation: u64,
    statuses: AHashMap<String, NodeStatus>,
    node_logs: AHashMap<String, String>,
    run_log: Option<String>,
    polling: bool,
    /// Phase to fall back to if a submission is rejected.
    resume_phase: RunPhase,
}

impl RunState {
    pub fn dag_id(&self) -> Option<&str> {
        self.dag_id.as_deref()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// True once the run reached either terminal outcome.
    pub fn is_done(&self) -> bool {
        matches!(self.phase, RunPhase::Terminal(_))
    }

    pub fn is_failed(&self) -> bool {
        self.phase == RunPhase::Terminal(RunOutcome::Failed)
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn node_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.statuses.get(node_id).copied()
    }

    pub fn statuses(&self) -> &AHashMap<String, NodeStatus> {
        &self.statuses
    }

    pub fn cached_node_log(&self, node_id: &str) -> Option<&str> {
        self.node_logs.get(node_id).map(String::as_str)
    }

    pub fn run_log(&self) -> Option<&str> {
        self.run_log.as_deref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Moves to `Submitting` and returns the new run generation. The previous
    /// run stays readable until the executor accepts the new one.
    pub(crate) fn begin_submit(&mut self) -> Result<u64, RunError> {
        if matches!(self.phase, RunPhase::Submitting | RunPhase::Polling) {
            return Err(RunError::AlreadyRunning(
                self.dag_id.clone().unwrap_or_default(),
            ));
        }
        self.generation += 1;
        self.resume_phase = self.phase;
        self.phase = RunPhase::Submitting;
        Ok(self.generation)
    }

    /// Puts back the phase the controller had before a rejected submission.
    pub(crate) fn submit_failed(&mut self, generation: u64) {
        if generation == self.generation && self.phase == RunPhase::Submitting {
            self.phase = self.resume_phase;
        }
    }

    /// Records the accepted run, discarding everything kept from the
    /// previous one.
    pub(crate) fn start_polling(&mut self, generation: u64, dag_id: String) -> bool {
        if generation != self.generation || self.phase != RunPhase::Submitting {
            return false;
        }
        self.dag_id = Some(dag_id);
        self.statuses.clear();
        self.node_logs.clear();
        self.run_log = None;
        self.phase = RunPhase::Polling;
        self.polling = true;
        true
    }

    /// Merges a status response into `graph` and decides whether the run is
    /// over: every node succeeded, or any node failed.
    pub fn apply_status(
        &mut self,
        generation: u64,
        response: &StatusMap,
        graph: &mut GraphStore,
    ) -> TickOutcome {
        if generation != self.generation || self.phase != RunPhase::Polling {
            return TickOutcome::Ignored;
        }

        graph.merge_statuses(response);
        self.statuses = graph
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), response.get(&n.id).copied().unwrap_or_default()))
            .collect();

        let progress = Progress::from_nodes(graph.nodes());
        let any_failed = response.values().any(|s| *s == NodeStatus::Failed);
        let all_success = self.statuses.values().all(|s| *s == NodeStatus::Success);

        let outcome = if any_failed {
            RunOutcome::Failed
        } else if all_success {
            RunOutcome::Success
        } else {
            return TickOutcome::Continue(progress);
        };
        self.phase = RunPhase::Terminal(outcome);
        TickOutcome::Finished(outcome, progress)
    }

    /// Clears the polling flag. Returns `true` only for the call that
    /// actually stopped polling.
    pub(crate) fn stop_polling(&mut self) -> bool {
        std::mem::replace(&mut self.polling, false)
    }

    /// Invalidates in-flight responses. Returns whether polling was active.
    pub(crate) fn dispose(&mut self) -> bool {
        self.generation += 1;
        match self.phase {
            RunPhase::Submitting => self.phase = self.resume_phase,
            RunPhase::Polling => self.phase = RunPhase::Idle,
            _ => {}
        }
        self.stop_polling()
    }

    pub(crate) fn cache_node_log(&mut self, generation: u64, node_id: &str, logs: &str) {
        if generation == self.generation {
            self.node_logs.insert(node_id.to_string(), logs.to_string());
        }
    }

    pub(crate) fn cache_run_log(&mut self, generation: u64, logs: &str) {
        if generation == self.generation {
            self.run_log = Some(logs.to_string());
        }
    }
}
