use super::{RunEvent, RunState, TickOutcome, lock_state};
use crate::client::Executor;
use crate::graph::SharedGraph;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Everything the poll task needs, detached from the controller.
pub(super) struct PollTask<E> {
    pub(super) executor: Arc<E>,
    pub(super) graph: SharedGraph,
    pub(super) state: Arc<Mutex<RunState>>,
    pub(super) events: broadcast::Sender<RunEvent>,
    pub(super) dag_id: String,
    pub(super) generation: u64,
    pub(super) period: Duration,
}

impl<E: Executor> PollTask<E> {
    /// Polls `GET /status/{dag_id}` once per period until the run finishes
    /// or this task's generation is superseded. A tick awaits its request
    /// before the next tick fires, so responses are applied in order.
    pub(super) async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let response = match self.executor.run_status(&self.dag_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(dag = %self.dag_id, error = %e, "status poll failed");
                    self.publish(RunEvent::PollFailed(e.to_string()));
                    continue;
                }
            };

            let outcome = {
                let mut state = lock_state(&self.state);
                let mut graph = self.graph.lock();
                state.apply_status(self.generation, &response, &mut graph)
            };

            match outcome {
                TickOutcome::Continue(progress) => {
                    debug!(dag = %self.dag_id, percent = progress.percent, "run in progress");
                    self.publish(RunEvent::Progress(progress));
                }
                TickOutcome::Finished(outcome, progress) => {
                    info!(dag = %self.dag_id, ?outcome, percent = progress.percent, "run finished");
                    self.publish(RunEvent::Progress(progress));
                    self.publish(RunEvent::Finished(outcome));
                    if lock_state(&self.state).stop_polling() {
                        self.publish(RunEvent::PollingStopped {
                            dag_id: self.dag_id.clone(),
                        });
                    }
                    return;
                }
                TickOutcome::Ignored => {
                    debug!(dag = %self.dag_id, "dropping status for superseded run");
                    return;
                }
            }
        }
    }

    fn publish(&self, event: RunEvent) {
        let _ = self.events.send(event);
    }
}
