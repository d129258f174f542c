//! Periodic pass dispatch with at most one pass in flight.
//!
//! The first pass starts immediately. After that a pass is dispatched once
//! the period since the previous dispatch has elapsed *and* the previous
//! pass has finished. A pass that overruns the period delays the next one;
//! missed periods are skipped, never queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use replica_core::EventLog;
use replica_sync::{Mirror, PassReport, SyncError};

/// Something that can run one blocking sync pass.
pub trait PassRunner: Send + Sync + 'static {
    fn run_pass(&self) -> Result<PassReport, SyncError>;
}

impl PassRunner for Mirror {
    fn run_pass(&self) -> Result<PassReport, SyncError> {
        Mirror::run_pass(self)
    }
}

/// How a dispatched pass ended.
#[derive(Debug)]
pub enum PassOutcome {
    Completed(PassReport),
    Failed(SyncError),
    /// The worker panicked or was aborted.
    Crashed(String),
}

/// State owned by the scheduler loop.
#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    pub last_dispatch: Option<Instant>,
    pub dispatched: u64,
    pub failed: u64,
}

pub struct Scheduler<R: PassRunner> {
    runner: Arc<R>,
    period: Duration,
    log: Arc<dyn EventLog>,
}

impl<R: PassRunner> Scheduler<R> {
    pub fn new(runner: Arc<R>, period: Duration, log: Arc<dyn EventLog>) -> Self {
        Self {
            runner,
            period,
            log,
        }
    }

    /// Dispatch passes until a shutdown signal arrives.
    ///
    /// A pass already running when shutdown is requested is allowed to
    /// finish; the final state is returned afterwards.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> ScheduleState {
        let mut state = ScheduleState::default();

        loop {
            let dispatched_at = Instant::now();
            state.last_dispatch = Some(dispatched_at);
            state.dispatched += 1;

            let runner = self.runner.clone();
            let mut worker = tokio::task::spawn_blocking(move || runner.run_pass());

            let mut stopping = false;
            let joined = loop {
                tokio::select! {
                    joined = &mut worker => break joined,
                    _ = shutdown.recv(), if !stopping => {
                        stopping = true;
                        self.log.debug("Shutdown requested; waiting for the running pass to finish.");
                    }
                }
            };

            let outcome = match joined {
                Ok(Ok(report)) => PassOutcome::Completed(report),
                Ok(Err(err)) => PassOutcome::Failed(err),
                Err(err) => PassOutcome::Crashed(err.to_string()),
            };
            self.record(&mut state, &outcome);

            if stopping {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep_until(dispatched_at + self.period) => {}
                _ = shutdown.recv() => break,
            }
        }

        state
    }

    fn record(&self, state: &mut ScheduleState, outcome: &PassOutcome) {
        match outcome {
            PassOutcome::Completed(report) => self.log.debug(&format!(
                "Synchronization pass completed: {} copied, {} unchanged, {} directories created, {} removed, {} warnings in {} ms.",
                report.files_copied,
                report.files_unchanged,
                report.dirs_created,
                report.dirs_removed + report.files_removed,
                report.warnings.len(),
                report.duration_ms,
            )),
            PassOutcome::Failed(err) => {
                state.failed += 1;
                self.log
                    .error(&format!("Synchronization pass failed: {err}"));
            }
            PassOutcome::Crashed(reason) => {
                state.failed += 1;
                self.log
                    .error(&format!("Synchronization pass crashed: {reason}"));
            }
        }
    }
}
