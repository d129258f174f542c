use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use replica_core::{EventLog, MirrorConfig, OsFs, TracingLog};
use replica_sync::{Mirror, PassReport};

use crate::error::{io_err, DaemonError};
use crate::scheduler::{ScheduleState, Scheduler};

/// Start the scheduler and block the current thread until it exits.
///
/// The tracing subscriber must already be installed; see
/// [`init_logging`](crate::init_logging).
pub fn start_blocking(config: &MirrorConfig) -> Result<ScheduleState, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config.clone()))
}

/// Run the scheduler against the real filesystem until ctrl-c.
pub async fn run(config: MirrorConfig) -> Result<ScheduleState, DaemonError> {
    let stop = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| io_err("ctrl-c handler", e))?;
        tracing::info!("received ctrl-c, stopping after the current pass");
        Ok::<(), DaemonError>(())
    };
    run_until(config, Arc::new(TracingLog), stop).await
}

/// Run the scheduler until `stop` resolves.
///
/// The replica root is created first if it is missing. A pass in flight when
/// `stop` resolves runs to completion before this returns.
pub async fn run_until<F>(
    config: MirrorConfig,
    log: Arc<dyn EventLog>,
    stop: F,
) -> Result<ScheduleState, DaemonError>
where
    F: Future<Output = Result<(), DaemonError>> + Send + 'static,
{
    let mirror = Arc::new(Mirror::from_config(Arc::new(OsFs), log.clone(), &config));

    {
        let mirror = mirror.clone();
        let created = tokio::task::spawn_blocking(move || mirror.ensure_replica_root()).await;
        handle_join("replica-root", created)?;
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        let scheduler = Scheduler::new(mirror, config.period, log);
        tokio::spawn(async move {
            let state = scheduler.run(shutdown_rx).await;
            let _ = shutdown.send(());
            Ok::<_, DaemonError>(state)
        })
    };

    let stop_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                stopped = stop => {
                    let _ = shutdown.send(());
                    stopped
                }
            }
        })
    };

    let (scheduler_result, stop_result) = tokio::join!(scheduler_handle, stop_handle);

    let state = handle_join("scheduler", scheduler_result)?;
    handle_join("stop-signal", stop_result)?;
    tracing::info!(
        "scheduler stopped after {} passes ({} failed)",
        state.dispatched,
        state.failed
    );
    Ok(state)
}

/// Run exactly one pass against the real filesystem.
pub fn run_once(config: &MirrorConfig, log: Arc<dyn EventLog>) -> Result<PassReport, DaemonError> {
    let mirror = Mirror::from_config(Arc::new(OsFs), log, config);
    Ok(mirror.run_pass()?)
}

fn handle_join<T, E: Into<DaemonError>>(
    task: &'static str,
    result: Result<Result<T, E>, tokio::task::JoinError>,
) -> Result<T, DaemonError> {
    match result {
        Ok(inner) => inner.map_err(Into::into),
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}
