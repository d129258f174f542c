use std::fs;
use std::sync::Arc;
use std::time::Duration;

use replica_core::{Level, MemoryLog, MirrorConfig};
use replica_daemon::{run_once, run_until, DaemonError};
use tempfile::TempDir;

fn config(tmp: &TempDir, period_secs: u64) -> MirrorConfig {
    let source = tmp.path().join("source");
    fs::create_dir_all(&source).expect("mkdir source");
    MirrorConfig::new(
        &source,
        &tmp.path().join("replica"),
        &tmp.path().join("sync.log"),
        period_secs,
    )
    .expect("valid config")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_until_creates_replica_and_mirrors_before_stopping() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, 3600);
    fs::write(config.source.join("a.txt"), "hello").unwrap();
    let log = Arc::new(MemoryLog::new());

    let stop = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok::<(), DaemonError>(())
    };
    let state = run_until(config.clone(), log.clone(), stop).await.unwrap();

    assert_eq!(state.dispatched, 1);
    assert_eq!(state.failed, 0);
    assert_eq!(
        fs::read_to_string(config.replica.join("a.txt")).unwrap(),
        "hello"
    );
    let debug = log.messages(Level::Debug);
    assert!(debug[0].starts_with("Replica directory: ["), "got: {debug:?}");
    assert!(debug[0].ends_with("] created."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_passes_do_not_stop_the_runtime() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, 0);
    fs::remove_dir_all(&config.source).unwrap();
    let log = Arc::new(MemoryLog::new());

    let stop = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok::<(), DaemonError>(())
    };
    let state = run_until(config, log.clone(), stop).await.unwrap();

    assert!(state.dispatched >= 2);
    assert_eq!(state.failed, state.dispatched);
    assert!(log.messages(Level::Error)[0].starts_with("Synchronization pass failed"));
}

#[tokio::test]
async fn stop_signal_error_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, 3600);
    let log = Arc::new(MemoryLog::new());

    let stop = async { Err::<(), _>(DaemonError::Subscriber("signal handler unavailable".into())) };
    let err = run_until(config, log, stop).await.unwrap_err();

    assert!(matches!(err, DaemonError::Subscriber(_)), "got: {err}");
}

#[test]
fn run_once_returns_the_pass_report() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, 300);
    fs::create_dir_all(config.source.join("nested")).unwrap();
    fs::write(config.source.join("nested").join("b.txt"), "b").unwrap();
    fs::create_dir_all(&config.replica).unwrap();
    fs::write(config.replica.join("stale.txt"), "s").unwrap();

    let report = run_once(&config, Arc::new(MemoryLog::new())).unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(report.dirs_created, 1);
    assert_eq!(report.files_removed, 1);
    assert!(!config.replica.join("stale.txt").exists());
}

#[test]
fn run_once_surfaces_enumeration_failure() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, 300);
    fs::remove_dir_all(&config.source).unwrap();

    let err = run_once(&config, Arc::new(MemoryLog::new())).unwrap_err();

    assert!(matches!(err, DaemonError::Sync(_)), "got: {err}");
}
