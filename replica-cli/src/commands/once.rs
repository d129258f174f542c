//! `replica --once`: one pass, report on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};

use replica_core::{MirrorConfig, TracingLog};
use replica_daemon::run_once;

pub fn run(config: &MirrorConfig) -> Result<()> {
    let report = run_once(config, Arc::new(TracingLog)).context("synchronization pass failed")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize pass report")?
    );
    Ok(())
}
