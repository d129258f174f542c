//! Default mode: run the scheduler in the foreground until ctrl-c.

use anyhow::{Context, Result};

use replica_core::MirrorConfig;
use replica_daemon::start_blocking;

pub fn run(config: &MirrorConfig) -> Result<()> {
    start_blocking(config).context("scheduler exited with error")?;
    Ok(())
}
