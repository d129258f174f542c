//! Replica: one-way periodic directory mirror.
//!
//! # Usage
//!
//! ```text
//! replica --source <dir> --replica <dir> --logfile <file> [--period <secs>] [--once]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use replica_core::{MirrorConfig, DEFAULT_PERIOD_SECS};
use replica_daemon::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "replica",
    version,
    about = "Keep a replica directory identical to a source directory",
    long_about = None,
)]
struct Cli {
    /// Directory to mirror from. Never modified.
    #[arg(short, long)]
    source: PathBuf,

    /// Directory to mirror into. Created if missing.
    #[arg(short, long)]
    replica: PathBuf,

    /// Log file; rotated weekly.
    #[arg(short, long)]
    logfile: PathBuf,

    /// Minimum number of seconds between pass dispatches.
    #[arg(short, long, default_value_t = DEFAULT_PERIOD_SECS)]
    period: u64,

    /// Run a single pass, print its report as JSON and exit.
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MirrorConfig::new(cli.source, cli.replica, cli.logfile, cli.period)?;
    init_logging(&config.logfile).context("failed to set up logging")?;

    if cli.once {
        commands::once::run(&config)
    } else {
        commands::daemon::run(&config)
    }
}
