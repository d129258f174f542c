//! Subscriber setup: one formatter, two sinks (stderr and the rotating file).
//!
//! Every line renders as `[YYYY-MM-DD HH:MM:SS] - [LEVEL] - message`.

use std::fmt;
use std::path::Path;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{io_err, DaemonError};
use crate::log_rotation::LogFile;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,replica_core=debug,replica_sync=debug,replica_daemon=debug";

/// Bracketed line format shared by the console and file sinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorFormat;

pub fn level_name(level: &Level) -> &'static str {
    if *level == Level::ERROR {
        "ERROR"
    } else if *level == Level::WARN {
        "WARNING"
    } else if *level == Level::INFO {
        "INFO"
    } else if *level == Level::DEBUG {
        "DEBUG"
    } else {
        "TRACE"
    }
}

impl<S, N> FormatEvent<S, N> for MirrorFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] - [{}] - ",
            Local::now().format(TIMESTAMP_FORMAT),
            level_name(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the process-wide subscriber writing to stderr and `logfile`.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`].
pub fn init_logging(logfile: &Path) -> Result<(), DaemonError> {
    let file = LogFile::open(logfile).map_err(|e| io_err(logfile, e))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console = tracing_subscriber::fmt::layer()
        .event_format(MirrorFormat)
        .with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(MirrorFormat)
        .with_ansi(false)
        .with_writer(file);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| DaemonError::Subscriber(e.to_string()))
}
