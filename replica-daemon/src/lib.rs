//! Scheduler runtime for the directory mirror: periodic non-overlapping
//! passes, weekly-rotated log sink, subscriber setup.

mod error;
pub mod log_rotation;
pub mod logging;
mod runtime;
pub mod scheduler;

pub use error::DaemonError;
pub use log_rotation::{LogFile, WeeklyRotatingFile};
pub use logging::init_logging;
pub use runtime::{run, run_once, run_until, start_blocking};
pub use scheduler::{PassOutcome, PassRunner, ScheduleState, Scheduler};
