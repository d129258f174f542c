//! replica core library: domain types, filesystem and logging capabilities,
//! configuration.
//!
//! - [`types`]: [`Entry`], [`EntryKind`], [`NodeKind`]
//! - [`fs`]: the [`Filesystem`] trait and the OS-backed [`OsFs`]
//! - [`memory`]: [`MemFs`], an in-memory filesystem
//! - [`event_log`]: the injected [`EventLog`] capability
//! - [`config`]: validated [`MirrorConfig`]

pub mod config;
pub mod error;
pub mod event_log;
pub mod fs;
pub mod memory;
pub mod types;

pub use config::{MirrorConfig, DEFAULT_PERIOD_SECS};
pub use error::{ConfigError, PathRole};
pub use event_log::{EventLog, Level, MemoryLog, TracingLog};
pub use fs::{Filesystem, OsFs};
pub use memory::MemFs;
pub use types::{Entry, EntryKind, NodeKind};
