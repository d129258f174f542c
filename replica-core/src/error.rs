//! Error types for replica-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which configured path a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Source,
    Replica,
    Logfile,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRole::Source => write!(f, "source directory"),
            PathRole::Replica => write!(f, "replica directory"),
            PathRole::Logfile => write!(f, "logfile"),
        }
    }
}

/// Pre-flight validation failures. Any of these stops the program before a
/// pass runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The path string cannot name a file on this host.
    #[error("Path to {role} is invalid: '{}' ({reason})", path.display())]
    InvalidPath {
        role: PathRole,
        path: PathBuf,
        reason: &'static str,
    },

    #[error("Source directory does not exist: '{}'", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Source path is not a directory: '{}'", path.display())]
    SourceNotDirectory { path: PathBuf },

    /// Mirroring would recurse into itself.
    #[error(
        "Source '{}' and replica '{}' must not contain one another",
        source_dir.display(),
        replica_dir.display()
    )]
    NestedRoots {
        source_dir: PathBuf,
        replica_dir: PathBuf,
    },

    /// The log would be pruned from the replica or mirrored out of the source.
    #[error(
        "Logfile '{}' must not be inside the {role} '{}'",
        logfile.display(),
        root.display()
    )]
    LogfileInsideTree {
        logfile: PathBuf,
        role: PathRole,
        root: PathBuf,
    },
}
