//! Error types for replica-sync.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a sync pass. Permission failures on individual entries
/// never surface here; they are logged as warnings and skipped.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A directory could not be listed while walking a tree.
    #[error("failed to enumerate {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An enumerated entry did not live under the root it was listed from.
    #[error("{path} is not inside {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
