//! One full reconcile of the replica against the source.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use replica_core::{EventLog, Filesystem, MirrorConfig, NodeKind};

use crate::enumerate::enumerate;
use crate::error::{io_err, SyncError};

/// Counters for a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub dirs_created: usize,
    pub files_copied: usize,
    pub files_unchanged: usize,
    pub dirs_removed: usize,
    pub files_removed: usize,
    /// Entries skipped because of permission failures.
    pub warnings: Vec<String>,
    pub duration_ms: u128,
}

impl PassReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            dirs_created: 0,
            files_copied: 0,
            files_unchanged: 0,
            dirs_removed: 0,
            files_removed: 0,
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Number of filesystem changes made to the replica.
    pub fn mutations(&self) -> usize {
        self.dirs_created + self.files_copied + self.dirs_removed + self.files_removed
    }
}

/// Mirrors `source` into `replica` through an injected filesystem and log.
///
/// The source tree is only ever read.
pub struct Mirror {
    pub(crate) fs: Arc<dyn Filesystem>,
    pub(crate) log: Arc<dyn EventLog>,
    pub(crate) source: PathBuf,
    pub(crate) replica: PathBuf,
}

impl Mirror {
    pub fn new(
        fs: Arc<dyn Filesystem>,
        log: Arc<dyn EventLog>,
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            log,
            source: source.into(),
            replica: replica.into(),
        }
    }

    pub fn from_config(
        fs: Arc<dyn Filesystem>,
        log: Arc<dyn EventLog>,
        config: &MirrorConfig,
    ) -> Self {
        Self::new(fs, log, config.source.clone(), config.replica.clone())
    }

    /// Create the replica root if it is missing. Returns `true` if it was
    /// created.
    pub fn ensure_replica_root(&self) -> Result<bool, SyncError> {
        if self.fs.node_kind(&self.replica) == Some(NodeKind::Directory) {
            return Ok(false);
        }
        self.fs
            .create_dir_all(&self.replica)
            .map_err(|e| io_err(&self.replica, e))?;
        self.log.debug(&format!(
            "Replica directory: [{}] created.",
            self.replica.display()
        ));
        Ok(true)
    }

    /// Run the update phase over the source tree, then the prune phase over a
    /// fresh listing of the replica.
    ///
    /// Permission failures on individual entries are logged as warnings and
    /// recorded in the report; they do not fail the pass.
    ///
    /// # Errors
    /// Enumeration failures and non-permission I/O errors end the pass early.
    /// Mutations made before the failure are kept.
    pub fn run_pass(&self) -> Result<PassReport, SyncError> {
        let started = Instant::now();
        let mut report = PassReport::new(Utc::now());

        self.ensure_replica_root()?;

        let source_entries = enumerate(self.fs.as_ref(), &self.source)?;
        self.update_replica(&source_entries, &mut report)?;

        let replica_entries = enumerate(self.fs.as_ref(), &self.replica)?;
        self.prune_replica(&replica_entries, &mut report)?;

        report.duration_ms = started.elapsed().as_millis();
        Ok(report)
    }

    /// Re-root a source path under the replica.
    pub(crate) fn replica_path_for(&self, source_path: &Path) -> Result<PathBuf, SyncError> {
        rebase(source_path, &self.source, &self.replica)
    }

    /// Re-root a replica path under the source.
    pub(crate) fn source_path_for(&self, replica_path: &Path) -> Result<PathBuf, SyncError> {
        rebase(replica_path, &self.replica, &self.source)
    }

    /// Turn a failed per-entry operation into a warning when it was a
    /// permission failure. Returns `Ok(false)` if the entry was skipped.
    pub(crate) fn tolerate(
        &self,
        result: std::io::Result<()>,
        action: &str,
        path: &Path,
        report: &mut PassReport,
    ) -> Result<bool, SyncError> {
        match result {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                let message = format!(
                    "Could not {action}: [{}]. Permission error: {err}",
                    path.display()
                );
                self.log.warning(&message);
                report.warnings.push(message);
                Ok(false)
            }
            Err(err) => Err(io_err(path, err)),
        }
    }
}

fn rebase(path: &Path, from: &Path, to: &Path) -> Result<PathBuf, SyncError> {
    let relative = path.strip_prefix(from).map_err(|_| SyncError::OutsideRoot {
        path: path.to_path_buf(),
        root: from.to_path_buf(),
    })?;
    Ok(to.join(relative))
}
