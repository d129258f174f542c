//! Prune phase: drop replica entries the source no longer has.

use replica_core::{Entry, NodeKind};

use crate::error::SyncError;
use crate::pass::{Mirror, PassReport};

impl Mirror {
    /// Delete every replica entry whose source counterpart is gone.
    ///
    /// `entries` must be a listing of the replica taken after the update
    /// phase. Each entry is re-checked before deletion because removing a
    /// directory earlier in the loop also removes its descendants. A source
    /// symlink or special file does not count as a counterpart, matching the
    /// enumerator, so a replica node shadowing one is removed.
    pub fn prune_replica(
        &self,
        entries: &[Entry],
        report: &mut PassReport,
    ) -> Result<(), SyncError> {
        for entry in entries {
            let source_path = self.source_path_for(&entry.path)?;
            let mirrored = self
                .fs
                .node_kind(&source_path)
                .and_then(NodeKind::entry_kind)
                .is_some();
            if mirrored {
                continue;
            }
            let Some(kind) = self.fs.node_kind(&entry.path) else {
                continue;
            };
            self.remove_node(&entry.path, kind.is_dir(), report)?;
        }
        Ok(())
    }
}
