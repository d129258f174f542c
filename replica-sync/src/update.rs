//! Update phase: bring every source entry into the replica.

use std::io;
use std::path::{Path, PathBuf};

use replica_core::{Entry, EntryKind, NodeKind};

use crate::digest::files_equal;
use crate::error::SyncError;
use crate::pass::{Mirror, PassReport};

impl Mirror {
    /// Create missing directories and copy missing or changed files.
    ///
    /// A replica node of the wrong kind (a file where the source has a
    /// directory, a symlink where the source has a file, ...) is removed
    /// before the entry is recreated. When a replica directory cannot be
    /// made, its one warning covers the whole subtree: entries beneath it
    /// are skipped.
    pub fn update_replica(
        &self,
        entries: &[Entry],
        report: &mut PassReport,
    ) -> Result<(), SyncError> {
        let mut skipped: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let replica_path = self.replica_path_for(&entry.path)?;
            if skipped.iter().any(|dir| replica_path.starts_with(dir)) {
                continue;
            }
            match entry.kind {
                EntryKind::Directory => {
                    if !self.update_directory(&replica_path, report)? {
                        skipped.push(replica_path);
                    }
                }
                EntryKind::File => self.update_file(&entry.path, &replica_path, report)?,
            }
        }
        Ok(())
    }

    /// Returns `false` if the directory is not in place afterwards.
    fn update_directory(
        &self,
        replica_path: &Path,
        report: &mut PassReport,
    ) -> Result<bool, SyncError> {
        match self.fs.node_kind(replica_path) {
            Some(NodeKind::Directory) => return Ok(true),
            Some(_) => {
                if !self.remove_node(replica_path, false, report)? {
                    return Ok(false);
                }
            }
            None => {}
        }

        let created = self.fs.create_dir_all(replica_path);
        if !self.tolerate(created, "create directory", replica_path, report)? {
            return Ok(false);
        }
        report.dirs_created += 1;
        self.log
            .debug(&format!("Directory [{}] created.", replica_path.display()));
        Ok(true)
    }

    fn update_file(
        &self,
        source_path: &Path,
        replica_path: &Path,
        report: &mut PassReport,
    ) -> Result<(), SyncError> {
        let needs_copy = match self.fs.node_kind(replica_path) {
            None => true,
            Some(NodeKind::File) => match files_equal(self.fs.as_ref(), source_path, replica_path) {
                Ok(equal) => !equal,
                Err(SyncError::Io { path, source })
                    if source.kind() == io::ErrorKind::PermissionDenied =>
                {
                    self.tolerate(Err(source), "compare file", &path, report)?;
                    return Ok(());
                }
                Err(err) => return Err(err),
            },
            Some(kind) => {
                if !self.remove_node(replica_path, kind.is_dir(), report)? {
                    return Ok(());
                }
                true
            }
        };

        if !needs_copy {
            report.files_unchanged += 1;
            return Ok(());
        }

        let copied = self.fs.copy_file(source_path, replica_path);
        if self.tolerate(copied, "copy file", replica_path, report)? {
            report.files_copied += 1;
            self.log.debug(&format!(
                "File [{}] copied from [{}]",
                replica_path.display(),
                source_path.display()
            ));
        }
        Ok(())
    }

    /// Remove a replica node so an entry of another kind can take its place.
    pub(crate) fn remove_node(
        &self,
        path: &Path,
        is_dir: bool,
        report: &mut PassReport,
    ) -> Result<bool, SyncError> {
        if is_dir {
            let removed = self.fs.remove_dir_all(path);
            if !self.tolerate(removed, "remove directory", path, report)? {
                return Ok(false);
            }
            report.dirs_removed += 1;
            self.log
                .debug(&format!("Directory [{}] removed.", path.display()));
        } else {
            let removed = self.fs.remove_file(path);
            if !self.tolerate(removed, "remove file", path, report)? {
                return Ok(false);
            }
            report.files_removed += 1;
            self.log.debug(&format!("File [{}] removed.", path.display()));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use chrono::Utc;
    use replica_core::{Filesystem, Level, MemFs, MemoryLog};

    use super::*;
    use crate::enumerate::enumerate;

    struct Fixture {
        fs: Arc<MemFs>,
        log: Arc<MemoryLog>,
        mirror: Mirror,
    }

    fn fixture() -> Fixture {
        let fs = Arc::new(MemFs::new());
        fs.add_dir("/src");
        fs.add_dir("/dst");
        let log = Arc::new(MemoryLog::new());
        let mirror = Mirror::new(fs.clone(), log.clone(), "/src", "/dst");
        Fixture { fs, log, mirror }
    }

    fn update(f: &Fixture) -> PassReport {
        let mut report = PassReport::new(Utc::now());
        let entries = enumerate(f.fs.as_ref(), Path::new("/src")).unwrap();
        f.mirror.update_replica(&entries, &mut report).unwrap();
        report
    }

    #[test]
    fn copies_missing_file_and_creates_directories() {
        let f = fixture();
        f.fs.add_file("/src/a.txt", "hello");
        f.fs.add_file("/src/docs/guide/b.txt", "b");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/a.txt"), Some(b"hello".to_vec()));
        assert_eq!(f.fs.file_contents("/dst/docs/guide/b.txt"), Some(b"b".to_vec()));
        assert_eq!(report.dirs_created, 2);
        assert_eq!(report.files_copied, 2);
        assert!(f
            .log
            .messages(Level::Debug)
            .contains(&"File [/dst/a.txt] copied from [/src/a.txt]".to_string()));
        assert!(f
            .log
            .messages(Level::Debug)
            .contains(&"Directory [/dst/docs] created.".to_string()));
    }

    #[test]
    fn overwrites_changed_file() {
        let f = fixture();
        f.fs.add_file("/src/a.txt", "world");
        f.fs.add_file("/dst/a.txt", "hello");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/a.txt"), Some(b"world".to_vec()));
        assert_eq!(report.files_copied, 1);
    }

    #[test]
    fn identical_file_is_left_alone() {
        let f = fixture();
        f.fs.add_file("/src/a.txt", "same");
        f.fs.add_file("/dst/a.txt", "same");

        let report = update(&f);

        assert_eq!(report.files_unchanged, 1);
        assert_eq!(report.mutations(), 0);
        assert_eq!(f.fs.mutations(), 0);
    }

    #[test]
    fn permission_denied_copy_is_a_warning_and_processing_continues() {
        let f = fixture();
        f.fs.add_file("/src/a.txt", "a");
        f.fs.add_file("/src/b.txt", "b");
        f.fs.deny_write("/dst/a.txt");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/a.txt"), None);
        assert_eq!(f.fs.file_contents("/dst/b.txt"), Some(b"b".to_vec()));
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.warnings.len(), 1);
        let warnings = f.log.messages(Level::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(
            warnings[0].starts_with("Could not copy file: [/dst/a.txt]. Permission error:"),
            "got: {}",
            warnings[0]
        );
    }

    #[test]
    fn permission_denied_directory_is_a_warning() {
        let f = fixture();
        f.fs.add_dir("/src/locked");
        f.fs.add_file("/src/ok.txt", "ok");
        f.fs.deny_write("/dst/locked");

        let report = update(&f);

        assert!(f.fs.node_kind(Path::new("/dst/locked")).is_none());
        assert_eq!(f.fs.file_contents("/dst/ok.txt"), Some(b"ok".to_vec()));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Could not create directory: [/dst/locked]"));
    }

    #[test]
    fn denied_directory_skips_its_contents_with_one_warning() {
        let f = fixture();
        f.fs.add_file("/src/locked/x.txt", "x");
        f.fs.add_file("/src/locked/sub/y.txt", "y");
        f.fs.add_file("/src/z.txt", "z");
        f.fs.deny_write("/dst/locked");

        let mut report = PassReport::new(Utc::now());
        let entries = enumerate(f.fs.as_ref(), Path::new("/src")).unwrap();
        f.mirror
            .update_replica(&entries, &mut report)
            .expect("subtree is skipped, not fatal");

        assert_eq!(f.fs.file_contents("/dst/z.txt"), Some(b"z".to_vec()));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(f.log.messages(Level::Warning).len(), 1);
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.dirs_created, 0);
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_skipped() {
        let f = fixture();
        f.fs.add_dir("/src/locked");
        f.fs.add_file("/src/locked2/x.txt", "x");
        f.fs.deny_write("/dst/locked");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/locked2/x.txt"), Some(b"x".to_vec()));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn unreadable_source_is_skipped_with_warning() {
        let f = fixture();
        f.fs.add_file("/src/secret.txt", "new");
        f.fs.add_file("/dst/secret.txt", "old");
        f.fs.deny_read("/src/secret.txt");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/secret.txt"), Some(b"old".to_vec()));
        assert_eq!(report.warnings.len(), 1);
        assert!(
            report.warnings[0].starts_with("Could not compare file: [/src/secret.txt]"),
            "got: {}",
            report.warnings[0]
        );
    }

    #[test]
    fn unreadable_replica_file_is_named_in_warning() {
        let f = fixture();
        f.fs.add_file("/src/secret.txt", "new");
        f.fs.add_file("/dst/secret.txt", "old");
        f.fs.deny_read("/dst/secret.txt");

        let report = update(&f);

        assert_eq!(report.files_copied, 0);
        assert!(
            report.warnings[0].starts_with("Could not compare file: [/dst/secret.txt]"),
            "got: {}",
            report.warnings[0]
        );
    }

    #[test]
    fn file_replaces_replica_directory_of_same_name() {
        let f = fixture();
        f.fs.add_file("/src/node", "file now");
        f.fs.add_file("/dst/node/child.txt", "was a dir");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/node"), Some(b"file now".to_vec()));
        assert!(f.fs.node_kind(&PathBuf::from("/dst/node/child.txt")).is_none());
        assert_eq!(report.dirs_removed, 1);
        assert_eq!(report.files_copied, 1);
    }

    #[test]
    fn directory_replaces_replica_file_of_same_name() {
        let f = fixture();
        f.fs.add_file("/src/node/inner.txt", "i");
        f.fs.add_file("/dst/node", "was a file");

        update(&f);

        assert_eq!(f.fs.node_kind(Path::new("/dst/node")), Some(NodeKind::Directory));
        assert_eq!(f.fs.file_contents("/dst/node/inner.txt"), Some(b"i".to_vec()));
    }

    #[test]
    fn copy_never_writes_through_replica_symlink() {
        let f = fixture();
        f.fs.add_file("/src/a.txt", "a");
        f.fs.add_symlink("/dst/a.txt");

        let report = update(&f);

        assert_eq!(f.fs.file_contents("/dst/a.txt"), Some(b"a".to_vec()));
        assert_eq!(report.files_removed, 1);
    }
}
