//! Recursive tree listing.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::Path;

use replica_core::{Entry, EntryKind, Filesystem};

use crate::error::SyncError;

/// List every file and directory beneath `root` (the root itself excluded).
///
/// The walk is breadth-first with siblings sorted, so a directory always
/// precedes its descendants. Symlinks and special files are neither
/// reported nor followed.
///
/// # Errors
/// Fails with [`SyncError::Enumerate`] if `root` or any subdirectory cannot
/// be listed. A subdirectory that vanished between being listed and being
/// descended into is skipped.
pub fn enumerate(fs: &dyn Filesystem, root: &Path) -> Result<Vec<Entry>, SyncError> {
    let mut entries = Vec::new();
    let mut pending = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = pending.pop_front() {
        let mut children = match fs.read_dir(&dir) {
            Ok(children) => children,
            Err(err) if err.kind() == ErrorKind::NotFound && dir != root => continue,
            Err(source) => return Err(SyncError::Enumerate { path: dir, source }),
        };
        children.sort();

        for (path, kind) in children {
            match kind.entry_kind() {
                Some(EntryKind::Directory) => {
                    pending.push_back(path.clone());
                    entries.push(Entry::directory(path));
                }
                Some(EntryKind::File) => entries.push(Entry::file(path)),
                None => {}
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_core::MemFs;
    use std::path::PathBuf;

    #[test]
    fn lists_nested_tree_parents_first() {
        let fs = MemFs::new();
        fs.add_file("/src/b.txt", "b");
        fs.add_file("/src/a/deep/x.txt", "x");
        fs.add_dir("/src/empty");

        let entries = enumerate(&fs, Path::new("/src")).unwrap();
        assert_eq!(
            entries,
            vec![
                Entry::directory("/src/a"),
                Entry::file("/src/b.txt"),
                Entry::directory("/src/empty"),
                Entry::directory("/src/a/deep"),
                Entry::file("/src/a/deep/x.txt"),
            ]
        );
    }

    #[test]
    fn every_descendant_appears_once() {
        let fs = MemFs::new();
        for i in 0..5 {
            fs.add_file(format!("/src/d{i}/f{i}.txt"), "x");
        }

        let entries = enumerate(&fs, Path::new("/src")).unwrap();
        let mut paths: Vec<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();
        let total = paths.len();
        paths.dedup();
        assert_eq!(total, 10);
        assert_eq!(paths.len(), total);
    }

    #[test]
    fn symlinks_are_skipped() {
        let fs = MemFs::new();
        fs.add_file("/src/real.txt", "r");
        fs.add_symlink("/src/link");

        let entries = enumerate(&fs, Path::new("/src")).unwrap();
        assert_eq!(entries, vec![Entry::file("/src/real.txt")]);
    }

    #[test]
    fn missing_root_is_an_enumeration_error() {
        let fs = MemFs::new();
        let err = enumerate(&fs, Path::new("/missing")).unwrap_err();
        assert!(matches!(err, SyncError::Enumerate { .. }), "got: {err}");
    }

    #[test]
    fn unreadable_subdirectory_aborts_enumeration() {
        let fs = MemFs::new();
        fs.add_file("/src/locked/x.txt", "x");
        fs.deny_read("/src/locked");

        let err = enumerate(&fs, Path::new("/src")).unwrap_err();
        match err {
            SyncError::Enumerate { path, source } => {
                assert_eq!(path, PathBuf::from("/src/locked"));
                assert_eq!(source.kind(), ErrorKind::PermissionDenied);
            }
            other => panic!("expected enumerate error, got {other}"),
        }
    }
}
