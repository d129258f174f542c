//! Filesystem capability used by the mirror engine.
//!
//! The engine never touches `std::fs` directly; it goes through
//! [`Filesystem`] so the walk/update/prune logic can run against the real
//! disk ([`OsFs`]) or an in-memory tree ([`crate::memory::MemFs`]).

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::types::NodeKind;

/// The filesystem primitives one sync pass needs.
pub trait Filesystem: Send + Sync {
    /// List the direct children of `dir` with their kinds. Symlinks are
    /// reported as [`NodeKind::Other`], never followed.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<(PathBuf, NodeKind)>>;

    /// Kind of the node at `path` without following symlinks, or `None` if
    /// nothing is there.
    fn node_kind(&self, path: &Path) -> Option<NodeKind>;

    /// Open a regular file for reading.
    fn open<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Read + 'a>>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` over `to`, replacing any existing file. Implementations
    /// carry over whatever metadata they can (permissions, timestamps).
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything beneath it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

fn node_kind_of(file_type: fs::FileType) -> NodeKind {
    if file_type.is_dir() {
        NodeKind::Directory
    } else if file_type.is_file() {
        NodeKind::File
    } else {
        NodeKind::Other
    }
}

/// Stamp `to` with the access and modification times of `from`.
fn carry_times(from: &Path, to: &Path) -> io::Result<()> {
    let meta = fs::metadata(from)?;
    filetime::set_file_times(
        to,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
}

impl Filesystem for OsFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<(PathBuf, NodeKind)>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let kind = node_kind_of(entry.file_type()?);
            children.push((entry.path(), kind));
        }
        Ok(children)
    }

    fn node_kind(&self, path: &Path) -> Option<NodeKind> {
        fs::symlink_metadata(path)
            .ok()
            .map(|meta| node_kind_of(meta.file_type()))
    }

    fn open<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Read + 'a>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        // fs::copy carries permission bits; timestamps are set afterwards.
        fs::copy(from, to)?;
        if let Err(err) = carry_times(from, to) {
            tracing::debug!("kept fresh timestamps on {}: {err}", to.display());
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}
