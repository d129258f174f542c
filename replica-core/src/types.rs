//! Domain types shared by the enumerator, updater and pruner.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of an enumerated entry. Only regular files and directories are
/// mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// Kind of a raw filesystem node as reported without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    File,
    Directory,
    /// Symlinks, sockets, FIFOs and device nodes.
    Other,
}

impl NodeKind {
    /// The mirrored entry kind, or `None` for nodes that are never mirrored.
    pub fn entry_kind(self) -> Option<EntryKind> {
        match self {
            NodeKind::File => Some(EntryKind::File),
            NodeKind::Directory => Some(EntryKind::Directory),
            NodeKind::Other => None,
        }
    }

    pub fn is_dir(self) -> bool {
        self == NodeKind::Directory
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A filesystem node discovered during one enumeration.
///
/// `path` is the full path under the enumerated root. Entries are rebuilt on
/// every pass and carry no identity beyond that path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, EntryKind::File)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, EntryKind::Directory)
    }
}
