//! In-memory [`Filesystem`] for exercising the mirror engine without disk I/O.
//!
//! Nodes live in a single ordered map keyed by absolute path. Permission
//! failures can be injected per path, and every successful mutation is
//! counted so callers can assert that a pass changed nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::fs::Filesystem;
use crate::types::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemNode {
    Directory,
    File(Vec<u8>),
    Symlink,
}

impl MemNode {
    fn kind(&self) -> NodeKind {
        match self {
            MemNode::Directory => NodeKind::Directory,
            MemNode::File(_) => NodeKind::File,
            MemNode::Symlink => NodeKind::Other,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemFs {
    nodes: Mutex<BTreeMap<PathBuf, MemNode>>,
    denied_reads: Mutex<BTreeSet<PathBuf>>,
    denied_writes: Mutex<BTreeSet<PathBuf>>,
    mutations: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn permission_denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {}", path.display()),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    // -- fixtures (not counted as mutations) ---------------------------------

    /// Create `path` and any missing ancestors as directories.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = lock(&self.nodes);
        insert_ancestors(&mut nodes, path.as_ref());
        nodes.insert(path.as_ref().to_path_buf(), MemNode::Directory);
    }

    /// Create or replace a file, creating missing ancestor directories.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let path = path.as_ref();
        let mut nodes = lock(&self.nodes);
        if let Some(parent) = path.parent() {
            insert_ancestors(&mut nodes, parent);
            if parent.parent().is_some() {
                nodes.insert(parent.to_path_buf(), MemNode::Directory);
            }
        }
        nodes.insert(path.to_path_buf(), MemNode::File(contents.as_ref().to_vec()));
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        lock(&self.nodes).insert(path.as_ref().to_path_buf(), MemNode::Symlink);
    }

    /// Make reads (`open`, `read_dir`) of `path` fail with `PermissionDenied`.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        lock(&self.denied_reads).insert(path.as_ref().to_path_buf());
    }

    /// Make mutations targeting `path` fail with `PermissionDenied`.
    pub fn deny_write(&self, path: impl AsRef<Path>) {
        lock(&self.denied_writes).insert(path.as_ref().to_path_buf());
    }

    // -- inspection ----------------------------------------------------------

    pub fn file_contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match lock(&self.nodes).get(path.as_ref()) {
            Some(MemNode::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Every node strictly beneath `root`, keyed by its path relative to
    /// `root`. File nodes carry their contents.
    pub fn snapshot(&self, root: impl AsRef<Path>) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        let root = root.as_ref();
        lock(&self.nodes)
            .iter()
            .filter(|(path, _)| path.as_path() != root)
            .filter_map(|(path, node)| {
                let rel = path.strip_prefix(root).ok()?.to_path_buf();
                let contents = match node {
                    MemNode::File(bytes) => Some(bytes.clone()),
                    _ => None,
                };
                Some((rel, contents))
            })
            .collect()
    }

    /// Number of successful mutating calls made through the [`Filesystem`]
    /// interface.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn check_read(&self, path: &Path) -> io::Result<()> {
        if lock(&self.denied_reads).contains(path) {
            return Err(permission_denied(path));
        }
        Ok(())
    }

    fn check_write(&self, path: &Path) -> io::Result<()> {
        if lock(&self.denied_writes).contains(path) {
            return Err(permission_denied(path));
        }
        Ok(())
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Insert every proper ancestor of `path` (excluding the filesystem root) as
/// a directory.
fn insert_ancestors(nodes: &mut BTreeMap<PathBuf, MemNode>, path: &Path) {
    let ancestors: Vec<&Path> = path
        .ancestors()
        .skip(1)
        .filter(|a| a.parent().is_some() && !a.as_os_str().is_empty())
        .collect();
    for ancestor in ancestors.into_iter().rev() {
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert(MemNode::Directory);
    }
}

fn is_dir_or_root(nodes: &BTreeMap<PathBuf, MemNode>, path: &Path) -> bool {
    path.parent().is_none() || matches!(nodes.get(path), Some(MemNode::Directory))
}

impl Filesystem for MemFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<(PathBuf, NodeKind)>> {
        self.check_read(dir)?;
        let nodes = lock(&self.nodes);
        match nodes.get(dir) {
            Some(MemNode::Directory) => {}
            Some(_) => return Err(io::Error::other(format!("not a directory: {}", dir.display()))),
            None => return Err(not_found(dir)),
        }
        Ok(nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .map(|(path, node)| (path.clone(), node.kind()))
            .collect())
    }

    fn node_kind(&self, path: &Path) -> Option<NodeKind> {
        lock(&self.nodes).get(path).map(MemNode::kind)
    }

    fn open<'a>(&'a self, path: &Path) -> io::Result<Box<dyn Read + 'a>> {
        self.check_read(path)?;
        match lock(&self.nodes).get(path) {
            Some(MemNode::File(bytes)) => Ok(Box::new(Cursor::new(bytes.clone()))),
            Some(_) => Err(io::Error::other(format!("not a file: {}", path.display()))),
            None => Err(not_found(path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.check_write(path)?;
        let mut nodes = lock(&self.nodes);
        for ancestor in path.ancestors().skip(1) {
            if let Some(node) = nodes.get(ancestor) {
                if *node != MemNode::Directory {
                    return Err(io::Error::other(format!(
                        "not a directory: {}",
                        ancestor.display()
                    )));
                }
            }
        }
        match nodes.get(path) {
            Some(MemNode::Directory) => return Ok(()),
            Some(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("file exists: {}", path.display()),
                ))
            }
            None => {}
        }
        insert_ancestors(&mut nodes, path);
        nodes.insert(path.to_path_buf(), MemNode::Directory);
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_read(from)?;
        self.check_write(to)?;
        let mut nodes = lock(&self.nodes);
        let bytes = match nodes.get(from) {
            Some(MemNode::File(bytes)) => bytes.clone(),
            Some(_) => return Err(io::Error::other(format!("not a file: {}", from.display()))),
            None => return Err(not_found(from)),
        };
        let parent_ok = to.parent().is_some_and(|p| is_dir_or_root(&nodes, p));
        if !parent_ok {
            return Err(not_found(to));
        }
        if matches!(nodes.get(to), Some(MemNode::Directory)) {
            return Err(io::Error::other(format!("is a directory: {}", to.display())));
        }
        nodes.insert(to.to_path_buf(), MemNode::File(bytes));
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check_write(path)?;
        let mut nodes = lock(&self.nodes);
        match nodes.get(path) {
            Some(MemNode::Directory) => {
                return Err(io::Error::other(format!("is a directory: {}", path.display())))
            }
            Some(_) => {
                nodes.remove(path);
            }
            None => return Err(not_found(path)),
        }
        drop(nodes);
        self.mutated();
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.check_write(path)?;
        let mut nodes = lock(&self.nodes);
        match nodes.get(path) {
            Some(MemNode::Directory) => {}
            Some(_) => return Err(io::Error::other(format!("not a directory: {}", path.display()))),
            None => return Err(not_found(path)),
        }
        nodes.retain(|p, _| !p.starts_with(path));
        drop(nodes);
        self.mutated();
        Ok(())
    }
}
