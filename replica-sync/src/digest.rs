//! Content fingerprints used as the equality oracle.
//!
//! Files are compared by the SHA-256 of their bytes, read in fixed-size
//! chunks so memory use does not grow with file size. Metadata is never
//! consulted: identical bytes with different timestamps are equal.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use replica_core::Filesystem;

use crate::error::{io_err, SyncError};

/// Bytes read per chunk while hashing.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// SHA-256 digest of a file's full content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Digest everything `reader` yields.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..n]);
    }
    Ok(ContentDigest(hasher.finalize().into()))
}

pub fn digest_file(fs: &dyn Filesystem, path: &Path) -> io::Result<ContentDigest> {
    digest_reader(fs.open(path)?)
}

/// `true` iff `left` and `right` hold byte-identical content.
///
/// A read failure is reported as [`SyncError::Io`] naming the file that
/// could not be read.
pub fn files_equal(fs: &dyn Filesystem, left: &Path, right: &Path) -> Result<bool, SyncError> {
    let left_digest = digest_file(fs, left).map_err(|e| io_err(left, e))?;
    let right_digest = digest_file(fs, right).map_err(|e| io_err(right, e))?;
    Ok(left_digest == right_digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_core::MemFs;

    #[test]
    fn known_digest_of_hello_world() {
        let digest = digest_reader("hello world".as_bytes()).unwrap();
        assert_eq!(
            digest.to_string(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn empty_input_has_stable_digest() {
        let a = digest_reader(io::empty()).unwrap();
        let b = digest_reader(&b""[..]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multi_chunk_content_differs_in_last_byte() {
        let mut left = vec![7u8; CHUNK_SIZE * 3 + 11];
        let right = left.clone();
        assert_eq!(
            digest_reader(&left[..]).unwrap(),
            digest_reader(&right[..]).unwrap()
        );

        let last = left.len() - 1;
        left[last] = 8;
        assert_ne!(
            digest_reader(&left[..]).unwrap(),
            digest_reader(&right[..]).unwrap()
        );
    }

    #[test]
    fn files_equal_compares_content_only() {
        let fs = MemFs::new();
        fs.add_file("/a/one.txt", "same");
        fs.add_file("/b/two.txt", "same");
        fs.add_file("/b/three.txt", "different");

        assert!(files_equal(&fs, Path::new("/a/one.txt"), Path::new("/b/two.txt")).unwrap());
        assert!(!files_equal(&fs, Path::new("/a/one.txt"), Path::new("/b/three.txt")).unwrap());
    }

    #[test]
    fn failed_comparison_names_the_unreadable_file() {
        let fs = MemFs::new();
        fs.add_file("/a/one.txt", "x");
        fs.add_file("/b/two.txt", "x");
        fs.deny_read("/b/two.txt");

        match files_equal(&fs, Path::new("/a/one.txt"), Path::new("/b/two.txt")) {
            Err(SyncError::Io { path, source }) => {
                assert_eq!(path, Path::new("/b/two.txt"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_surfaces_permission_error() {
        let fs = MemFs::new();
        fs.add_file("/a/secret.txt", "x");
        fs.deny_read("/a/secret.txt");

        let err = digest_file(&fs, Path::new("/a/secret.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
