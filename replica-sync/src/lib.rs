//! # replica-sync
//!
//! One-way reconcile engine: walk the source, update the replica, walk the
//! replica, prune what the source no longer has.
//!
//! Build a [`Mirror`] over any [`replica_core::Filesystem`] and call
//! [`Mirror::run_pass`].

pub mod digest;
pub mod enumerate;
pub mod error;
pub mod pass;
mod prune;
mod update;

pub use digest::{digest_file, digest_reader, files_equal, ContentDigest};
pub use enumerate::enumerate;
pub use error::SyncError;
pub use pass::{Mirror, PassReport};
