//! Fingerprint cache for incremental artifact generation.
//!
//! The [`LockFile`] records, per artifact, the hash of everything that went
//! into its prompt plus the hash of what came out. The [`ArtifactStore`]
//! keeps the generated text itself, keyed by output hash, so later runs can
//! show the previous content to dependent artifacts. [`Cache`] ties the two
//! together for one run.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod lockfile;
pub mod store;

pub use cache::{Cache, CACHE_DIR};
pub use error::CacheError;
pub use fingerprint::{input_fingerprint, output_fingerprint};
pub use lockfile::{FingerprintEntry, LockFile, LOCK_FILE_NAME, LOCK_VERSION};
pub use store::{ArtifactHeader, ArtifactStore};
