//! The per-project lockfile of artifact fingerprints.
//!
//! Stored as `.skc-lock.json` in the project root. The whole file is read
//! once at the start of a run and written once at the end. A missing or
//! unreadable file is treated as empty, which simply makes every artifact
//! stale.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skc_common::ContentHash;

use crate::error::CacheError;

/// Name of the lockfile within the project root.
pub const LOCK_FILE_NAME: &str = ".skc-lock.json";

/// Current lockfile schema version.
pub const LOCK_VERSION: u32 = 1;

/// Fingerprints for every artifact generated so far, keyed by artifact id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    /// Schema version.
    pub version: u32,

    /// Per-artifact state. A `BTreeMap` keeps the file's keys sorted.
    #[serde(default)]
    pub artifacts: BTreeMap<String, FingerprintEntry>,
}

/// Fingerprint of one successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEntry {
    /// Hash over the IR, relevant instruction sections, and prompt template.
    pub input_hash: ContentHash,

    /// Hash of the generated text.
    pub output_hash: ContentHash,

    /// Model that produced the output.
    pub model: String,

    /// When the entry was last written.
    pub updated_at: DateTime<Utc>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self::new()
    }
}

impl LockFile {
    /// Creates an empty lockfile.
    pub fn new() -> Self {
        Self {
            version: LOCK_VERSION,
            artifacts: BTreeMap::new(),
        }
    }

    /// Path of the lockfile for a project root.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(LOCK_FILE_NAME)
    }

    /// Loads the lockfile from a project root, returning `None` if it is
    /// missing, unparsable, or from another schema version.
    pub fn load(root: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(Self::path_in(root)).ok()?;
        serde_json::from_str::<Self>(&content)
            .ok()
            .filter(|lock| lock.version == LOCK_VERSION)
    }

    /// Loads the lockfile, falling back to an empty one.
    ///
    /// A file that exists but cannot be used is logged, since every artifact
    /// will be regenerated as a result.
    pub fn load_or_default(root: &Path) -> Self {
        let path = Self::path_in(root);
        match Self::load(root) {
            Some(lock) => lock,
            None => {
                if path.exists() {
                    tracing::warn!(
                        "ignoring unreadable lockfile {}; all artifacts will be regenerated",
                        path.display()
                    );
                }
                Self::new()
            }
        }
    }

    /// Writes the lockfile into `root` as pretty-printed JSON.
    pub fn save(&self, root: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(root).map_err(|e| CacheError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = Self::path_in(root);
        let mut json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        json.push('\n');
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns the entry for an artifact.
    pub fn entry(&self, id: &str) -> Option<&FingerprintEntry> {
        self.artifacts.get(id)
    }

    /// Returns `true` iff an entry exists with exactly this input hash.
    pub fn is_up_to_date(&self, id: &str, input_hash: &ContentHash) -> bool {
        self.artifacts
            .get(id)
            .is_some_and(|entry| entry.input_hash == *input_hash)
    }

    /// Creates or overwrites the entry for an artifact, stamped now.
    pub fn update_entry(
        &mut self,
        id: &str,
        input_hash: ContentHash,
        output_hash: ContentHash,
        model: &str,
    ) {
        self.artifacts.insert(
            id.to_string(),
            FingerprintEntry {
                input_hash,
                output_hash,
                model: model.to_string(),
                updated_at: Utc::now(),
            },
        );
    }
}
