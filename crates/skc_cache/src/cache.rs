//! High-level cache orchestrator.
//!
//! `Cache` owns the lockfile and the content store for one run: it answers
//! up-to-date queries while planning, records successful generations, and
//! persists everything once at the end.

use std::path::{Path, PathBuf};

use skc_common::ContentHash;

use crate::error::CacheError;
use crate::fingerprint::output_fingerprint;
use crate::lockfile::LockFile;
use crate::store::ArtifactStore;

/// Directory, relative to the project root, holding cached content.
pub const CACHE_DIR: &str = ".skc-cache";

const ARTIFACTS_SUBDIR: &str = "artifacts";

/// Lockfile plus content store for one project root.
#[derive(Debug)]
pub struct Cache {
    root: PathBuf,
    lock: LockFile,
    store: ArtifactStore,
    tool_version: String,
    dirty: bool,
}

impl Cache {
    /// Loads the lockfile under `root`, or starts empty.
    pub fn load_or_create(root: &Path, tool_version: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            lock: LockFile::load_or_default(root),
            store: ArtifactStore::new(&root.join(CACHE_DIR).join(ARTIFACTS_SUBDIR)),
            tool_version: tool_version.to_string(),
            dirty: false,
        }
    }

    /// The current lockfile.
    pub fn lock(&self) -> &LockFile {
        &self.lock
    }

    /// Returns `true` if the artifact was last generated from this input.
    pub fn is_up_to_date(&self, id: &str, input_hash: &ContentHash) -> bool {
        self.lock.is_up_to_date(id, input_hash)
    }

    /// Content from the artifact's last recorded generation, if still stored.
    pub fn previous_content(&self, id: &str) -> Option<String> {
        let entry = self.lock.entry(id)?;
        let bytes = self.store.read(&entry.output_hash)?;
        String::from_utf8(bytes).ok()
    }

    /// Records a successful generation: stores the content and updates the
    /// lockfile entry. Returns the output hash.
    pub fn record(
        &mut self,
        id: &str,
        input_hash: ContentHash,
        content: &str,
        model: &str,
    ) -> Result<ContentHash, CacheError> {
        let output_hash = output_fingerprint(content);
        self.store
            .write(&output_hash, content.as_bytes(), &self.tool_version)?;
        self.lock.update_entry(id, input_hash, output_hash, model);
        self.dirty = true;
        Ok(output_hash)
    }

    /// Writes the lockfile if anything was recorded, then drops content no
    /// longer referenced. Returns whether the lockfile was written.
    pub fn save(&mut self) -> Result<bool, CacheError> {
        if !self.dirty {
            return Ok(false);
        }
        self.lock.save(&self.root)?;
        self.dirty = false;
        let removed = self.gc()?;
        tracing::debug!(removed, "lockfile saved");
        Ok(true)
    }

    /// Removes stored content not referenced by the lockfile.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let live: Vec<ContentHash> = self
            .lock
            .artifacts
            .values()
            .map(|e| e.output_hash)
            .collect();
        self.store.gc(&live)
    }
}
