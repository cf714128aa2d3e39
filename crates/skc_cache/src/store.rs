//! Content-addressed storage for generated artifact text.
//!
//! Each entry lives at `<dir>/<output-hash>.txt` and starts with a binary
//! header (magic, format version, tool version, checksum) so truncated or
//! foreign files are detected and treated as misses.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skc_common::ContentHash;

use crate::error::CacheError;

/// Magic bytes identifying a stored artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"SKCA";

/// Current format version. Increment on breaking header or payload changes.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ARTIFACT_EXT: &str = "txt";

/// Header prepended to every stored artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Must be `b"SKCA"`.
    pub magic: [u8; 4],

    /// Format version.
    pub format_version: u32,

    /// Version of the tool that wrote the entry.
    pub tool_version: String,

    /// Hash of the payload.
    pub checksum: ContentHash,
}

/// Directory of stored artifacts keyed by content hash.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at `dir`. Nothing is created until a write.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path of the entry for `key`.
    pub fn path_for(&self, key: &ContentHash) -> PathBuf {
        self.dir.join(format!("{key}.{ARTIFACT_EXT}"))
    }

    /// Stores `data` under `key` and returns the file path.
    ///
    /// File layout: 4-byte little-endian header length, bincode header,
    /// payload.
    pub fn write(
        &self,
        key: &ContentHash,
        data: &[u8],
        tool_version: &str,
    ) -> Result<PathBuf, CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            checksum: ContentHash::from_bytes(data),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        let path = self.path_for(key);
        std::fs::write(&path, &output).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Reads and validates the entry for `key`.
    pub fn read_checked(&self, key: &ContentHash) -> Result<Vec<u8>, CacheError> {
        let path = self.path_for(key);
        let raw = std::fs::read(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        let invalid = |reason: &str| CacheError::InvalidHeader {
            path: path.clone(),
            reason: reason.to_string(),
        };

        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid("file shorter than header length"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_bytes = raw
            .get(4..4 + header_len)
            .ok_or_else(|| invalid("truncated header"))?;
        let (header, _): (ArtifactHeader, usize) =
            bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != ARTIFACT_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path,
                expected: ARTIFACT_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[4 + header_len..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path,
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(payload.to_vec())
    }

    /// Reads the entry for `key`, treating any problem as a miss.
    pub fn read(&self, key: &ContentHash) -> Option<Vec<u8>> {
        match self.read_checked(key) {
            Ok(data) => Some(data),
            Err(CacheError::Io { .. }) => None,
            Err(e) => {
                tracing::debug!("cache miss: {e}");
                None
            }
        }
    }

    /// Removes entries whose key is not in `live`. Returns the number removed.
    pub fn gc(&self, live: &[ContentHash]) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let live: Vec<String> = live.iter().map(ContentHash::to_string).collect();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| CacheError::Io {
                    path: self.dir.clone(),
                    source: e,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !live.iter().any(|k| k == stem) {
                std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(&dir.path().join("artifacts"));
        (dir, store)
    }

    #[test]
    fn write_then_read() {
        let (_dir, store) = store();
        let data = "# Skill\n\nUse it.\n";
        let key = ContentHash::from_str_content(data);
        let path = store.write(&key, data.as_bytes(), "0.1.0").unwrap();
        assert!(path.ends_with(format!("{key}.txt")));
        assert_eq!(store.read(&key).unwrap(), data.as_bytes());
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let (_dir, store) = store();
        assert!(store.read(&ContentHash::from_bytes(b"nope")).is_none());
    }

    #[test]
    fn corrupted_payload_is_detected() {
        let (_dir, store) = store();
        let key = ContentHash::from_bytes(b"payload");
        let path = store.write(&key, b"payload", "0.1.0").unwrap();
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, raw).unwrap();

        assert!(matches!(
            store.read_checked(&key),
            Err(CacheError::ChecksumMismatch { .. })
        ));
        assert!(store.read(&key).is_none());
    }

    #[test]
    fn foreign_file_is_invalid() {
        let (_dir, store) = store();
        let key = ContentHash::from_bytes(b"x");
        std::fs::create_dir_all(store.path_for(&key).parent().unwrap()).unwrap();
        std::fs::write(store.path_for(&key), b"ab").unwrap();
        assert!(matches!(
            store.read_checked(&key),
            Err(CacheError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn gc_keeps_live_entries() {
        let (_dir, store) = store();
        let a = ContentHash::from_bytes(b"a");
        let b = ContentHash::from_bytes(b"b");
        store.write(&a, b"a", "0.1.0").unwrap();
        store.write(&b, b"b", "0.1.0").unwrap();

        assert_eq!(store.gc(&[a]).unwrap(), 1);
        assert!(store.read(&a).is_some());
        assert!(store.read(&b).is_none());
    }

    #[test]
    fn gc_on_missing_dir_is_noop() {
        let (_dir, store) = store();
        assert_eq!(store.gc(&[]).unwrap(), 0);
    }
}
