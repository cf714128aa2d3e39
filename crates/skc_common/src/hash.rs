//! Content hashing for artifact fingerprints.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 256-bit SHA-256 content hash.
///
/// Used as the fingerprint of an artifact's generation inputs and of its
/// produced output. Serialized as a 64-character lower-case hex string so the
/// lockfile stays human-readable and diff-friendly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Computes the hash of a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Computes the hash of a UTF-8 string.
    pub fn from_str_content(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Parses a hash from its 64-character hex representation.
    pub fn from_hex(text: &str) -> Result<Self, ParseHashError> {
        let bytes = hex::decode(text.trim()).map_err(|_| ParseHashError::InvalidHex {
            input: text.to_string(),
        })?;
        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| ParseHashError::WrongLength {
            actual: b.len(),
        })?;
        Ok(Self(array))
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the first eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a hex string is not a valid [`ContentHash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHashError {
    /// The input contained non-hex characters or had an odd length.
    #[error("invalid hex digest: {input:?}")]
    InvalidHex {
        /// The rejected input.
        input: String,
    },
    /// The input decoded to the wrong number of bytes.
    #[error("digest must be 32 bytes, got {actual}")]
    WrongLength {
        /// Number of bytes decoded.
        actual: usize,
    },
}

/// Incremental hasher over an ordered list of components.
///
/// Each component is followed by a NUL separator, so moving bytes from one
/// component to the next yields a different digest.
#[derive(Clone, Default)]
pub struct HashBuilder {
    hasher: Sha256,
}

impl HashBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one component.
    pub fn component(mut self, data: impl AsRef<[u8]>) -> Self {
        self.hasher.update(data.as_ref());
        self.hasher.update([0u8]);
        self
    }

    /// Consumes the builder and returns the digest.
    pub fn finish(self) -> ContentHash {
        ContentHash(self.hasher.finalize().into())
    }
}
