//! Error types for generation, writing and drift checks.

use std::path::PathBuf;

use skc_cache::CacheError;
use skc_provider::ProviderError;
use thiserror::Error;

use crate::artifact::ArtifactId;

/// An artifact id that is not one of the known artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown artifact `{0}`")]
pub struct UnknownArtifact(pub String);

/// Failures that abort a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A provider call failed or was cancelled.
    #[error("generating {artifact}: {source}")]
    Generation {
        /// The artifact being generated.
        artifact: ArtifactId,
        /// What the provider reported.
        source: ProviderError,
    },

    /// The allow-list named no known artifact.
    #[error("no known artifact in `{requested}` (known: {known})")]
    NoArtifacts {
        /// The allow-list as given.
        requested: String,
        /// Every valid artifact id.
        known: String,
    },

    /// Generation was requested without a provider.
    #[error("no provider configured")]
    MissingProvider,

    /// The IR could not be serialized for prompting or hashing.
    #[error("serializing IR: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A generation task panicked or was aborted.
    #[error("generation task failed: {0}")]
    Join(String),
}

impl PipelineError {
    /// Returns `true` if the run stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Generation {
                source: ProviderError::Cancelled,
                ..
            }
        )
    }
}

/// An output file could not be written.
#[derive(Debug, Error)]
#[error("writing {}: {source}", path.display())]
pub struct WriteError {
    /// The file or directory being written.
    pub path: PathBuf,
    /// Underlying I/O error.
    pub source: std::io::Error,
}

/// An output file could not be read while comparing directories.
#[derive(Debug, Error)]
#[error("reading {}: {source}", path.display())]
pub struct DriftError {
    /// The file or directory being read.
    pub path: PathBuf,
    /// Underlying I/O error.
    pub source: std::io::Error,
}

/// Failures of a full generate session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Generation failed; nothing was written.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Writing outputs failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Recording or saving the cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}
