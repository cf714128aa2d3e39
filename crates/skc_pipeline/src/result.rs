//! Per-artifact outcomes.

use std::path::PathBuf;
use std::time::Duration;

use skc_common::ContentHash;

use crate::artifact::ArtifactId;

/// How an artifact was handled in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// The provider produced fresh content.
    Generated,
    /// The fingerprint matched the lockfile; nothing was requested.
    Skipped,
    /// Dry run placeholder.
    DryRun {
        /// Estimated prompt size in tokens.
        estimated_tokens: usize,
    },
}

/// Token accounting for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Usage {
    /// Model reported by the provider.
    pub model: String,
    /// Prompt tokens.
    pub tokens_in: u64,
    /// Completion tokens.
    pub tokens_out: u64,
}

/// The outcome for a single artifact.
///
/// Failures never produce a result; they abort the run with a
/// [`PipelineError`](crate::PipelineError) instead.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Which artifact.
    pub id: ArtifactId,
    /// Output path relative to the output directory.
    pub path: PathBuf,
    /// Generated text. Empty when skipped.
    pub content: String,
    /// Fingerprint of the inputs this result was produced from.
    pub input_hash: ContentHash,
    /// What happened.
    pub status: GenerationStatus,
    /// Provider usage, for generated results.
    pub usage: Option<Usage>,
    /// Wall time of the generation call.
    pub elapsed: Duration,
}

impl GenerationResult {
    /// A cache hit: no content, nothing to write or record.
    pub fn skipped(id: ArtifactId, path: PathBuf, input_hash: ContentHash) -> Self {
        Self {
            id,
            path,
            content: String::new(),
            input_hash,
            status: GenerationStatus::Skipped,
            usage: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns `true` if this result carries fresh provider output.
    pub fn is_generated(&self) -> bool {
        self.status == GenerationStatus::Generated
    }

    /// Returns `true` if there is fresh output to write and record. An
    /// empty reply counts as nothing to write.
    pub fn has_output(&self) -> bool {
        self.is_generated() && !self.content.is_empty()
    }

    /// Short status label for progress output.
    pub fn status_label(&self) -> &'static str {
        match self.status {
            GenerationStatus::Generated => "generated",
            GenerationStatus::Skipped => "skipped",
            GenerationStatus::DryRun { .. } => "dry-run",
        }
    }
}
