//! Artifact generation pipeline.
//!
//! Turns a merged [`IntermediateRepr`](skc_ir::IntermediateRepr) and the
//! parsed instructions into the eight documentation artifacts. Independent
//! artifacts are generated concurrently; the changelog runs after them and
//! sees their output. The [`session`] module wires the pipeline to the
//! fingerprint cache and the output directory.

#![warn(missing_docs)]

pub mod artifact;
pub mod changelog;
pub mod drift;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod result;
pub mod session;
pub mod templates;
pub mod writer;

pub use artifact::ArtifactId;
pub use changelog::prepend_changelog_entry;
pub use drift::{input_drift, output_drift, OutputChange};
pub use error::{DriftError, PipelineError, SessionError, UnknownArtifact, WriteError};
pub use pipeline::{Pipeline, PipelineOptions, Plan, PlannedArtifact, PreviousContent};
pub use result::{GenerationResult, GenerationStatus, Usage};
pub use session::{generate, load_previous_content, GenerateOutcome};
pub use writer::{preview_changes, split_scripts, write_results, PendingChange};
