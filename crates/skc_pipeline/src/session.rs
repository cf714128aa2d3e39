//! One `generate` invocation: plan against the cache, run the pipeline,
//! write outputs, record fingerprints.

use std::fs;
use std::path::PathBuf;

use skc_cache::Cache;
use tokio_util::sync::CancellationToken;

use crate::artifact::ArtifactId;
use crate::error::SessionError;
use crate::pipeline::{Pipeline, PreviousContent};
use crate::result::GenerationResult;
use crate::writer::{preview_changes, write_results, PendingChange};

/// Artifacts whose previous content feeds the changelog.
const HISTORY: [ArtifactId; 4] = [
    ArtifactId::Skill,
    ArtifactId::Reference,
    ArtifactId::Examples,
    ArtifactId::Changelog,
];

/// What a session did.
#[derive(Debug, Default)]
pub struct GenerateOutcome {
    /// Per-artifact results in generation order. Empty when up to date.
    pub results: Vec<GenerationResult>,
    /// Every enabled artifact matched the lockfile; nothing ran.
    pub up_to_date: bool,
    /// Files written, relative to the output directory.
    pub written: Vec<PathBuf>,
    /// Changes `--diff` mode found instead of writing.
    pub pending: Vec<PendingChange>,
    /// Whether the lockfile was rewritten.
    pub lock_saved: bool,
}

/// Previous content of the changelog inputs: the cached copy from the last
/// recorded generation, else whatever is in the output directory.
pub fn load_previous_content(pipeline: &Pipeline, cache: &Cache) -> PreviousContent {
    let output_dir = &pipeline.options().output_dir;
    HISTORY
        .into_iter()
        .filter_map(|id| {
            let content = cache
                .previous_content(id.as_str())
                .or_else(|| fs::read_to_string(output_dir.join(pipeline.output_path(id))).ok())?;
            Some((id, content))
        })
        .collect()
}

/// Runs a full generation against `cache`.
///
/// On any failure nothing further happens: a generation error leaves the
/// output directory and lockfile untouched, a write error leaves the
/// lockfile untouched. Dry runs and `--diff` never write or record.
pub async fn generate(
    pipeline: &Pipeline,
    cache: &mut Cache,
    cancel: CancellationToken,
) -> Result<GenerateOutcome, SessionError> {
    let options = pipeline.options();
    let plan = pipeline.plan(cache.lock());
    if plan.all_up_to_date() {
        tracing::info!("all artifacts up to date");
        return Ok(GenerateOutcome {
            up_to_date: true,
            ..Default::default()
        });
    }

    let previous = load_previous_content(pipeline, cache);
    let results = pipeline.run(&plan, &previous, cancel).await?;

    if options.dry_run {
        return Ok(GenerateOutcome {
            results,
            ..Default::default()
        });
    }
    if options.diff {
        let pending = preview_changes(&options.output_dir, &results);
        return Ok(GenerateOutcome {
            results,
            pending,
            ..Default::default()
        });
    }

    for result in results.iter().filter(|r| r.is_generated() && !r.has_output()) {
        tracing::warn!(artifact = %result.id, "provider returned no content, keeping previous output");
    }
    let written = write_results(&options.output_dir, &results)?;
    for result in results.iter().filter(|r| r.has_output()) {
        let model = result.usage.as_ref().map_or("", |u| u.model.as_str());
        cache.record(result.id.as_str(), result.input_hash, &result.content, model)?;
    }
    let lock_saved = cache.save()?;
    tracing::info!(
        written = written.len(),
        output = %options.output_dir.display(),
        "generation complete"
    );

    Ok(GenerateOutcome {
        results,
        up_to_date: false,
        written,
        pending: Vec::new(),
        lock_saved,
    })
}
