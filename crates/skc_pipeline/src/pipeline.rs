//! The generation pipeline: plan, fan out, barrier, dependent artifacts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use skc_cache::{input_fingerprint, LockFile};
use skc_common::ContentHash;
use skc_config::Instructions;
use skc_ir::IntermediateRepr;
use skc_provider::{GenerateRequest, Provider, ProviderError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::artifact::ArtifactId;
use crate::changelog::prepend_changelog_entry;
use crate::error::PipelineError;
use crate::prompt::{estimate_tokens, relevant_sections, user_message, ChangelogInputs};
use crate::result::{GenerationResult, GenerationStatus, Usage};

/// Content of earlier generations, by artifact.
pub type PreviousContent = BTreeMap<ArtifactId, String>;

/// Run options.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,
    /// Explicit allow-list of artifact ids. Empty means "use the toggles".
    pub only: Vec<String>,
    /// Regenerate everything regardless of the lockfile.
    pub force: bool,
    /// Estimate prompts without calling the provider.
    pub dry_run: bool,
    /// Report pending changes instead of writing.
    pub diff: bool,
    /// Log prompt sizes and token usage.
    pub verbose: bool,
    /// Model override forwarded with every request.
    pub model: Option<String>,
}

/// One enabled artifact and whether it needs generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArtifact {
    /// The artifact.
    pub id: ArtifactId,
    /// Current input fingerprint.
    pub input_hash: ContentHash,
    /// `false` when the lockfile already has this fingerprint.
    pub stale: bool,
}

/// The enabled artifacts of a run, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Planned artifacts.
    pub artifacts: Vec<PlannedArtifact>,
}

impl Plan {
    /// Returns `true` if no artifact needs generating.
    pub fn all_up_to_date(&self) -> bool {
        self.artifacts.iter().all(|a| !a.stale)
    }

    /// Ids that need generating.
    pub fn stale_ids(&self) -> Vec<ArtifactId> {
        self.artifacts
            .iter()
            .filter(|a| a.stale)
            .map(|a| a.id)
            .collect()
    }

    fn get(&self, id: ArtifactId) -> Option<&PlannedArtifact> {
        self.artifacts.iter().find(|a| a.id == id)
    }
}

/// Generates artifacts from one IR and one set of instructions.
pub struct Pipeline {
    provider: Option<Arc<dyn Provider>>,
    instructions: Arc<Instructions>,
    options: PipelineOptions,
    ir_canonical: String,
    ir_pretty: Arc<str>,
}

impl Pipeline {
    /// Prepares a pipeline. The IR is serialized once, canonically for
    /// hashing and pretty-printed for prompts.
    pub fn new(
        ir: &IntermediateRepr,
        instructions: Instructions,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        check_allow_list(&options.only)?;
        Ok(Self {
            provider: None,
            instructions: Arc::new(instructions),
            options,
            ir_canonical: ir.canonical_json()?,
            ir_pretty: Arc::from(ir.pretty_json()?),
        })
    }

    /// Sets the provider used for generation calls.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// The run options.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// The instructions the pipeline prompts with.
    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// Artifacts this run covers, in generation order.
    ///
    /// A non-empty allow-list wins: ids are trimmed and lower-cased,
    /// unknown ids are ignored, duplicates collapse. Otherwise every
    /// artifact not disabled in the frontmatter is enabled.
    pub fn enabled_artifacts(&self) -> Vec<ArtifactId> {
        if !self.options.only.is_empty() {
            let wanted: Vec<ArtifactId> = self
                .options
                .only
                .iter()
                .filter_map(|s| ArtifactId::parse(s))
                .collect();
            return ArtifactId::ALL
                .into_iter()
                .filter(|id| wanted.contains(id))
                .collect();
        }
        let toggles = &self.instructions.frontmatter.artifacts;
        ArtifactId::ALL
            .into_iter()
            .filter(|id| toggles.get(id.as_str()).map_or(true, |t| t.is_enabled()))
            .collect()
    }

    /// Output path of an artifact, relative to the output directory.
    pub fn output_path(&self, id: ArtifactId) -> PathBuf {
        let filename = self
            .instructions
            .frontmatter
            .artifacts
            .get(id.as_str())
            .and_then(|t| t.filename());
        id.output_path(self.instructions.name(), filename)
    }

    /// Input fingerprint of an artifact: canonical IR, relevant sections
    /// and the prompt template.
    pub fn input_hash(&self, id: ArtifactId) -> ContentHash {
        let sections = relevant_sections(id, &self.instructions.sections);
        input_fingerprint(&self.ir_canonical, &sections, id.template())
    }

    /// Compares every enabled artifact against the lockfile.
    ///
    /// With `force` or `dry_run` every artifact is stale.
    pub fn plan(&self, lock: &LockFile) -> Plan {
        let bypass = self.options.force || self.options.dry_run;
        let artifacts = self
            .enabled_artifacts()
            .into_iter()
            .map(|id| {
                let input_hash = self.input_hash(id);
                let stale = bypass || !lock.is_up_to_date(id.as_str(), &input_hash);
                PlannedArtifact {
                    id,
                    input_hash,
                    stale,
                }
            })
            .collect();
        let plan = Plan { artifacts };
        tracing::info!(
            enabled = plan.artifacts.len(),
            stale = plan.stale_ids().len(),
            "planned generation"
        );
        plan
    }

    /// Executes a plan.
    ///
    /// Independent stale artifacts are generated concurrently; up-to-date
    /// ones yield skipped results. The changelog is generated only after
    /// every other call succeeded, and its content is merged with the
    /// previous changelog. Any failure aborts the run and discards the
    /// results gathered so far. Results come back in generation order.
    pub async fn run(
        &self,
        plan: &Plan,
        previous: &PreviousContent,
        cancel: CancellationToken,
    ) -> Result<Vec<GenerationResult>, PipelineError> {
        if self.options.dry_run {
            return Ok(self.dry_run(plan, previous));
        }
        let provider = self.provider.clone().ok_or(PipelineError::MissingProvider)?;

        let mut results = Vec::with_capacity(plan.artifacts.len());
        let independent: Vec<&PlannedArtifact> =
            plan.artifacts.iter().filter(|a| !a.id.is_dependent()).collect();
        for planned in independent.iter().filter(|a| !a.stale) {
            tracing::debug!(artifact = %planned.id, "skipping, inputs unchanged");
            results.push(self.skipped(planned));
        }

        let generated = self
            .fan_out(&provider, independent.iter().filter(|a| a.stale).copied(), &cancel)
            .await?;
        results.extend(generated);

        if let Some(planned) = plan.get(ArtifactId::Changelog) {
            let changelog = if planned.stale {
                self.generate_changelog(&provider, planned, &results, previous, &cancel)
                    .await?
            } else {
                self.skipped(planned)
            };
            results.push(changelog);
        }

        results.sort_by_key(|r| r.id);
        Ok(results)
    }

    /// Launches one task per artifact and drains them. The first failure
    /// cancels the remaining calls.
    async fn fan_out<'a>(
        &self,
        provider: &Arc<dyn Provider>,
        artifacts: impl Iterator<Item = &'a PlannedArtifact>,
        cancel: &CancellationToken,
    ) -> Result<Vec<GenerationResult>, PipelineError> {
        let batch = cancel.child_token();
        let accumulator: Arc<Mutex<Vec<GenerationResult>>> = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for planned in artifacts {
            let call = Call {
                id: planned.id,
                path: self.output_path(planned.id),
                input_hash: planned.input_hash,
                request: self.request(planned.id, None),
                verbose: self.options.verbose,
            };
            let provider = Arc::clone(provider);
            let accumulator = Arc::clone(&accumulator);
            let cancel = batch.clone();
            tasks.spawn(async move {
                let result = call.execute(provider.as_ref(), &cancel).await?;
                push_result(&accumulator, result)
            });
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| PipelineError::Join(e.to_string())).and_then(|r| r);
            if let Err(err) = outcome {
                batch.cancel();
                // Keep the root cause rather than the sibling cancellations it triggers.
                if failure.as_ref().map_or(true, PipelineError::is_cancelled) {
                    failure = Some(err);
                }
            }
        }
        if let Some(err) = failure {
            tracing::warn!(error = %err, "generation failed, discarding results");
            return Err(err);
        }

        let mut acc = accumulator
            .lock()
            .map_err(|_| PipelineError::Join("result accumulator poisoned".to_string()))?;
        Ok(std::mem::take(&mut *acc))
    }

    async fn generate_changelog(
        &self,
        provider: &Arc<dyn Provider>,
        planned: &PlannedArtifact,
        results: &[GenerationResult],
        previous: &PreviousContent,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, PipelineError> {
        let current = current_content(results, previous);
        let inputs = ChangelogInputs {
            current: &current,
            previous,
        };
        let call = Call {
            id: planned.id,
            path: self.output_path(planned.id),
            input_hash: planned.input_hash,
            request: self.request(planned.id, Some(inputs)),
            verbose: self.options.verbose,
        };
        let mut result = call.execute(provider.as_ref(), cancel).await?;
        let existing = previous
            .get(&ArtifactId::Changelog)
            .map(String::as_str)
            .unwrap_or_default();
        result.content = prepend_changelog_entry(&result.content, existing);
        Ok(result)
    }

    fn dry_run(&self, plan: &Plan, previous: &PreviousContent) -> Vec<GenerationResult> {
        let current = PreviousContent::new();
        plan.artifacts
            .iter()
            .map(|planned| {
                let inputs = ChangelogInputs {
                    current: &current,
                    previous,
                };
                let request = self.request(planned.id, Some(inputs));
                let estimated_tokens =
                    estimate_tokens(&request.system_prompt) + estimate_tokens(&request.user_message);
                GenerationResult {
                    id: planned.id,
                    path: self.output_path(planned.id),
                    content: format!(
                        "[dry-run] Would generate {} (~{estimated_tokens} input tokens)",
                        planned.id
                    ),
                    input_hash: planned.input_hash,
                    status: GenerationStatus::DryRun { estimated_tokens },
                    usage: None,
                    elapsed: Default::default(),
                }
            })
            .collect()
    }

    fn skipped(&self, planned: &PlannedArtifact) -> GenerationResult {
        GenerationResult::skipped(planned.id, self.output_path(planned.id), planned.input_hash)
    }

    fn request(&self, id: ArtifactId, changelog: Option<ChangelogInputs<'_>>) -> GenerateRequest {
        GenerateRequest {
            system_prompt: id.template().to_string(),
            user_message: user_message(id, &self.instructions, &self.ir_pretty, changelog),
            max_tokens: id.max_tokens(),
            model: self.options.model.clone(),
        }
    }
}

/// Content each changelog input has after this run: fresh output where the
/// artifact was generated, the previous content where it was skipped.
/// Warns about unknown ids; an allow-list with no known id at all is an
/// error rather than an empty run.
fn check_allow_list(only: &[String]) -> Result<(), PipelineError> {
    let mut known = 0;
    for name in only {
        if ArtifactId::parse(name).is_some() {
            known += 1;
        } else {
            tracing::warn!(artifact = %name.trim(), "ignoring unknown artifact");
        }
    }
    if !only.is_empty() && known == 0 {
        return Err(PipelineError::NoArtifacts {
            requested: only.join(","),
            known: ArtifactId::ALL.map(ArtifactId::as_str).join(", "),
        });
    }
    Ok(())
}

/// Adds a finished result to the shared accumulator.
fn push_result(
    accumulator: &Mutex<Vec<GenerationResult>>,
    result: GenerationResult,
) -> Result<(), PipelineError> {
    accumulator
        .lock()
        .map_err(|_| PipelineError::Join("result accumulator poisoned".to_string()))?
        .push(result);
    Ok(())
}

fn current_content(results: &[GenerationResult], previous: &PreviousContent) -> PreviousContent {
    let mut current = PreviousContent::new();
    for result in results {
        let content = if result.has_output() {
            Some(result.content.clone())
        } else {
            previous.get(&result.id).cloned()
        };
        if let Some(content) = content {
            current.insert(result.id, content);
        }
    }
    current
}

/// A fully prepared generation call, movable into a task.
struct Call {
    id: ArtifactId,
    path: PathBuf,
    input_hash: ContentHash,
    request: GenerateRequest,
    verbose: bool,
}

impl Call {
    async fn execute(
        self,
        provider: &dyn Provider,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, PipelineError> {
        let id = self.id;
        if self.verbose {
            tracing::debug!(
                artifact = %id,
                system_chars = self.request.system_prompt.len(),
                user_chars = self.request.user_message.len(),
                "prompt assembled"
            );
        }
        tracing::info!(artifact = %id, provider = provider.name(), "generating");

        let start = Instant::now();
        let response = tokio::select! {
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            response = provider.generate(self.request) => response,
        }
        .map_err(|source| PipelineError::Generation {
            artifact: id,
            source,
        })?;
        let elapsed = start.elapsed();

        tracing::debug!(
            artifact = %id,
            tokens_in = response.tokens_in,
            tokens_out = response.tokens_out,
            elapsed_ms = elapsed.as_millis() as u64,
            "generated"
        );
        Ok(GenerationResult {
            id,
            path: self.path,
            content: response.content,
            input_hash: self.input_hash,
            status: GenerationStatus::Generated,
            usage: Some(Usage {
                model: response.model,
                tokens_in: response.tokens_in,
                tokens_out: response.tokens_out,
            }),
            elapsed,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use skc_ir::Operation;
    use skc_provider::GenerateResponse;

    use super::*;

    /// Answers every request with `<artifact marker>:v<n>` and counts calls.
    pub(crate) struct ScriptedProvider {
        pub calls: AtomicUsize,
        pub fail_on: Option<&'static str>,
        pub requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedProvider {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_on(template_prefix: &'static str) -> Self {
            Self {
                fail_on: Some(template_prefix),
                ..Self::new()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().unwrap().push(request.clone());
            if self
                .fail_on
                .is_some_and(|prefix| request.system_prompt.starts_with(prefix))
            {
                return Err(ProviderError::Api {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            let marker = ArtifactId::ALL
                .into_iter()
                .find(|id| id.template() == request.system_prompt)
                .map_or("unknown", ArtifactId::as_str);
            Ok(GenerateResponse {
                content: format!("{marker}:v{n}"),
                model: "scripted-1".to_string(),
                tokens_in: 10,
                tokens_out: 5,
            })
        }
    }

    /// Never answers; only cancellation ends its calls.
    struct HangingProvider;

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        fn model(&self) -> &str {
            "hanging-1"
        }

        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::Decode("unreachable".to_string()))
        }
    }

    pub(crate) fn sample_ir() -> IntermediateRepr {
        let mut ir = IntermediateRepr::new();
        ir.operations.push(Operation::new("listPets", "GET", "/pets"));
        ir.operations.push(Operation::new("getPet", "GET", "/pets/{id}"));
        ir
    }

    pub(crate) fn sample_instructions(extra: &str) -> Instructions {
        let text = format!(
            "---\nname: petstore\n{extra}---\n\n# Product\nA pet store.\n\n# Workflows\nBuy a pet.\n"
        );
        Instructions::parse_str(&text).unwrap()
    }

    fn pipeline(options: PipelineOptions, provider: Arc<dyn Provider>) -> Pipeline {
        Pipeline::new(&sample_ir(), sample_instructions(""), options)
            .unwrap()
            .with_provider(provider)
    }

    fn ids(results: &[GenerationResult]) -> Vec<ArtifactId> {
        results.iter().map(|r| r.id).collect()
    }

    #[test]
    fn allow_list_is_normalised() {
        let options = PipelineOptions {
            only: vec![" LLMS ".into(), "skill".into(), "bogus".into(), "skill".into()],
            ..Default::default()
        };
        let p = pipeline(options, Arc::new(ScriptedProvider::new()));
        assert_eq!(p.enabled_artifacts(), vec![ArtifactId::Skill, ArtifactId::Llms]);
    }

    #[test]
    fn allow_list_without_known_ids_is_rejected() {
        let options = PipelineOptions {
            only: vec!["bogus".into(), "readme".into()],
            ..Default::default()
        };
        let err = match Pipeline::new(&sample_ir(), sample_instructions(""), options) {
            Err(err) => err,
            Ok(_) => panic!("expected an allow-list error"),
        };
        assert!(matches!(err, PipelineError::NoArtifacts { .. }));
        let message = err.to_string();
        assert!(message.contains("bogus,readme"));
        assert!(message.contains("llms-api"));
    }

    #[test]
    fn poisoned_accumulator_fails_the_push() {
        let accumulator = Arc::new(Mutex::new(Vec::new()));
        let poisoner = Arc::clone(&accumulator);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the accumulator");
        })
        .join();

        let result = GenerationResult::skipped(
            ArtifactId::Llms,
            PathBuf::from("llms.txt"),
            ContentHash::from_str_content(""),
        );
        let err = push_result(&accumulator, result).unwrap_err();
        assert!(matches!(err, PipelineError::Join(_)));
    }

    #[test]
    fn frontmatter_toggles_disable_artifacts() {
        let inst = sample_instructions(
            "artifacts:\n  scripts: false\n  llms-full:\n    enabled: false\n  skill:\n    filename: README.md\n",
        );
        let p = Pipeline::new(&sample_ir(), inst, PipelineOptions::default()).unwrap();
        let enabled = p.enabled_artifacts();
        assert_eq!(enabled.len(), 6);
        assert!(!enabled.contains(&ArtifactId::Scripts));
        assert!(!enabled.contains(&ArtifactId::LlmsFull));
        assert_eq!(p.output_path(ArtifactId::Skill), PathBuf::from("petstore/README.md"));
    }

    #[test]
    fn input_hash_depends_only_on_relevant_sections() {
        let base = Pipeline::new(&sample_ir(), sample_instructions(""), Default::default()).unwrap();
        let text = "---\nname: petstore\n---\n\n# Product\nA pet store.\n\n# Workflows\nSell a pet.\n";
        let edited = Pipeline::new(
            &sample_ir(),
            Instructions::parse_str(text).unwrap(),
            Default::default(),
        )
        .unwrap();
        assert_eq!(base.input_hash(ArtifactId::Llms), edited.input_hash(ArtifactId::Llms));
        assert_eq!(base.input_hash(ArtifactId::Reference), edited.input_hash(ArtifactId::Reference));
        assert_ne!(base.input_hash(ArtifactId::Examples), edited.input_hash(ArtifactId::Examples));
        assert_ne!(base.input_hash(ArtifactId::Skill), edited.input_hash(ArtifactId::Skill));
    }

    #[test]
    fn plan_marks_recorded_artifacts_fresh() {
        let p = pipeline(PipelineOptions::default(), Arc::new(ScriptedProvider::new()));
        let mut lock = LockFile::new();
        let out = ContentHash::from_str_content("x");
        lock.update_entry("skill", p.input_hash(ArtifactId::Skill), out, "m");
        lock.update_entry("llms", ContentHash::from_str_content("old"), out, "m");

        let plan = p.plan(&lock);
        assert!(!plan.all_up_to_date());
        assert!(!plan.stale_ids().contains(&ArtifactId::Skill));
        assert!(plan.stale_ids().contains(&ArtifactId::Llms));
        assert_eq!(plan.stale_ids().len(), 7);
    }

    #[test]
    fn force_marks_everything_stale() {
        let options = PipelineOptions {
            force: true,
            ..Default::default()
        };
        let p = pipeline(options, Arc::new(ScriptedProvider::new()));
        let mut lock = LockFile::new();
        for id in ArtifactId::ALL {
            lock.update_entry(id.as_str(), p.input_hash(id), ContentHash::from_str_content(""), "m");
        }
        assert_eq!(p.plan(&lock).stale_ids().len(), 8);

        let unforced = pipeline(PipelineOptions::default(), Arc::new(ScriptedProvider::new()));
        assert!(unforced.plan(&lock).all_up_to_date());
    }

    #[tokio::test]
    async fn generates_everything_then_changelog() {
        let provider = Arc::new(ScriptedProvider::new());
        let p = pipeline(PipelineOptions::default(), provider.clone());
        let plan = p.plan(&LockFile::new());
        let results = p
            .run(&plan, &PreviousContent::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 8);
        assert_eq!(ids(&results), ArtifactId::ALL.to_vec());
        assert!(results.iter().all(GenerationResult::is_generated));

        // The changelog call is always the last one and sees this run's skill.
        let requests = provider.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.system_prompt, ArtifactId::Changelog.template());
        assert!(last.user_message.contains("## Current skill\nskill:v"));
        assert!(last.user_message.contains("first generation"));
    }

    #[tokio::test]
    async fn skipped_artifacts_make_no_calls() {
        let provider = Arc::new(ScriptedProvider::new());
        let p = pipeline(PipelineOptions::default(), provider.clone());
        let mut lock = LockFile::new();
        for id in [ArtifactId::Skill, ArtifactId::Reference, ArtifactId::Changelog] {
            lock.update_entry(id.as_str(), p.input_hash(id), ContentHash::from_str_content(""), "m");
        }
        let plan = p.plan(&lock);
        let results = p
            .run(&plan, &PreviousContent::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 5);
        let skill = &results[0];
        assert_eq!(skill.status, GenerationStatus::Skipped);
        assert!(skill.content.is_empty());
        assert_eq!(results.last().unwrap().status, GenerationStatus::Skipped);
    }

    #[tokio::test]
    async fn failure_blocks_changelog() {
        let provider = Arc::new(ScriptedProvider::failing_on("You write complete reference"));
        let p = pipeline(PipelineOptions::default(), provider.clone());
        let plan = p.plan(&LockFile::new());
        let err = p
            .run(&plan, &PreviousContent::new(), CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PipelineError::Generation { artifact, .. } => assert_eq!(artifact, ArtifactId::Reference),
            other => panic!("unexpected error: {other}"),
        }
        let requests = provider.requests.lock().unwrap();
        assert!(requests
            .iter()
            .all(|r| r.system_prompt != ArtifactId::Changelog.template()));
    }

    #[tokio::test]
    async fn changelog_prepends_previous_entries() {
        let provider = Arc::new(ScriptedProvider::new());
        let options = PipelineOptions {
            only: vec!["changelog".into()],
            ..Default::default()
        };
        let p = pipeline(options, provider.clone());
        let previous = PreviousContent::from([(
            ArtifactId::Changelog,
            "# Changelog\n\n## 2026-01-01\n- Initial\n".to_string(),
        )]);
        let results = p
            .run(&p.plan(&LockFile::new()), &previous, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].content,
            "# Changelog\n\nchangelog:v1\n\n## 2026-01-01\n- Initial\n"
        );
    }

    #[tokio::test]
    async fn dry_run_estimates_without_calls() {
        let provider = Arc::new(ScriptedProvider::new());
        let options = PipelineOptions {
            dry_run: true,
            ..Default::default()
        };
        let p = pipeline(options, provider.clone());
        let results = p
            .run(&p.plan(&LockFile::new()), &PreviousContent::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(results.len(), 8);
        for result in &results {
            match result.status {
                GenerationStatus::DryRun { estimated_tokens } => assert!(estimated_tokens > 0),
                other => panic!("unexpected status {other:?}"),
            }
            assert!(result.content.starts_with("[dry-run] Would generate"));
        }
    }

    #[tokio::test]
    async fn missing_provider_is_an_error() {
        let p = Pipeline::new(&sample_ir(), sample_instructions(""), Default::default()).unwrap();
        let err = p
            .run(&p.plan(&LockFile::new()), &PreviousContent::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingProvider));
    }

    #[tokio::test]
    async fn cancellation_fails_the_batch() {
        let p = pipeline(PipelineOptions::default(), Arc::new(HangingProvider));
        let plan = p.plan(&LockFile::new());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let err = p
            .run(&plan, &PreviousContent::new(), cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn model_override_is_forwarded() {
        let provider = Arc::new(ScriptedProvider::new());
        let options = PipelineOptions {
            only: vec!["llms".into()],
            model: Some("big-model".into()),
            ..Default::default()
        };
        let p = pipeline(options, provider.clone());
        p.run(&p.plan(&LockFile::new()), &PreviousContent::new(), CancellationToken::new())
            .await
            .unwrap();
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].model.as_deref(), Some("big-model"));
        assert_eq!(requests[0].max_tokens, 1024);
    }
}
