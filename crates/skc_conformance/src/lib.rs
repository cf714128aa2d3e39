//! Conformance test helpers for skc.
//!
//! Provides a throwaway project directory, a scripted in-memory provider,
//! and helpers that drive spec processing and generation end to end so the
//! integration tests under `tests/` can assert on calls, files and the
//! lockfile.

#![warn(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use skc_cache::{Cache, LockFile};
use skc_config::Instructions;
use skc_pipeline::{ArtifactId, GenerateOutcome, Pipeline, PipelineOptions, SessionError};
use skc_provider::{GenerateRequest, GenerateResponse, Provider, ProviderError};
use skc_spec::{Processed, Registry};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Name of the instructions file inside a [`Project`].
pub const INSTRUCTIONS_FILE: &str = "COMPILER_INSTRUCTIONS.md";

/// A provider that answers from a script and records every call.
///
/// Each response is `<artifact id> v<call number>`; scripts come back as
/// one fenced `run.sh` block and the changelog as a titled entry. The
/// artifact is recognised from the system prompt.
pub struct ScriptedProvider {
    calls: AtomicUsize,
    fail_on: Option<ArtifactId>,
    seen: Mutex<Vec<ArtifactId>>,
}

impl ScriptedProvider {
    /// A provider that always succeeds.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    /// A provider that fails every request for `id`.
    pub fn failing_on(id: ArtifactId) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(id),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Number of generation calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Artifacts requested so far, in call order.
    pub fn seen(&self) -> Vec<ArtifactId> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let id = ArtifactId::ALL
            .into_iter()
            .find(|id| id.template() == request.system_prompt)
            .ok_or_else(|| ProviderError::Decode("unknown template".to_string()))?;
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(id);
        }
        if self.fail_on == Some(id) {
            return Err(ProviderError::Api {
                status: 529,
                body: "overloaded".to_string(),
            });
        }
        let content = match id {
            ArtifactId::Scripts => format!("```run.sh\n#!/bin/sh\necho v{n}\n```\n"),
            ArtifactId::Changelog => format!("# Changelog\n\n## Run {n}\n- regenerated\n"),
            _ => format!("{id} v{n}\n"),
        };
        Ok(GenerateResponse {
            content,
            model: "scripted-model".to_string(),
            tokens_in: request.user_message.len() as u64 / 4,
            tokens_out: 1,
        })
    }
}

/// A minimal OpenAPI document with one documented operation.
pub fn openapi_doc(operation_id: &str, title: &str) -> String {
    format!(
        "openapi: 3.0.3\ninfo:\n  title: {title}\n  version: '1.0'\npaths:\n  /{operation_id}:\n    get:\n      operationId: {operation_id}\n      summary: Fetch {operation_id}\n      responses:\n        '200':\n          description: ok\n"
    )
}

/// A temporary project: instructions, spec files and outputs.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Creates a project whose instructions file has `frontmatter` between
    /// the `---` fences and `body` after them.
    pub fn new(frontmatter: &str, body: &str) -> Self {
        let project = Self {
            dir: tempfile::tempdir().expect("create temp project"),
        };
        project.write_instructions(frontmatter, body);
        project
    }

    /// Rewrites the instructions file.
    pub fn write_instructions(&self, frontmatter: &str, body: &str) {
        self.write(INSTRUCTIONS_FILE, &format!("---\n{frontmatter}---\n\n{body}"));
    }

    /// Writes a file relative to the project root.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write project file");
    }

    /// The project root. The lockfile and cache live here.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Loads the instructions file.
    pub fn instructions(&self) -> Instructions {
        Instructions::load(&self.root().join(INSTRUCTIONS_FILE)).expect("load instructions")
    }

    /// The output directory named by the instructions.
    pub fn out_dir(&self) -> PathBuf {
        self.instructions().output_dir()
    }

    /// Processes the spec sources with the built-in plugins.
    pub fn process(&self) -> Processed {
        let sources = self
            .instructions()
            .resolve_spec_sources()
            .expect("resolve sources");
        Registry::with_builtin().process(&sources).expect("process sources")
    }

    /// Builds a pipeline over freshly processed sources.
    pub fn pipeline(&self, tweak: impl FnOnce(&mut PipelineOptions)) -> Pipeline {
        let instructions = self.instructions();
        let mut options = PipelineOptions {
            output_dir: instructions.output_dir(),
            ..Default::default()
        };
        tweak(&mut options);
        Pipeline::new(&self.process().ir, instructions, options).expect("build pipeline")
    }

    /// Runs one full `generate` session with `provider`.
    pub async fn generate(
        &self,
        provider: Arc<ScriptedProvider>,
        tweak: impl FnOnce(&mut PipelineOptions),
    ) -> Result<GenerateOutcome, SessionError> {
        let pipeline = self.pipeline(tweak).with_provider(provider);
        let mut cache = Cache::load_or_create(self.root(), "conformance");
        skc_pipeline::generate(&pipeline, &mut cache, CancellationToken::new()).await
    }

    /// The lockfile on disk, if one was written.
    pub fn lock(&self) -> Option<LockFile> {
        LockFile::load(self.root())
    }

    /// Reads an output file, relative to the output directory.
    pub fn output(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.out_dir().join(rel)).ok()
    }
}
