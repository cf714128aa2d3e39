//! `skc init`: draft an instructions file from a spec.
//!
//! Processes the spec like `generate` does, then asks the provider to write
//! a first `COMPILER_INSTRUCTIONS.md` for a human to refine.

use std::fs;
use std::path::Path;

use skc_config::{ProviderBlock, ProviderOverrides, SpecSource, DEFAULT_INSTRUCTIONS_FILE};
use skc_pipeline::templates;
use skc_provider::GenerateRequest;

use crate::pipeline::{build_provider, process_sources, resolve, runtime};
use crate::{GlobalArgs, InitArgs, SpecKind};

const INIT_MAX_TOKENS: u32 = 8192;

/// Runs the `skc init` command. Returns exit code 0 on success.
pub fn run(args: &InitArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let output = Path::new(DEFAULT_INSTRUCTIONS_FILE);
    ensure_writable(output, args.force)?;

    let sources = init_sources(args.kind, args.spec.as_deref())?;
    let processed = process_sources(&sources, global)?;
    let user_message = init_message(
        &args.name,
        args.kind,
        &spec_config(args.kind, args.spec.as_deref()),
        &processed.ir.pretty_json()?,
    );

    let resolved = resolve(&ProviderOverrides::default(), &ProviderBlock::default());
    let provider = build_provider(&resolved, global)?;
    if !global.quiet {
        eprintln!("   Drafting {DEFAULT_INSTRUCTIONS_FILE}");
    }
    let request = GenerateRequest {
        system_prompt: templates::INIT.to_string(),
        user_message,
        max_tokens: INIT_MAX_TOKENS,
        model: None,
    };
    let response = runtime()?
        .block_on(provider.generate(request))
        .map_err(|e| format!("generating instructions: {e}"))?;

    fs::write(output, response.content)
        .map_err(|e| format!("writing {}: {e}", output.display()))?;
    println!(
        "Created {}; review and customize it before running `skc generate`",
        output.display()
    );
    Ok(0)
}

fn ensure_writable(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists; use --force to overwrite", path.display()).into());
    }
    Ok(())
}

fn kind_name(kind: SpecKind) -> &'static str {
    match kind {
        SpecKind::Openapi => "openapi",
        SpecKind::Cli => "cli",
        SpecKind::Codebase => "codebase",
    }
}

/// The single spec source `init` processes.
fn init_sources(kind: SpecKind, spec: Option<&str>) -> Result<Vec<SpecSource>, Box<dyn std::error::Error>> {
    let source = match kind {
        SpecKind::Openapi => SpecSource::from_path(spec.unwrap_or("./openapi.yaml")),
        SpecKind::Codebase => SpecSource::typed("codebase", spec.unwrap_or(".")),
        SpecKind::Cli => {
            let binary = spec.ok_or("--spec (binary name) is required for --type cli")?;
            SpecSource {
                kind: Some("cli".to_string()),
                binary: Some(binary.to_string()),
                ..Default::default()
            }
        }
    };
    Ok(vec![source])
}

/// The `spec:` frontmatter value the drafted file should carry.
fn spec_config(kind: SpecKind, spec: Option<&str>) -> String {
    match kind {
        SpecKind::Openapi => spec.unwrap_or("./openapi.yaml").to_string(),
        SpecKind::Cli => format!("\n  type: cli\n  binary: {}", spec.unwrap_or_default()),
        SpecKind::Codebase => format!("\n  type: codebase\n  path: {}", spec.unwrap_or(".")),
    }
}

fn init_message(name: &str, kind: SpecKind, spec_config: &str, ir_pretty: &str) -> String {
    format!(
        "Project name: {name}\nSpec type: {}\nSpec config: {spec_config}\n\nSpec (IR):\n```json\n{ir_pretty}\n```",
        kind_name(kind)
    )
}
