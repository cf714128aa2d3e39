//! Shared helpers used by the CLI commands.
//!
//! Loading instructions, turning spec sources into IR, rendering
//! diagnostics, resolving the provider, and owning the async runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use skc_config::{
    resolve_provider, Instructions, ProviderBlock, ProviderOverrides, ResolvedProvider,
    SpecSource, UserSettings,
};
use skc_diagnostics::{Diagnostic, DiagnosticRenderer, TerminalRenderer};
use skc_provider::Provider;
use skc_spec::{Processed, Registry};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::GlobalArgs;

/// Loads the instructions file.
pub fn load_instructions(path: &Path) -> Result<Instructions, Box<dyn std::error::Error>> {
    Ok(Instructions::load(path)?)
}

/// The spec sources for a run: `--spec` replaces the frontmatter list.
pub fn spec_sources(
    instructions: &Instructions,
    spec_flag: Option<&str>,
) -> Result<Vec<SpecSource>, Box<dyn std::error::Error>> {
    match spec_flag {
        Some(path) => Ok(vec![SpecSource::from_path(path)]),
        None => Ok(instructions.resolve_spec_sources()?),
    }
}

/// Runs every source through the built-in plugins and prints warnings.
pub fn process_sources(
    sources: &[SpecSource],
    global: &GlobalArgs,
) -> Result<Processed, Box<dyn std::error::Error>> {
    if !global.quiet {
        eprintln!("   Parsing {} spec source(s)", sources.len());
    }
    let processed = Registry::with_builtin().process(sources)?;
    render_diagnostics(&processed.warnings, global.color);
    Ok(processed)
}

/// Renders diagnostics to stderr and returns how many were printed.
pub fn render_diagnostics(diagnostics: &[Diagnostic], color: bool) -> usize {
    let renderer = TerminalRenderer::new(color);
    for diag in diagnostics {
        eprint!("{}", renderer.render(diag));
    }
    diagnostics.len()
}

/// Directory holding the lockfile and cache: the working directory.
pub fn project_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(std::env::current_dir()?)
}

/// Resolves provider settings from flags, environment, frontmatter and the
/// user settings file.
pub fn resolve(overrides: &ProviderOverrides, frontmatter: &ProviderBlock) -> ResolvedProvider {
    let settings = UserSettings::load_default();
    resolve_provider(overrides, frontmatter, &settings, |key| std::env::var(key).ok())
}

/// Builds the provider for `resolved` and announces it.
pub fn build_provider(
    resolved: &ResolvedProvider,
    global: &GlobalArgs,
) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    let provider = skc_provider::build(resolved)?;
    if !global.quiet {
        eprintln!(
            "   Using provider {} (model: {})",
            provider.name(),
            provider.model()
        );
    }
    Ok(provider)
}

/// Builds the multi-threaded runtime generation runs on.
pub fn runtime() -> Result<Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Returns a token cancelled when the user presses Ctrl-C.
pub fn cancel_on_ctrl_c(runtime: &Runtime) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling generation");
            trigger.cancel();
        }
    });
    token
}

/// Formats a duration the way progress lines show it.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_flag_replaces_frontmatter_sources() {
        let inst = Instructions::parse_str("---\nname: t\nspec:\n  - a.yaml\n  - b.yaml\n---\n").unwrap();
        let sources = spec_sources(&inst, Some("c.json")).unwrap();
        assert_eq!(sources, vec![SpecSource::from_path("c.json")]);

        let sources = spec_sources(&inst, None).unwrap();
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn missing_sources_is_an_error() {
        let inst = Instructions::parse_str("---\nname: t\n---\n").unwrap();
        let err = spec_sources(&inst, None).unwrap_err();
        assert!(err.to_string().contains("spec"));
    }

    #[test]
    fn missing_instructions_suggest_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_instructions(&dir.path().join("COMPILER_INSTRUCTIONS.md")).unwrap_err();
        assert!(err.to_string().contains("skc init"));
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(250)), "250ms");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn process_reports_unknown_sources() {
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
        };
        let err = process_sources(&[SpecSource::from_path("notes.txt")], &global).unwrap_err();
        assert!(err.to_string().contains("openapi"));
    }
}
