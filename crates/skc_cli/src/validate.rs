//! `skc validate`: check instructions and spec sources without generating.

use skc_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use skc_spec::Registry;

use crate::pipeline::{load_instructions, render_diagnostics};
use crate::{GlobalArgs, ValidateArgs};

/// Spec sources could not be resolved against the instructions file.
const UNRESOLVED_SOURCES: DiagnosticCode = DiagnosticCode::new(Category::Error, 1);
/// A spec source failed to fetch or parse.
const UNPROCESSED_SOURCE: DiagnosticCode = DiagnosticCode::new(Category::Error, 2);

/// Runs the `skc validate` command.
///
/// Every finding is collected into one sink and rendered to stderr at the
/// end. Warnings never fail the command; any error-severity finding
/// returns 1.
pub fn run(args: &ValidateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let instructions = load_instructions(&args.instructions)?;
    let sink = DiagnosticSink::new();
    sink.extend(instructions.validate());

    match instructions.resolve_spec_sources() {
        Ok(sources) => {
            if !global.quiet {
                eprintln!("   Parsing {} spec source(s)", sources.len());
            }
            match Registry::with_builtin().process_into(&sources, &sink) {
                Ok(ir) => println!(
                    "Spec valid: {} operations, {} types",
                    ir.operations.len(),
                    ir.types.len()
                ),
                Err(e) => sink.emit(
                    Diagnostic::error(UNPROCESSED_SOURCE, format!("parsing specs: {e}"))
                        .at(args.instructions.display().to_string()),
                ),
            }
        }
        Err(e) => sink.emit(
            Diagnostic::error(UNRESOLVED_SOURCES, e.to_string())
                .at(args.instructions.display().to_string()),
        ),
    }

    let failed = sink.has_errors();
    let errors = sink.error_count();
    render_diagnostics(&sink.take_all(), global.color);
    if failed {
        eprintln!("validation failed: {errors} error(s)");
        return Ok(1);
    }

    println!("Validation passed");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const SPEC: &str = "openapi: 3.0.0\ninfo:\n  title: Demo\n  version: '1'\npaths:\n  /ping:\n    get:\n      operationId: ping\n      summary: Ping\n      responses:\n        '200':\n          description: ok\n";

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
        }
    }

    #[test]
    fn valid_project_passes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("api.yaml"), SPEC).unwrap();
        let inst = dir.path().join("COMPILER_INSTRUCTIONS.md");
        fs::write(&inst, "---\nname: demo\nspec: api.yaml\n---\n\n# Product\nDemo.\n").unwrap();

        let code = run(&ValidateArgs { instructions: inst }, &global()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn unreadable_spec_fails() {
        let dir = tempfile::tempdir().unwrap();
        let inst = dir.path().join("COMPILER_INSTRUCTIONS.md");
        fs::write(&inst, "---\nname: demo\nspec: missing.yaml\n---\n\n# Product\nDemo.\n").unwrap();

        let code = run(&ValidateArgs { instructions: inst }, &global()).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn instruction_warnings_alone_still_pass() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("api.yaml"), SPEC).unwrap();
        let inst = dir.path().join("COMPILER_INSTRUCTIONS.md");
        // No body sections, so the instructions check warns.
        fs::write(&inst, "---\nname: demo\nspec: api.yaml\n---\n").unwrap();

        let code = run(&ValidateArgs { instructions: inst }, &global()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn no_sources_fails() {
        let dir = tempfile::tempdir().unwrap();
        let inst = dir.path().join("COMPILER_INSTRUCTIONS.md");
        fs::write(&inst, "---\nname: demo\n---\n").unwrap();

        let code = run(&ValidateArgs { instructions: inst }, &global()).unwrap();
        assert_eq!(code, 1);
    }
}
