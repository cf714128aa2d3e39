//! `skc generate`: the full compile.
//!
//! 1. Load instructions and resolve spec sources
//! 2. Parse and merge every source into one IR
//! 3. Plan against the lockfile; stop early when everything is current
//! 4. Build the provider and run the pipeline
//! 5. Write outputs and record fingerprints (or preview, for `--diff`)

use std::time::Instant;

use skc_cache::Cache;
use skc_config::ProviderOverrides;
use skc_pipeline::{
    GenerateOutcome, GenerationResult, GenerationStatus, PendingChange, Pipeline, PipelineOptions,
};

use crate::pipeline::{
    build_provider, cancel_on_ctrl_c, format_elapsed, load_instructions, process_sources,
    project_root, resolve, runtime, spec_sources,
};
use crate::{GenerateArgs, GlobalArgs};

/// Runs the `skc generate` command. Returns exit code 0 on success.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let instructions = load_instructions(&args.instructions)?;
    let output_dir = args
        .out
        .clone()
        .unwrap_or_else(|| instructions.output_dir());
    let mut sources = spec_sources(&instructions, args.spec.as_deref())?;
    for source in &mut sources {
        source.skip.push(output_dir.to_string_lossy().into_owned());
    }
    let processed = process_sources(&sources, global)?;
    let ir = processed.ir;
    if !global.quiet {
        eprintln!(
            "   Parsed {} operations, {} types, {} auth schemes",
            ir.operations.len(),
            ir.types.len(),
            ir.auth.len()
        );
    }

    let overrides = ProviderOverrides {
        provider: args.provider.clone(),
        model: args.model.clone(),
        ..Default::default()
    };
    let provider_block = instructions.frontmatter.provider.clone();
    let options = PipelineOptions {
        output_dir: output_dir.clone(),
        only: args.only.clone(),
        force: args.force,
        dry_run: args.dry_run,
        diff: args.diff,
        verbose: global.verbose,
        model: args.model.clone(),
    };
    let mut pipeline = Pipeline::new(&ir, instructions, options)?;

    let root = project_root()?;
    let mut cache = Cache::load_or_create(&root, env!("CARGO_PKG_VERSION"));

    // The provider is only needed when something will actually be generated.
    if !args.dry_run && !pipeline.plan(cache.lock()).all_up_to_date() {
        let resolved = resolve(&overrides, &provider_block);
        pipeline = pipeline.with_provider(build_provider(&resolved, global)?);
    }

    let rt = runtime()?;
    let cancel = cancel_on_ctrl_c(&rt);
    let start = Instant::now();
    let outcome = rt.block_on(skc_pipeline::generate(&pipeline, &mut cache, cancel))?;
    let elapsed = format_elapsed(start.elapsed());

    if outcome.up_to_date {
        println!("All artifacts up to date, nothing to generate.");
        return Ok(0);
    }
    if !global.quiet {
        print_results(&outcome.results, global.verbose);
    }

    if args.dry_run {
        println!("\nDry run complete ({elapsed})");
    } else if args.diff {
        print_pending(&outcome);
    } else {
        println!(
            "\nGeneration complete ({elapsed}); output written to {}",
            output_dir.display()
        );
    }
    Ok(0)
}

fn print_results(results: &[GenerationResult], verbose: bool) {
    for result in results {
        let mut line = format!("  {}: {}", result.id, result.status_label());
        match (&result.status, &result.usage) {
            (GenerationStatus::DryRun { .. }, _) => {
                line = format!("  {}", result.content);
            }
            (GenerationStatus::Generated, Some(usage)) if verbose => {
                line.push_str(&format!(
                    " (in: {}, out: {} tokens, {})",
                    usage.tokens_in,
                    usage.tokens_out,
                    format_elapsed(result.elapsed)
                ));
            }
            _ => {}
        }
        println!("{line}");
    }
}

fn print_pending(outcome: &GenerateOutcome) {
    println!("\nDiff mode; showing changes without writing:");
    if outcome.pending.is_empty() {
        println!("  no changes");
    }
    for change in &outcome.pending {
        match change {
            PendingChange::New(path) => println!("--- {} (new file) ---", path.display()),
            PendingChange::Changed(path) => println!("--- {} (changed) ---", path.display()),
        }
    }
}
