//! `skc diff`: report drift without generating anything.
//!
//! Input drift compares the current fingerprints with the lockfile. With
//! `--against`, the output directory is also compared file by file with
//! another output directory.

use skc_cache::LockFile;
use skc_pipeline::{input_drift, output_drift, OutputChange, Pipeline, PipelineOptions};

use crate::pipeline::{load_instructions, process_sources, project_root, spec_sources};
use crate::{DiffArgs, GlobalArgs};

/// Runs the `skc diff` command. Returns 1 when anything drifted.
pub fn run(args: &DiffArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let instructions = load_instructions(&args.instructions)?;
    let sources = spec_sources(&instructions, None)?;
    let processed = process_sources(&sources, global)?;

    let output_dir = instructions.output_dir();
    let options = PipelineOptions {
        output_dir: output_dir.clone(),
        ..Default::default()
    };
    let pipeline = Pipeline::new(&processed.ir, instructions, options)?;
    let lock = LockFile::load_or_default(&project_root()?);

    let stale = input_drift(&pipeline, &lock);
    for id in &stale {
        println!("  DRIFTED: {id}");
    }
    let mut drifted = !stale.is_empty();

    if let Some(against) = &args.against {
        println!(
            "Comparing {} against {}:",
            output_dir.display(),
            against.display()
        );
        let changes = output_drift(&pipeline, &output_dir, against)?;
        for change in &changes {
            match change {
                OutputChange::Added(p) => println!(
                    "  ADDED:   {} (exists in {} but not in {})",
                    p.display(),
                    output_dir.display(),
                    against.display()
                ),
                OutputChange::Removed(p) => println!(
                    "  REMOVED: {} (exists in {} but not in {})",
                    p.display(),
                    against.display(),
                    output_dir.display()
                ),
                OutputChange::Changed(p) => println!("  CHANGED: {}", p.display()),
            }
        }
        drifted |= !changes.is_empty();
    }

    if drifted {
        println!("\nSpec or instructions have changed since last generation.");
        println!("Run `skc generate` to update artifacts.");
        return Ok(1);
    }
    println!("All artifacts up to date.");
    Ok(0)
}
