//! Drift detection between the lockfile, the inputs and the outputs.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use skc_cache::LockFile;

use crate::artifact::ArtifactId;
use crate::error::DriftError;
use crate::pipeline::Pipeline;

/// Enabled artifacts whose current input fingerprint differs from the
/// lockfile, in generation order.
pub fn input_drift(pipeline: &Pipeline, lock: &LockFile) -> Vec<ArtifactId> {
    pipeline
        .enabled_artifacts()
        .into_iter()
        .filter(|id| !lock.is_up_to_date(id.as_str(), &pipeline.input_hash(*id)))
        .collect()
}

/// A difference between two output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChange {
    /// Only in the current output.
    Added(PathBuf),
    /// Only in the directory compared against.
    Removed(PathBuf),
    /// In both, with different bytes.
    Changed(PathBuf),
}

impl OutputChange {
    /// Path relative to either output directory.
    pub fn path(&self) -> &Path {
        match self {
            OutputChange::Added(p) | OutputChange::Removed(p) | OutputChange::Changed(p) => p,
        }
    }
}

/// Compares the outputs of every enabled artifact in `current` against
/// `against`. Directory artifacts are compared file by file.
pub fn output_drift(
    pipeline: &Pipeline,
    current: &Path,
    against: &Path,
) -> Result<Vec<OutputChange>, DriftError> {
    let mut changes = Vec::new();
    for id in pipeline.enabled_artifacts() {
        let rel = pipeline.output_path(id);
        for file in candidate_files(&rel, current, against)? {
            let ours = read_optional(&current.join(&file))?;
            let theirs = read_optional(&against.join(&file))?;
            match (ours, theirs) {
                (Some(_), None) => changes.push(OutputChange::Added(file)),
                (None, Some(_)) => changes.push(OutputChange::Removed(file)),
                (Some(a), Some(b)) if a != b => changes.push(OutputChange::Changed(file)),
                _ => {}
            }
        }
    }
    Ok(changes)
}

/// The artifact path itself, or every file below it when either side has a
/// directory there.
fn candidate_files(rel: &Path, current: &Path, against: &Path) -> Result<Vec<PathBuf>, DriftError> {
    let dirs: Vec<PathBuf> = [current.join(rel), against.join(rel)]
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    if dirs.is_empty() {
        return Ok(vec![rel.to_path_buf()]);
    }
    let mut files = BTreeSet::new();
    for dir in dirs {
        collect_files(&dir, Path::new(""), &mut files)?;
    }
    Ok(files.into_iter().map(|f| rel.join(f)).collect())
}

fn collect_files(dir: &Path, prefix: &Path, out: &mut BTreeSet<PathBuf>) -> Result<(), DriftError> {
    let entries = fs::read_dir(dir).map_err(|source| DriftError {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| DriftError {
            path: dir.to_path_buf(),
            source,
        })?;
        let rel = prefix.join(entry.file_name());
        if entry.path().is_dir() {
            collect_files(&entry.path(), &rel, out)?;
        } else {
            out.insert(rel);
        }
    }
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, DriftError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DriftError {
            path: path.to_path_buf(),
            source,
        }),
    }
}
