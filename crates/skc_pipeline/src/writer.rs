//! Writing results to the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WriteError;
use crate::result::GenerationResult;

/// A file `--diff` mode would create or replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    /// The file does not exist yet.
    New(PathBuf),
    /// The file exists with different content.
    Changed(PathBuf),
}

impl PendingChange {
    /// Path relative to the output directory.
    pub fn path(&self) -> &Path {
        match self {
            PendingChange::New(p) | PendingChange::Changed(p) => p,
        }
    }
}

/// Writes every generated result under `output_dir` and returns the files
/// written, relative to it. Skipped, dry-run and empty results are ignored.
///
/// The scripts artifact is split into one executable file per fenced block.
pub fn write_results(output_dir: &Path, results: &[GenerationResult]) -> Result<Vec<PathBuf>, WriteError> {
    let mut written = Vec::new();
    for result in results.iter().filter(|r| r.has_output()) {
        for (rel, content) in materialize(result) {
            let full = output_dir.join(&rel);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).map_err(|source| WriteError {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&full, content.as_bytes()).map_err(|source| WriteError {
                path: full.clone(),
                source,
            })?;
            if result.id.is_directory() {
                make_executable(&full)?;
            }
            tracing::debug!(path = %full.display(), bytes = content.len(), "wrote artifact");
            written.push(rel);
        }
    }
    Ok(written)
}

/// Files `write_results` would create or change, without touching disk.
pub fn preview_changes(output_dir: &Path, results: &[GenerationResult]) -> Vec<PendingChange> {
    let mut changes = Vec::new();
    for result in results.iter().filter(|r| r.has_output()) {
        for (rel, content) in materialize(result) {
            match fs::read(output_dir.join(&rel)) {
                Err(_) => changes.push(PendingChange::New(rel)),
                Ok(existing) if existing != content.as_bytes() => {
                    changes.push(PendingChange::Changed(rel))
                }
                Ok(_) => {}
            }
        }
    }
    changes
}

/// Splits scripts output into `(file name, body)` pairs.
///
/// Each script is a fenced block whose info string is its file name. Blocks
/// without a name, or whose name is not a plain file name, are dropped.
pub fn split_scripts(content: &str) -> Vec<(String, String)> {
    let mut scripts = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in content.lines() {
        match current.as_mut() {
            None => {
                if let Some(info) = line.strip_prefix("```") {
                    current = Some((info.trim().to_string(), Vec::new()));
                }
            }
            Some((name, body)) => {
                if line.trim_end() == "```" {
                    if is_plain_file_name(name) {
                        scripts.push((std::mem::take(name), format!("{}\n", body.join("\n"))));
                    } else if !name.is_empty() {
                        tracing::warn!(name = %name, "ignoring script with unsafe file name");
                    }
                    current = None;
                } else {
                    body.push(line);
                }
            }
        }
    }
    scripts
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn materialize(result: &GenerationResult) -> Vec<(PathBuf, String)> {
    if result.id.is_directory() {
        split_scripts(&result.content)
            .into_iter()
            .map(|(name, body)| (result.path.join(name), body))
            .collect()
    } else {
        vec![(result.path.clone(), result.content.clone())]
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), WriteError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| WriteError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), WriteError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use skc_common::ContentHash;

    use super::*;
    use crate::artifact::ArtifactId;
    use crate::result::GenerationStatus;

    fn generated(id: ArtifactId, content: &str) -> GenerationResult {
        GenerationResult {
            id,
            path: id.output_path("demo", None),
            content: content.to_string(),
            input_hash: ContentHash::from_str_content(content),
            status: GenerationStatus::Generated,
            usage: None,
            elapsed: Duration::ZERO,
        }
    }

    const SCRIPTS: &str = "Here you go:\n\n```list.sh\n#!/bin/sh\necho list\n```\n\n```\nanonymous\n```\n\n```../escape.sh\nrm -rf /\n```\n\n```get.sh\n#!/bin/sh\necho get\n```\n";

    #[test]
    fn split_keeps_named_blocks() {
        let scripts = split_scripts(SCRIPTS);
        assert_eq!(
            scripts,
            vec![
                ("list.sh".to_string(), "#!/bin/sh\necho list\n".to_string()),
                ("get.sh".to_string(), "#!/bin/sh\necho get\n".to_string()),
            ]
        );
    }

    #[test]
    fn writes_files_and_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![
            generated(ArtifactId::Skill, "# Demo\n"),
            generated(ArtifactId::Scripts, SCRIPTS),
            GenerationResult::skipped(
                ArtifactId::Llms,
                PathBuf::from("llms.txt"),
                ContentHash::from_str_content(""),
            ),
        ];
        let written = write_results(dir.path(), &results).unwrap();
        assert_eq!(
            written,
            vec![
                PathBuf::from("demo/SKILL.md"),
                PathBuf::from("demo/scripts/list.sh"),
                PathBuf::from("demo/scripts/get.sh"),
            ]
        );
        assert_eq!(fs::read_to_string(dir.path().join("demo/SKILL.md")).unwrap(), "# Demo\n");
        assert!(!dir.path().join("llms.txt").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join("demo/scripts/get.sh"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn preview_reports_new_and_changed() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("demo")).unwrap();
        fs::write(dir.path().join("demo/SKILL.md"), "old").unwrap();
        fs::write(dir.path().join("llms.txt"), "same").unwrap();

        let results = vec![
            generated(ArtifactId::Skill, "new"),
            generated(ArtifactId::Llms, "same"),
            generated(ArtifactId::Changelog, "# Changelog\n"),
        ];
        let changes = preview_changes(dir.path(), &results);
        assert_eq!(
            changes,
            vec![
                PendingChange::Changed(PathBuf::from("demo/SKILL.md")),
                PendingChange::New(PathBuf::from("CHANGELOG.md")),
            ]
        );
        assert_eq!(fs::read_to_string(dir.path().join("demo/SKILL.md")).unwrap(), "old");
    }

    #[test]
    fn empty_output_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("llms.txt"), "good").unwrap();
        let results = vec![generated(ArtifactId::Llms, ""), generated(ArtifactId::LlmsApi, "")];

        assert!(preview_changes(dir.path(), &results).is_empty());
        assert!(write_results(dir.path(), &results).unwrap().is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("llms.txt")).unwrap(), "good");
        assert!(!dir.path().join("llms-api.txt").exists());
    }

    #[test]
    fn unwritable_target_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the skill directory should go.
        fs::write(dir.path().join("demo"), "blocker").unwrap();
        let err = write_results(dir.path(), &[generated(ArtifactId::Skill, "x")]).unwrap_err();
        assert!(err.path.ends_with("demo"));
    }
}
