//! Project directories described by their layout, manifests, and docs.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use serde::{Deserialize, Serialize};
use skc_config::SpecSource;
use skc_diagnostics::{Category, Diagnostic, DiagnosticCode};
use skc_ir::{Excerpt, FileEntry, IntermediateRepr, KeyFile, ProjectStructure, StackInfo};

use crate::error::PluginError;
use crate::plugin::SpecPlugin;

const NO_STRUCTURE: DiagnosticCode = DiagnosticCode::new(Category::Source, 301);
const NO_STACK: DiagnosticCode = DiagnosticCode::new(Category::Source, 302);
const NO_README: DiagnosticCode = DiagnosticCode::new(Category::Source, 303);

/// Default cap on scanned entries.
pub const DEFAULT_MAX_FILES: usize = 1000;

const CONFIG_CAP: usize = 50_000;
const DOC_CAP: usize = 100_000;
const KEY_FILE_CAP: usize = 50_000;
const MANIFEST_CAP: usize = 100_000;

const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "__pycache__", "target", "dist", "build"];
/// Files skc itself writes into a project root.
const STATE_FILES: &[&str] = &[".skc-lock.json"];
const DOC_FILES: &[&str] = &["CLAUDE.md", "AGENTS.md", "CONTRIBUTING.md", "README.md"];

/// Scans a directory tree into a [`ProjectStructure`].
#[derive(Debug, Clone, Default)]
pub struct CodebasePlugin;

impl CodebasePlugin {
    /// Creates the plugin.
    pub fn new() -> Self {
        Self
    }
}

/// Raw fetch output: the resolved root plus the kept entries.
#[derive(Debug, Serialize, Deserialize)]
struct Scan {
    root: PathBuf,
    entries: Vec<FileEntry>,
}

impl SpecPlugin for CodebasePlugin {
    fn name(&self) -> &'static str {
        "codebase"
    }

    fn detect(&self, source: &SpecSource) -> bool {
        source.is_kind("codebase")
    }

    fn fetch(&self, source: &SpecSource) -> Result<Vec<u8>, PluginError> {
        let given = source.path.as_deref().filter(|p| !p.is_empty()).unwrap_or(".");
        let root = fs::canonicalize(given).map_err(|e| PluginError::Io {
            path: given.into(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(PluginError::Invalid(format!(
                "codebase path {} is not a directory",
                root.display()
            )));
        }

        let include = build_globs(&source.include)?;
        let exclude = build_globs(&source.exclude)?;
        let max_files = source.max_files.filter(|m| *m > 0).unwrap_or(DEFAULT_MAX_FILES);

        let skipped: Vec<PathBuf> = source
            .skip
            .iter()
            .map(|p| fs::canonicalize(p).unwrap_or_else(|_| PathBuf::from(p)))
            .collect();
        let mut entries = walk(&root, include, exclude, skipped);
        if entries.len() > max_files {
            tracing::warn!(
                "codebase scan found {} files, truncating to {max_files} (prioritizing key files)",
                entries.len()
            );
            entries = prioritize(entries, max_files);
        }

        serde_json::to_vec(&Scan { root, entries })
            .map_err(|e| PluginError::Invalid(format!("encoding scan result: {e}")))
    }

    fn parse(&self, raw: &[u8], source: &SpecSource) -> Result<IntermediateRepr, PluginError> {
        let scan: Scan = serde_json::from_slice(raw)
            .map_err(|e| PluginError::Invalid(format!("parsing scan result: {e}")))?;

        let mut structure = ProjectStructure {
            root: source.path.clone().unwrap_or_else(|| ".".to_string()),
            file_tree: scan.entries.clone(),
            ..ProjectStructure::default()
        };

        for entry in scan.entries.iter().filter(|e| !e.is_dir) {
            inspect_file(&scan.root, &entry.path, &mut structure);
        }

        let mut ir = IntermediateRepr::new();
        ir.project = Some(structure);
        ir.metadata.insert("type".to_string(), "codebase".to_string());
        Ok(ir)
    }

    fn validate(&self, ir: &IntermediateRepr) -> Vec<Diagnostic> {
        let Some(project) = &ir.project else {
            return vec![Diagnostic::warning(NO_STRUCTURE, "codebase scan produced no structure")];
        };
        let mut warnings = Vec::new();
        if project.stack.is_empty() {
            warnings.push(
                Diagnostic::warning(NO_STACK, "could not detect technology stack").at(project.root.clone()),
            );
        }
        let has_readme = project
            .file_tree
            .iter()
            .any(|f| !f.is_dir && base_name(&f.path).to_ascii_lowercase().starts_with("readme"));
        if !has_readme {
            warnings.push(
                Diagnostic::warning(NO_README, "no README found")
                    .at(project.root.clone())
                    .with_help("a README gives generated docs much better context"),
            );
        }
        warnings
    }
}

fn build_globs(patterns: &[String]) -> Result<Option<GlobSet>, PluginError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| PluginError::Invalid(format!("invalid glob {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| PluginError::Invalid(format!("building glob set: {e}")))
}

fn keep_entry(entry: &DirEntry, exclude: Option<&GlobSet>, skipped: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
    if is_dir && ((name.starts_with('.') && name != ".github") || SKIPPED_DIRS.contains(&&*name)) {
        return false;
    }
    if !is_dir && STATE_FILES.contains(&&*name) {
        return false;
    }
    if skipped.iter().any(|p| p.as_path() == entry.path()) {
        return false;
    }
    !exclude.is_some_and(|set| set.is_match(&*name))
}

/// Walks `root` honouring `.gitignore`, returning entries sorted by path.
/// Anything at a `skipped` path is left out, with its contents.
fn walk(
    root: &Path,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    skipped: Vec<PathBuf>,
) -> Vec<FileEntry> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| keep_entry(entry, exclude.as_ref(), &skipped));

    let mut entries = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if !is_dir {
            if let Some(set) = &include {
                if !set.is_match(entry.file_name()) {
                    continue;
                }
            }
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let size = if is_dir {
            0
        } else {
            entry.metadata().map(|m| m.len()).unwrap_or(0)
        };
        entries.push(FileEntry { path, is_dir, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn priority(entry: &FileEntry) -> u8 {
    let base = base_name(&entry.path).to_ascii_lowercase();
    match base.as_str() {
        "package.json" | "go.mod" | "cargo.toml" | "pyproject.toml" => 100,
        "readme.md" | "claude.md" | "agents.md" | "contributing.md" => 90,
        "dockerfile" => 80,
        b if b.contains("config") => 80,
        _ if is_key_file(&entry.path) => 70,
        _ => 10,
    }
}

/// Keeps the `max` highest-priority entries, then restores path order.
fn prioritize(mut entries: Vec<FileEntry>, max: usize) -> Vec<FileEntry> {
    entries.sort_by_key(|e| Reverse(priority(e)));
    entries.truncate(max);
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn is_key_file(path: &str) -> bool {
    let lower = base_name(path).to_ascii_lowercase();
    matches!(
        lower.as_str(),
        "main.go"
            | "main.ts"
            | "main.js"
            | "index.ts"
            | "index.js"
            | "app.ts"
            | "app.js"
            | "jest.config.js"
            | "jest.config.ts"
            | "vitest.config.ts"
            | "setup.ts"
            | "setup.js"
    ) || ["route", "schema", "model"].iter().any(|k| lower.contains(k))
}

fn classify(path: &str) -> &'static str {
    let lower = base_name(path).to_ascii_lowercase();
    if ["main.", "index.", "app."].iter().any(|p| lower.starts_with(p)) {
        "entrypoint"
    } else if lower.contains("route") {
        "routes"
    } else if lower.contains("schema") || lower.contains("model") {
        "schema"
    } else if ["test", "spec", "setup"].iter().any(|k| lower.contains(k)) {
        "test-setup"
    } else {
        ""
    }
}

/// Reads at most `cap` bytes, cutting on a char boundary.
///
/// Returns `None` for unreadable or empty files.
fn read_capped(path: &Path, cap: usize) -> Option<(String, bool)> {
    let data = fs::read(path).ok()?;
    let mut text = String::from_utf8_lossy(&data).into_owned();
    if text.is_empty() {
        return None;
    }
    let truncated = text.len() > cap;
    if truncated {
        let mut end = cap;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    Some((text, truncated))
}

fn push_excerpt(target: &mut Vec<Excerpt>, root: &Path, rel: &str, cap: usize) {
    if let Some((content, truncated)) = read_capped(&root.join(rel), cap) {
        target.push(Excerpt {
            path: rel.to_string(),
            content,
            truncated,
        });
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn inspect_file(root: &Path, rel: &str, structure: &mut ProjectStructure) {
    let base = base_name(rel);
    let full = root.join(rel);
    let stack = &mut structure.stack;

    match base {
        "package.json" => read_package_json(&full, stack),
        "go.mod" => read_go_mod(&full, stack),
        "Cargo.toml" => {
            push_unique(&mut stack.languages, "Rust");
            push_unique(&mut stack.build_tools, "Cargo");
        }
        "pyproject.toml" => push_unique(&mut stack.languages, "Python"),
        "tsconfig.json" => {
            push_unique(&mut stack.languages, "TypeScript");
            push_excerpt(&mut structure.config_excerpts, root, rel, CONFIG_CAP);
        }
        ".eslintrc" | ".eslintrc.json" | ".eslintrc.js" => {
            push_excerpt(&mut structure.config_excerpts, root, rel, CONFIG_CAP);
        }
        "Dockerfile" => {
            push_unique(&mut stack.build_tools, "Docker");
            push_excerpt(&mut structure.config_excerpts, root, rel, CONFIG_CAP);
        }
        _ => {}
    }

    if rel.contains(".github/workflows/") || rel.contains(".gitlab-ci") {
        push_excerpt(&mut structure.config_excerpts, root, rel, CONFIG_CAP);
    }

    if DOC_FILES.contains(&base) {
        push_excerpt(&mut structure.doc_excerpts, root, rel, DOC_CAP);
    }

    if is_key_file(rel) {
        if let Some((content, _)) = read_capped(&full, KEY_FILE_CAP) {
            structure.key_files.push(KeyFile {
                path: rel.to_string(),
                role: classify(rel).to_string(),
                content,
            });
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageJson {
    dependencies: BTreeMap<String, String>,
    scripts: BTreeMap<String, String>,
}

fn read_package_json(path: &Path, stack: &mut StackInfo) {
    let Some((text, _)) = read_capped(path, MANIFEST_CAP) else {
        return;
    };
    let pkg: PackageJson = match serde_json::from_str(&text) {
        Ok(pkg) => pkg,
        Err(e) => {
            tracing::debug!("ignoring malformed {}: {e}", path.display());
            return;
        }
    };
    push_unique(&mut stack.languages, "JavaScript");
    for (name, version) in pkg.dependencies {
        let framework = match name.as_str() {
            "react" => Some("React"),
            "vue" => Some("Vue"),
            "express" => Some("Express"),
            "next" => Some("Next.js"),
            _ => None,
        };
        if let Some(framework) = framework {
            push_unique(&mut stack.frameworks, framework);
        }
        stack.dependencies.insert(name, version);
    }
    stack.scripts.extend(pkg.scripts);
}

fn read_go_mod(path: &Path, stack: &mut StackInfo) {
    let Some((text, _)) = read_capped(path, MANIFEST_CAP) else {
        return;
    };
    push_unique(&mut stack.languages, "Go");

    let mut add = |spec: &str| {
        let mut parts = spec.split_whitespace();
        if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
            stack.dependencies.insert(module.to_string(), version.to_string());
        }
    };
    let mut in_block = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if in_block {
            if line.starts_with(')') {
                in_block = false;
            } else {
                add(line);
            }
        } else if let Some(rest) = line.strip_prefix("require") {
            match rest.trim() {
                "(" => in_block = true,
                single => add(single),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{"name": "web", "dependencies": {"react": "^18.0.0", "express": "4.18.0"}, "scripts": {"test": "jest"}}"#,
        );
        write(
            root,
            "go.mod",
            "module example.com/app\n\ngo 1.22\n\nrequire (\n\tgithub.com/spf13/cobra v1.8.0\n\t// indirect below\n\tgolang.org/x/sys v0.20.0\n)\n\nrequire github.com/pkg/errors v0.9.1\n",
        );
        write(root, "README.md", "# App\n\nDoes things.\n");
        write(root, "Dockerfile", "FROM alpine\n");
        write(root, "src/main.go", "package main\n");
        write(root, "src/routes.ts", "export const routes = [];\n");
        write(root, "src/util.ts", "export {};\n");
        write(root, "node_modules/react/index.js", "module.exports = {};\n");
        write(root, ".git/config", "[core]\n");
        write(root, ".github/workflows/ci.yml", "on: push\n");
        write(root, ".gitignore", "*.log\n");
        write(root, "debug.log", "noise\n");
        dir
    }

    fn scan(source: &SpecSource) -> IntermediateRepr {
        let p = CodebasePlugin::new();
        let raw = p.fetch(source).unwrap();
        p.parse(&raw, source).unwrap()
    }

    fn source_for(dir: &Path) -> SpecSource {
        SpecSource::typed("codebase", dir.to_string_lossy())
    }

    fn paths(ir: &IntermediateRepr) -> Vec<String> {
        ir.project
            .as_ref()
            .unwrap()
            .file_tree
            .iter()
            .map(|f| f.path.clone())
            .collect()
    }

    #[test]
    fn walk_skips_ignored_and_vendored() {
        let dir = sample_project();
        let ir = scan(&source_for(dir.path()));
        let paths = paths(&ir);
        assert!(paths.contains(&"src/main.go".to_string()));
        assert!(paths.contains(&".github/workflows/ci.yml".to_string()));
        assert!(paths.contains(&".gitignore".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("node_modules")));
        assert!(!paths.iter().any(|p| p.starts_with(".git/")));
        assert!(!paths.contains(&"debug.log".to_string()));

        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn walk_leaves_out_generated_output_and_lockfile() {
        let dir = sample_project();
        write(dir.path(), "skc-out/llms.txt", "generated\n");
        write(dir.path(), "skc-out/app/SKILL.md", "generated\n");
        write(dir.path(), ".skc-lock.json", "{}\n");
        let source = SpecSource {
            skip: vec![dir.path().join("skc-out").to_string_lossy().into_owned()],
            ..source_for(dir.path())
        };

        let paths = paths(&scan(&source));
        assert!(!paths.iter().any(|p| p.starts_with("skc-out")));
        assert!(!paths.contains(&".skc-lock.json".to_string()));
        assert!(paths.contains(&"README.md".to_string()));
    }

    #[test]
    fn stack_detected_from_manifests() {
        let dir = sample_project();
        let ir = scan(&source_for(dir.path()));
        let stack = &ir.project.as_ref().unwrap().stack;
        assert_eq!(stack.languages, vec!["Go", "JavaScript"]);
        assert_eq!(stack.frameworks, vec!["Express", "React"]);
        assert_eq!(stack.build_tools, vec!["Docker"]);
        assert_eq!(stack.dependencies["react"], "^18.0.0");
        assert_eq!(stack.dependencies["github.com/spf13/cobra"], "v1.8.0");
        assert_eq!(stack.dependencies["golang.org/x/sys"], "v0.20.0");
        assert_eq!(stack.dependencies["github.com/pkg/errors"], "v0.9.1");
        assert_eq!(stack.scripts["test"], "jest");
    }

    #[test]
    fn excerpts_and_key_files() {
        let dir = sample_project();
        let ir = scan(&source_for(dir.path()));
        let project = ir.project.as_ref().unwrap();

        let configs: Vec<_> = project.config_excerpts.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(configs, vec![".github/workflows/ci.yml", "Dockerfile"]);

        assert_eq!(project.doc_excerpts.len(), 1);
        assert_eq!(project.doc_excerpts[0].content, "# App\n\nDoes things.\n");

        let keys: Vec<_> = project
            .key_files
            .iter()
            .map(|k| (k.path.as_str(), k.role.as_str()))
            .collect();
        assert_eq!(keys, vec![("src/main.go", "entrypoint"), ("src/routes.ts", "routes")]);
        assert_eq!(ir.metadata["type"], "codebase");
    }

    #[test]
    fn include_and_exclude_globs() {
        let dir = sample_project();
        let source = SpecSource {
            include: vec!["*.ts".into()],
            exclude: vec!["routes.*".into()],
            ..source_for(dir.path())
        };
        let ir = scan(&source);
        let files: Vec<_> = ir
            .project
            .as_ref()
            .unwrap()
            .file_tree
            .iter()
            .filter(|f| !f.is_dir)
            .map(|f| f.path.clone())
            .collect();
        assert_eq!(files, vec!["src/util.ts"]);
    }

    #[test]
    fn truncation_prefers_key_files() {
        let dir = sample_project();
        let source = SpecSource {
            max_files: Some(3),
            ..source_for(dir.path())
        };
        let ir = scan(&source);
        assert_eq!(paths(&ir), vec!["README.md", "go.mod", "package.json"]);
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = sample_project();
        let file = dir.path().join("README.md");
        let err = CodebasePlugin::new()
            .fetch(&source_for(&file))
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn validate_warns_about_missing_readme_and_stack() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "hello\n");
        let p = CodebasePlugin::new();
        let ir = scan(&source_for(dir.path()));
        let codes: Vec<_> = p.validate(&ir).iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![NO_STACK, NO_README]);

        let codes: Vec<_> = p.validate(&IntermediateRepr::new()).iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![NO_STRUCTURE]);
    }

    #[test]
    fn clean_project_has_no_warnings() {
        let dir = sample_project();
        let p = CodebasePlugin::new();
        let ir = scan(&source_for(dir.path()));
        assert!(p.validate(&ir).is_empty());
    }

    #[test]
    fn read_capped_respects_char_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.txt");
        fs::write(&path, "ééé").unwrap();
        let (text, truncated) = read_capped(&path, 3).unwrap();
        assert_eq!(text, "é");
        assert!(truncated);
    }
}
