//! `COMPILER_INSTRUCTIONS.md` parsing and validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use skc_diagnostics::{Category, Diagnostic, DiagnosticCode};

use crate::error::ConfigError;
use crate::types::{Frontmatter, SpecSource};

/// File name looked up when no `--instructions` flag is given.
pub const DEFAULT_INSTRUCTIONS_FILE: &str = "COMPILER_INSTRUCTIONS.md";

/// Artifact ids recognized in the `artifacts:` toggle map.
const KNOWN_ARTIFACTS: &[&str] = &[
    "skill",
    "reference",
    "examples",
    "scripts",
    "llms",
    "llms-api",
    "llms-full",
    "changelog",
];

const MISSING_PRODUCT: DiagnosticCode = DiagnosticCode::new(Category::Instructions, 1);
const MISSING_NAME: DiagnosticCode = DiagnosticCode::new(Category::Instructions, 2);
const MISSING_SPEC: DiagnosticCode = DiagnosticCode::new(Category::Instructions, 3);
const UNKNOWN_ARTIFACT: DiagnosticCode = DiagnosticCode::new(Category::Instructions, 4);
const EMPTY_SECTION: DiagnosticCode = DiagnosticCode::new(Category::Instructions, 5);

/// A parsed instructions file.
#[derive(Debug, Clone, Default)]
pub struct Instructions {
    /// The YAML frontmatter.
    pub frontmatter: Frontmatter,
    /// Body sections keyed by their top-level (`# `) heading.
    ///
    /// Sub-headings stay inside the enclosing section's body.
    pub sections: BTreeMap<String, String>,
    /// Directory relative spec paths are resolved against.
    pub base_dir: PathBuf,
}

impl Instructions {
    /// Reads and parses an instructions file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::InstructionsNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let mut inst = Self::parse_str(&content)?;
        inst.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!(
            path = %path.display(),
            sections = inst.sections.len(),
            sources = inst.frontmatter.spec.len(),
            "loaded instructions"
        );
        Ok(inst)
    }

    /// Parses instructions from a string. Relative paths resolve against
    /// the current directory.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        let (yaml, body) = split_frontmatter(content)?;
        let frontmatter: Frontmatter = if yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Frontmatter(e.to_string()))?
        };
        Ok(Self {
            frontmatter,
            sections: parse_sections(body),
            base_dir: PathBuf::new(),
        })
    }

    /// Project name from the frontmatter.
    pub fn name(&self) -> &str {
        &self.frontmatter.name
    }

    /// Environment-variable prefix derived from the project name.
    ///
    /// `my-tool` becomes `MY_TOOL`.
    pub fn env_prefix(&self) -> String {
        self.frontmatter
            .name
            .trim()
            .to_uppercase()
            .replace(['-', ' ', '.'], "_")
    }

    /// Returns the spec sources with relative local paths anchored at the
    /// instructions file's directory. Each source also carries the output
    /// directory, which scans of the project must not read back.
    pub fn resolve_spec_sources(&self) -> Result<Vec<SpecSource>, ConfigError> {
        if self.frontmatter.spec.is_empty() {
            return Err(ConfigError::MissingField("spec".to_string()));
        }
        let out = self.anchor(&self.frontmatter.out);
        Ok(self
            .frontmatter
            .spec
            .iter()
            .map(|src| {
                let mut src = src.clone();
                if let Some(path) = &src.path {
                    src.path = Some(self.anchor(path));
                }
                src.skip.push(out.clone());
                src
            })
            .collect())
    }

    fn anchor(&self, path: &str) -> String {
        let p = Path::new(path);
        if p.is_absolute() || self.base_dir.as_os_str().is_empty() {
            path.to_string()
        } else {
            self.base_dir.join(p).to_string_lossy().into_owned()
        }
    }

    /// Output directory anchored like spec paths.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(self.anchor(&self.frontmatter.out))
    }

    /// Checks the instructions for problems that do not block generation.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if self.frontmatter.name.trim().is_empty() {
            diags.push(
                Diagnostic::warning(MISSING_NAME, "frontmatter has no `name`")
                    .with_help("artifact paths and the env prefix are derived from the name"),
            );
        }
        if self.frontmatter.spec.is_empty() {
            diags.push(
                Diagnostic::warning(MISSING_SPEC, "frontmatter has no `spec` sources")
                    .with_help("pass --spec or add a `spec:` entry"),
            );
        }
        if !self.sections.contains_key("Product") {
            diags.push(
                Diagnostic::warning(MISSING_PRODUCT, "missing a `# Product` section")
                    .with_help("llms.txt is generated from the Product section"),
            );
        }
        for key in self.frontmatter.artifacts.keys() {
            if !KNOWN_ARTIFACTS.contains(&key.as_str()) {
                diags.push(
                    Diagnostic::warning(UNKNOWN_ARTIFACT, format!("unknown artifact `{key}`"))
                        .at("artifacts")
                        .with_note(format!("known artifacts: {}", KNOWN_ARTIFACTS.join(", "))),
                );
            }
        }
        for (name, body) in &self.sections {
            if body.trim().is_empty() {
                diags.push(Diagnostic::warning(EMPTY_SECTION, "section is empty").at(name.clone()));
            }
        }
        diags
    }
}

/// Splits `---`-delimited frontmatter from the Markdown body.
fn split_frontmatter(content: &str) -> Result<(&str, &str), ConfigError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\r\n")
        .or_else(|| content.strip_prefix("---\n"))
        .ok_or_else(|| {
            ConfigError::Frontmatter("file must start with a `---` frontmatter block".to_string())
        })?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(ConfigError::Frontmatter(
        "frontmatter block is not closed with `---`".to_string(),
    ))
}

/// Splits the Markdown body on top-level headings.
///
/// Text before the first heading is dropped. Headings inside fenced code
/// blocks do not start a new section.
fn parse_sections(body: &str) -> BTreeMap<String, String> {
    let mut sections = BTreeMap::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        let heading = if in_fence { None } else { line.strip_prefix("# ") };
        match heading {
            Some(title) => {
                if let Some((name, lines)) = current.take() {
                    sections.insert(name, lines.join("\n").trim().to_string());
                }
                current = Some((title.trim().to_string(), Vec::new()));
            }
            None => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    if let Some((name, lines)) = current {
        sections.insert(name, lines.join("\n").trim().to_string());
    }
    sections
}
