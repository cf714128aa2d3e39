//! Typed model of the instructions frontmatter.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default output directory when the frontmatter does not set `out`.
pub const DEFAULT_OUT_DIR: &str = "./skc-out/";

/// The YAML frontmatter of an instructions file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Project or tool name. Used for the skill directory and env prefix.
    #[serde(default)]
    pub name: String,

    /// Spec sources. Accepts a path string, a single source mapping, or a
    /// list mixing both.
    #[serde(default, deserialize_with = "deserialize_spec_sources")]
    pub spec: Vec<SpecSource>,

    /// Output directory for generated artifacts.
    #[serde(default = "default_out")]
    pub out: String,

    /// Provider settings that sit below CLI flags and environment variables.
    #[serde(default)]
    pub provider: ProviderBlock,

    /// Per-artifact toggles keyed by artifact id.
    #[serde(default)]
    pub artifacts: BTreeMap<String, ArtifactToggle>,

    /// Skill-specific metadata passed through to the skill prompt.
    #[serde(default)]
    pub skill: SkillMeta,
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            name: String::new(),
            spec: Vec::new(),
            out: default_out(),
            provider: ProviderBlock::default(),
            artifacts: BTreeMap::new(),
            skill: SkillMeta::default(),
        }
    }
}

fn default_out() -> String {
    DEFAULT_OUT_DIR.to_string()
}

/// A reference to one spec input plus its source-specific options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecSource {
    /// Explicit plugin selector (`openapi`, `cli`, `codebase`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Local file or directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Remote document fetched over HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Shell command whose stdout is the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Executable to crawl for CLI help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    /// Help flag for CLI crawling. Defaults to `--help`.
    #[serde(default, alias = "help-flag", skip_serializing_if = "Option::is_none")]
    pub help_flag: Option<String>,
    /// Subcommand recursion depth for CLI crawling.
    #[serde(default, alias = "max-depth", skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Glob patterns a path must match to be included.
    #[serde(default, deserialize_with = "deserialize_string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Glob patterns (or subcommand names) to leave out.
    #[serde(default, deserialize_with = "deserialize_string_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// File cap for codebase scanning.
    #[serde(default, alias = "max-files", skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
    /// Paths a scan must leave out: the output directory, set when sources
    /// are resolved against the instructions file.
    #[serde(skip)]
    pub skip: Vec<String>,
}

impl SpecSource {
    /// A source that is just a local path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A source with an explicit type and path.
    pub fn typed(kind: &str, path: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.to_string()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if the explicit type equals `kind` (case-insensitive).
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.trim().eq_ignore_ascii_case(kind))
    }
}

impl fmt::Display for SpecSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = &self.kind {
            write!(f, "[{kind}] ")?;
        }
        match (&self.path, &self.url, &self.command, &self.binary) {
            (Some(p), _, _, _) => write!(f, "{p}"),
            (_, Some(u), _, _) => write!(f, "{u}"),
            (_, _, Some(c), _) => write!(f, "`{c}`"),
            (_, _, _, Some(b)) => write!(f, "{b}"),
            _ => write!(f, "<empty source>"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpecEntry {
    Path(String),
    Source(SpecSource),
}

impl From<SpecEntry> for SpecSource {
    fn from(entry: SpecEntry) -> Self {
        match entry {
            SpecEntry::Path(p) => SpecSource::from_path(p),
            SpecEntry::Source(s) => s,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpecField {
    One(SpecEntry),
    Many(Vec<SpecEntry>),
}

fn deserialize_spec_sources<'de, D>(deserializer: D) -> Result<Vec<SpecSource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<SpecField>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(SpecField::One(entry)) => vec![entry.into()],
        Some(SpecField::Many(entries)) => entries.into_iter().map(Into::into).collect(),
    })
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Provider settings from the frontmatter `provider:` block.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProviderBlock {
    /// Provider name (`anthropic`, `openai`).
    #[serde(default)]
    pub provider: Option<String>,
    /// Model identifier.
    #[serde(default)]
    pub model: Option<String>,
    /// API key. Prefer environment variables over committing this.
    #[serde(default, alias = "api-key")]
    pub api_key: Option<String>,
    /// Custom endpoint base URL.
    #[serde(default, alias = "base-url")]
    pub base_url: Option<String>,
}

/// Enable/disable toggle for one artifact.
///
/// Accepts `skill: false` or `skill: { enabled: true, filename: SKILL.md }`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArtifactToggle {
    /// Plain on/off switch.
    Enabled(bool),
    /// Switch with an output file name override.
    Detailed {
        /// Whether the artifact is generated. Defaults to `true`.
        #[serde(default)]
        enabled: Option<bool>,
        /// File name replacing the default one within the same directory.
        #[serde(default)]
        filename: Option<String>,
    },
}

impl ArtifactToggle {
    /// Returns `true` unless the toggle explicitly disables the artifact.
    pub fn is_enabled(&self) -> bool {
        match self {
            ArtifactToggle::Enabled(on) => *on,
            ArtifactToggle::Detailed { enabled, .. } => enabled.unwrap_or(true),
        }
    }

    /// Returns the file name override, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            ArtifactToggle::Enabled(_) => None,
            ArtifactToggle::Detailed { filename, .. } => {
                filename.as_deref().filter(|f| !f.trim().is_empty())
            }
        }
    }
}

/// Skill metadata fed into the skill artifact prompt.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SkillMeta {
    /// License identifier.
    #[serde(default)]
    pub license: Option<String>,
    /// Compatibility note.
    #[serde(default)]
    pub compatibility: Option<String>,
    /// Tools the skill is allowed to use.
    #[serde(default, alias = "allowed-tools")]
    pub allowed_tools: Option<String>,
    /// Arbitrary key/value metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Environment variables the tool reads.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub env: Vec<String>,
}
