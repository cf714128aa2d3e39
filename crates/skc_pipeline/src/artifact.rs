//! Artifact identities, output locations and token ceilings.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::UnknownArtifact;
use crate::templates;

/// One of the generated artifacts.
///
/// The declaration order is the generation order: every artifact before
/// [`ArtifactId::Changelog`] is independent, the changelog depends on the
/// rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactId {
    /// `SKILL.md`, the skill entry point.
    Skill,
    /// Full command/endpoint reference.
    Reference,
    /// Worked examples.
    Examples,
    /// Helper scripts, split into individual files.
    Scripts,
    /// Short `llms.txt` summary.
    Llms,
    /// API-focused `llms-api.txt`.
    LlmsApi,
    /// Everything in one `llms-full.txt`.
    LlmsFull,
    /// `CHANGELOG.md`, generated last.
    Changelog,
}

impl ArtifactId {
    /// Every artifact in generation order.
    pub const ALL: [ArtifactId; 8] = [
        ArtifactId::Skill,
        ArtifactId::Reference,
        ArtifactId::Examples,
        ArtifactId::Scripts,
        ArtifactId::Llms,
        ArtifactId::LlmsApi,
        ArtifactId::LlmsFull,
        ArtifactId::Changelog,
    ];

    /// The id as written in flags, frontmatter and the lockfile.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactId::Skill => "skill",
            ArtifactId::Reference => "reference",
            ArtifactId::Examples => "examples",
            ArtifactId::Scripts => "scripts",
            ArtifactId::Llms => "llms",
            ArtifactId::LlmsApi => "llms-api",
            ArtifactId::LlmsFull => "llms-full",
            ArtifactId::Changelog => "changelog",
        }
    }

    /// Parses an id, ignoring surrounding whitespace and case.
    pub fn parse(text: &str) -> Option<Self> {
        let wanted = text.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == wanted)
    }

    /// Returns `true` for artifacts that must wait for the others.
    pub fn is_dependent(self) -> bool {
        matches!(self, ArtifactId::Changelog)
    }

    /// Returns `true` if the output path names a directory of files.
    pub fn is_directory(self) -> bool {
        matches!(self, ArtifactId::Scripts)
    }

    /// Output token ceiling for one generation call.
    pub fn max_tokens(self) -> u32 {
        match self {
            ArtifactId::Skill => 8192,
            ArtifactId::Reference => 16384,
            ArtifactId::Examples => 8192,
            ArtifactId::Scripts => 8192,
            ArtifactId::Llms => 1024,
            ArtifactId::LlmsApi => 4096,
            ArtifactId::LlmsFull => 16384,
            ArtifactId::Changelog => 4096,
        }
    }

    /// The system prompt template.
    pub fn template(self) -> &'static str {
        match self {
            ArtifactId::Skill => templates::SKILL,
            ArtifactId::Reference => templates::REFERENCE,
            ArtifactId::Examples => templates::EXAMPLES,
            ArtifactId::Scripts => templates::SCRIPTS,
            ArtifactId::Llms => templates::LLMS,
            ArtifactId::LlmsApi => templates::LLMS_API,
            ArtifactId::LlmsFull => templates::LLMS_FULL,
            ArtifactId::Changelog => templates::CHANGELOG,
        }
    }

    /// Path relative to the output directory.
    ///
    /// `filename` replaces the default file name but keeps the directory:
    /// the skill directory for `skill`, `references/` for the reference and
    /// examples, `scripts/` for scripts, the output root otherwise.
    pub fn output_path(self, name: &str, filename: Option<&str>) -> PathBuf {
        let skill_dir = PathBuf::from(name);
        match (self, filename) {
            (ArtifactId::Skill, Some(file)) => skill_dir.join(file),
            (ArtifactId::Reference | ArtifactId::Examples, Some(file)) => {
                skill_dir.join("references").join(file)
            }
            (ArtifactId::Scripts, Some(file)) => skill_dir.join("scripts").join(file),
            (_, Some(file)) => PathBuf::from(file),
            (ArtifactId::Skill, None) => skill_dir.join("SKILL.md"),
            (ArtifactId::Reference, None) => skill_dir.join("references").join("reference.md"),
            (ArtifactId::Examples, None) => skill_dir.join("references").join("examples.md"),
            (ArtifactId::Scripts, None) => skill_dir.join("scripts"),
            (ArtifactId::Llms, None) => PathBuf::from("llms.txt"),
            (ArtifactId::LlmsApi, None) => PathBuf::from("llms-api.txt"),
            (ArtifactId::LlmsFull, None) => PathBuf::from("llms-full.txt"),
            (ArtifactId::Changelog, None) => PathBuf::from("CHANGELOG.md"),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactId {
    type Err = UnknownArtifact;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownArtifact(s.to_string()))
    }
}
