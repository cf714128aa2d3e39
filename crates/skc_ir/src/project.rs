//! Free-form project structure produced by codebase scanning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary of a source tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectStructure {
    /// Root directory that was scanned, as written in the spec source.
    pub root: String,
    /// Files and directories, sorted by path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_tree: Vec<FileEntry>,
    /// Detected languages, frameworks, and build tooling.
    #[serde(default)]
    pub stack: StackInfo,
    /// Excerpts of configuration files (tsconfig, Dockerfile, CI workflows).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_excerpts: Vec<Excerpt>,
    /// Excerpts of documentation files (README, CONTRIBUTING, agent notes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc_excerpts: Vec<Excerpt>,
    /// Entry points, route tables, schemas, and test setup files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_files: Vec<KeyFile>,
}

/// Technology stack detected from manifest files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StackInfo {
    /// Languages in detection order, de-duplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    /// Frameworks in detection order, de-duplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,
    /// Build tools in detection order, de-duplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_tools: Vec<String>,
    /// Declared dependencies and their version requirements.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    /// Package scripts (`npm run <name>`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,
}

impl StackInfo {
    /// Returns `true` if nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.frameworks.is_empty() && self.build_tools.is_empty()
    }
}

/// One entry in the scanned file tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// Whether the entry is a directory.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_dir: bool,
    /// File size in bytes (zero for directories).
    #[serde(default)]
    pub size: u64,
}

/// A possibly truncated excerpt of one file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Excerpt {
    /// Path relative to the scan root.
    pub path: String,
    /// Leading content of the file.
    pub content: String,
    /// Whether `content` was cut short.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// A source file singled out for its role in the project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyFile {
    /// Path relative to the scan root.
    pub path: String,
    /// `entrypoint`, `routes`, `schema`, or `test-setup`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// Leading content of the file.
    pub content: String,
}
