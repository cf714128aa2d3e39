//! The aggregate intermediate representation and fragment merging.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::AuthScheme;
use crate::operation::Operation;
use crate::project::ProjectStructure;
use crate::types::TypeDef;

/// A logical grouping of operations (an OpenAPI tag, a CLI subcommand tree).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Member operation ids in order.
    pub operations: Vec<String>,
}

/// The unified, source-agnostic model consumed by the pipeline.
///
/// Plugins emit operations and types sorted by their stable key, and
/// metadata is a `BTreeMap`, so serializing the same input always produces
/// the same bytes. Fingerprinting depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntermediateRepr {
    /// Operations in source order.
    #[serde(default)]
    pub operations: Vec<Operation>,
    /// Named type definitions in source order.
    #[serde(default)]
    pub types: Vec<TypeDef>,
    /// Authentication schemes in source order.
    #[serde(default)]
    pub auth: Vec<AuthScheme>,
    /// Logical groups in source order.
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Project structure from a codebase scan, if any source produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectStructure>,
    /// Free-form string metadata (`title`, `version`, `description`).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl IntermediateRepr {
    /// Creates an empty IR.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `other` into `self`.
    ///
    /// Sequences are appended, so merging fragments `[A, B]` yields A's
    /// operations followed by B's. Metadata and project structure from
    /// `other` overwrite those already present: the later source wins.
    pub fn merge(&mut self, other: IntermediateRepr) {
        self.operations.extend(other.operations);
        self.types.extend(other.types);
        self.auth.extend(other.auth);
        self.groups.extend(other.groups);
        if other.project.is_some() {
            self.project = other.project;
        }
        self.metadata.extend(other.metadata);
    }

    /// Returns operation ids in order.
    pub fn operation_ids(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.id.as_str()).collect()
    }

    /// Returns `true` if the IR carries no operations, types, or project data.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
            && self.types.is_empty()
            && self.auth.is_empty()
            && self.groups.is_empty()
            && self.project.is_none()
    }

    /// Serializes to compact JSON. This is the form that is fingerprinted.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes to indented JSON for inclusion in prompts.
    pub fn pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
