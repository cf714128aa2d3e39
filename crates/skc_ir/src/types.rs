//! Named structured type definitions.

use serde::{Deserialize, Serialize};

/// A named type with ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type name.
    pub name: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Fields sorted by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TypeField>,
    /// Allowed values when the type is an enumeration.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

/// A single field of a [`TypeDef`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeField {
    /// Field name.
    pub name: String,
    /// Rendered field type.
    #[serde(rename = "type")]
    pub ty: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Allowed values for enumerated fields.
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}
