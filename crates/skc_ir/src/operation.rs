//! Operations: the callable surface of a spec source.

use serde::{Deserialize, Serialize};

/// One callable operation: an HTTP endpoint, a CLI command, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Stable identifier, unique within one source.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Method-like verb (`GET`, `POST`, `CLI`).
    pub method: String,
    /// Path-like locator (`/users/{id}`, `tool sub cmd`).
    pub path: String,
    /// Input parameters in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses sorted by status code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Response>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether the operation is deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Names of the auth schemes this operation accepts, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth: Vec<String>,
    /// Alternative names (CLI command aliases).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// A single operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is passed (`query`, `path`, `header`, `flag`).
    #[serde(rename = "in")]
    pub location: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Rendered type (`string`, `[]integer`, `string(date-time)`).
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub ty: String,
    /// Short form of a CLI flag (`-v`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shorthand: String,
    /// Default value, when the source states one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
}

/// A request payload descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    /// Media type of the payload.
    pub content_type: String,
    /// Rendered schema type.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub ty: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether the payload is mandatory.
    #[serde(default)]
    pub required: bool,
}

/// A response descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Status code or `default`.
    pub status: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Media type of the body, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    /// Rendered schema type of the body, if any.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub ty: String,
}

impl Operation {
    /// Creates an operation with only the identifying fields set.
    pub fn new(id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }
}
