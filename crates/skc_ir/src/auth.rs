//! Authentication scheme descriptors.

use serde::{Deserialize, Serialize};

/// A named authentication scheme.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthScheme {
    /// Scheme identifier referenced by [`Operation::auth`](crate::Operation::auth).
    pub name: String,
    /// Scheme kind (`http`, `apiKey`, `oauth2`, `openIdConnect`).
    #[serde(rename = "type")]
    pub kind: String,
    /// HTTP auth scheme (`bearer`, `basic`) when `kind` is `http`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheme: String,
    /// Where an API key is sent (`header`, `query`, `cookie`).
    #[serde(rename = "in", default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Header or query parameter name carrying the key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub param_name: String,
    /// Description text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}
