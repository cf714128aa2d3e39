//! Error types for instructions and settings handling.

use std::path::PathBuf;

/// Errors that can occur when loading instructions or user settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The instructions file does not exist.
    #[error("no {} found; run `skc init` to create one", path.display())]
    InstructionsNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// An I/O error occurred while reading or writing a file.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The YAML frontmatter is missing or malformed.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(String),

    /// The user settings file could not be parsed or serialized.
    #[error("invalid settings file: {0}")]
    Settings(String),

    /// A required field is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A settings key is not recognized.
    #[error("unknown config key '{key}' (valid keys: {})", crate::settings::VALID_KEYS.join(", "))]
    UnknownKey {
        /// The rejected key.
        key: String,
    },

    /// The platform has no config directory.
    #[error("could not determine the user config directory")]
    NoConfigDir,
}
