//! Instructions file parsing, user settings, and provider resolution.
//!
//! A project is described by `COMPILER_INSTRUCTIONS.md`: YAML frontmatter
//! naming the project, its spec sources, and per-artifact toggles, followed
//! by a Markdown body whose top-level headings become named instruction
//! sections. User-wide provider settings live in a TOML file under the
//! platform config directory.

#![warn(missing_docs)]

pub mod error;
pub mod instructions;
pub mod resolve;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use instructions::{Instructions, DEFAULT_INSTRUCTIONS_FILE};
pub use resolve::{resolve_provider, ProviderOverrides, ResolvedProvider};
pub use settings::{UserSettings, VALID_KEYS};
pub use types::*;
