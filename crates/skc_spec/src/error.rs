//! Error types for spec-source processing.

use std::path::PathBuf;

/// Failure inside a single plugin stage.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A local file could not be read.
    #[error("reading {}: {source}", path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An HTTP fetch failed or returned a non-200 status.
    #[error("fetching {url}: {reason}")]
    Http {
        /// The requested URL.
        url: String,
        /// Transport error or status line.
        reason: String,
    },

    /// A command could not be run or produced no usable output.
    #[error("running `{command}`: {reason}")]
    Command {
        /// The command line.
        command: String,
        /// What went wrong.
        reason: String,
    },

    /// The source is missing a required field or its content is malformed.
    #[error("{0}")]
    Invalid(String),
}

/// Fatal error from [`Registry::process`](crate::Registry::process).
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// No registered plugin accepts the source.
    #[error("no plugin can handle spec source {spec} (registered: {})", registered.join(", "))]
    NoPlugin {
        /// Display form of the source.
        spec: String,
        /// Names of the registered plugins, in registration order.
        registered: Vec<&'static str>,
    },

    /// The plugin could not obtain the raw document.
    #[error("[{plugin}] fetch {spec}: {cause}")]
    Fetch {
        /// Plugin name.
        plugin: &'static str,
        /// Display form of the source.
        spec: String,
        /// Underlying failure.
        #[source]
        cause: PluginError,
    },

    /// The plugin could not interpret the raw document.
    #[error("[{plugin}] parse {spec}: {cause}")]
    Parse {
        /// Plugin name.
        plugin: &'static str,
        /// Display form of the source.
        spec: String,
        /// Underlying failure.
        #[source]
        cause: PluginError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_plugin_lists_registered() {
        let err = SpecError::NoPlugin {
            spec: "notes.txt".into(),
            registered: vec!["openapi", "cli", "codebase"],
        };
        assert_eq!(
            err.to_string(),
            "no plugin can handle spec source notes.txt (registered: openapi, cli, codebase)"
        );
    }

    #[test]
    fn fetch_names_plugin_and_stage() {
        let err = SpecError::Fetch {
            plugin: "openapi",
            spec: "https://x/api.yaml".into(),
            cause: PluginError::Http {
                url: "https://x/api.yaml".into(),
                reason: "HTTP 404".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[openapi] fetch"));
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn parse_error_has_source() {
        use std::error::Error;
        let err = SpecError::Parse {
            plugin: "openapi",
            spec: "a.yaml".into(),
            cause: PluginError::Invalid("unsupported OpenAPI version".into()),
        };
        assert!(err.source().is_some());
    }
}
