//! The plugin contract and the closed set of built-in plugins.

use skc_config::SpecSource;
use skc_diagnostics::Diagnostic;
use skc_ir::IntermediateRepr;

use crate::cli::CliPlugin;
use crate::codebase::CodebasePlugin;
use crate::error::PluginError;
use crate::openapi::OpenApiPlugin;

/// Capability set every spec-source plugin implements.
pub trait SpecPlugin: Send + Sync {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if this plugin handles `source`.
    fn detect(&self, source: &SpecSource) -> bool;

    /// Obtains the raw document for `source`.
    fn fetch(&self, source: &SpecSource) -> Result<Vec<u8>, PluginError>;

    /// Turns raw bytes into an IR fragment.
    ///
    /// Operations and types must come out in a stable order so identical
    /// input always serializes identically.
    fn parse(&self, raw: &[u8], source: &SpecSource) -> Result<IntermediateRepr, PluginError>;

    /// Reports non-fatal problems in a parsed fragment.
    fn validate(&self, ir: &IntermediateRepr) -> Vec<Diagnostic>;
}

/// The built-in plugins.
#[derive(Debug, Clone)]
pub enum Plugin {
    /// OpenAPI 3.x documents.
    OpenApi(OpenApiPlugin),
    /// CLI help-tree crawler.
    Cli(CliPlugin),
    /// Source-tree scanner.
    Codebase(CodebasePlugin),
}

impl Plugin {
    /// All built-in plugins in registration order.
    pub fn builtin() -> Vec<Plugin> {
        vec![
            Plugin::OpenApi(OpenApiPlugin::new()),
            Plugin::Cli(CliPlugin::new()),
            Plugin::Codebase(CodebasePlugin::new()),
        ]
    }

    fn inner(&self) -> &dyn SpecPlugin {
        match self {
            Plugin::OpenApi(p) => p as &dyn SpecPlugin,
            Plugin::Cli(p) => p,
            Plugin::Codebase(p) => p,
        }
    }
}

impl SpecPlugin for Plugin {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn detect(&self, source: &SpecSource) -> bool {
        self.inner().detect(source)
    }

    fn fetch(&self, source: &SpecSource) -> Result<Vec<u8>, PluginError> {
        self.inner().fetch(source)
    }

    fn parse(&self, raw: &[u8], source: &SpecSource) -> Result<IntermediateRepr, PluginError> {
        self.inner().parse(raw, source)
    }

    fn validate(&self, ir: &IntermediateRepr) -> Vec<Diagnostic> {
        self.inner().validate(ir)
    }
}
