//! Plugin selection and fragment merging.

use skc_config::SpecSource;
use skc_diagnostics::{Diagnostic, DiagnosticSink};
use skc_ir::IntermediateRepr;

use crate::error::SpecError;
use crate::plugin::{Plugin, SpecPlugin};

/// The merged result of processing every spec source.
#[derive(Debug, Default)]
pub struct Processed {
    /// Fragments merged in source order.
    pub ir: IntermediateRepr,
    /// Validation warnings in source order.
    pub warnings: Vec<Diagnostic>,
}

/// An explicit, caller-constructed list of plugins.
///
/// Detection is first-match in registration order.
#[derive(Default)]
pub struct Registry {
    plugins: Vec<Box<dyn SpecPlugin>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in plugins.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for plugin in Plugin::builtin() {
            registry.register(plugin);
        }
        registry
    }

    /// Appends a plugin. Earlier registrations win detection ties.
    pub fn register(&mut self, plugin: impl SpecPlugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    /// Names of registered plugins in registration order.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Returns the first plugin whose `detect` accepts `source`.
    pub fn detect(&self, source: &SpecSource) -> Result<&dyn SpecPlugin, SpecError> {
        self.plugins
            .iter()
            .find(|p| p.detect(source))
            .map(|p| p.as_ref())
            .ok_or_else(|| SpecError::NoPlugin {
                spec: source.to_string(),
                registered: self.plugin_names(),
            })
    }

    /// Fetches, parses, validates, and merges every source in order.
    ///
    /// Stops at the first source that no plugin accepts or whose fetch or
    /// parse fails. Warnings never stop processing.
    pub fn process(&self, sources: &[SpecSource]) -> Result<Processed, SpecError> {
        let sink = DiagnosticSink::new();
        let ir = self.process_into(sources, &sink)?;
        Ok(Processed {
            ir,
            warnings: sink.take_all(),
        })
    }

    /// Like [`process`](Self::process), emitting validation findings into
    /// `sink` as each source is merged.
    pub fn process_into(
        &self,
        sources: &[SpecSource],
        sink: &DiagnosticSink,
    ) -> Result<IntermediateRepr, SpecError> {
        let mut ir = IntermediateRepr::new();

        for source in sources {
            let plugin = self.detect(source)?;
            let name = plugin.name();
            tracing::info!(plugin = name, source = %source, "processing spec source");

            let raw = plugin.fetch(source).map_err(|cause| SpecError::Fetch {
                plugin: name,
                spec: source.to_string(),
                cause,
            })?;
            tracing::debug!(plugin = name, bytes = raw.len(), "fetched");

            let fragment = plugin.parse(&raw, source).map_err(|cause| SpecError::Parse {
                plugin: name,
                spec: source.to_string(),
                cause,
            })?;

            sink.extend(plugin.validate(&fragment));
            tracing::debug!(
                plugin = name,
                operations = fragment.operations.len(),
                types = fragment.types.len(),
                "parsed"
            );
            ir.merge(fragment);
        }

        Ok(ir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use skc_diagnostics::{Category, DiagnosticCode};
    use skc_ir::Operation;

    /// Parses `path` as a comma-separated list of operation ids and sets
    /// `metadata.title` to the first id.
    struct ListPlugin;

    impl SpecPlugin for ListPlugin {
        fn name(&self) -> &'static str {
            "list"
        }

        fn detect(&self, source: &SpecSource) -> bool {
            source.is_kind("list")
        }

        fn fetch(&self, source: &SpecSource) -> Result<Vec<u8>, PluginError> {
            match source.path.as_deref() {
                Some("fail") => Err(PluginError::Invalid("unreachable".into())),
                Some(p) => Ok(p.as_bytes().to_vec()),
                None => Err(PluginError::Invalid("no path".into())),
            }
        }

        fn parse(&self, raw: &[u8], _source: &SpecSource) -> Result<IntermediateRepr, PluginError> {
            let text = String::from_utf8_lossy(raw);
            if text == "garbage" {
                return Err(PluginError::Invalid("cannot parse".into()));
            }
            let mut ir = IntermediateRepr::new();
            for id in text.split(',') {
                ir.operations.push(Operation::new(id, "GET", format!("/{id}")));
            }
            ir.metadata.insert("title".into(), text.split(',').next().unwrap_or("").into());
            Ok(ir)
        }

        fn validate(&self, ir: &IntermediateRepr) -> Vec<Diagnostic> {
            ir.operations
                .iter()
                .map(|op| {
                    Diagnostic::warning(DiagnosticCode::new(Category::Source, 900), "no description")
                        .at(op.id.clone())
                })
                .collect()
        }
    }

    fn registry() -> Registry {
        let mut r = Registry::new();
        r.register(ListPlugin);
        r
    }

    #[test]
    fn merges_in_source_order_and_last_metadata_wins() {
        let out = registry()
            .process(&[
                SpecSource::typed("list", "a"),
                SpecSource::typed("list", "b"),
                SpecSource::typed("list", "c"),
            ])
            .unwrap();
        assert_eq!(out.ir.operation_ids(), vec!["a", "b", "c"]);
        assert_eq!(out.ir.metadata["title"], "c");
        let locs: Vec<_> = out.warnings.iter().filter_map(|w| w.location.clone()).collect();
        assert_eq!(locs, vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_source_fails_fast() {
        let err = registry()
            .process(&[SpecSource::typed("list", "a"), SpecSource::from_path("notes.txt")])
            .unwrap_err();
        match err {
            SpecError::NoPlugin { registered, .. } => assert_eq!(registered, vec!["list"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fetch_failure_names_stage() {
        let err = registry().process(&[SpecSource::typed("list", "fail")]).unwrap_err();
        assert!(matches!(err, SpecError::Fetch { plugin: "list", .. }));
    }

    #[test]
    fn parse_failure_names_stage() {
        let err = registry().process(&[SpecSource::typed("list", "garbage")]).unwrap_err();
        assert!(err.to_string().starts_with("[list] parse"));
    }

    #[test]
    fn first_registered_plugin_wins() {
        struct Greedy;
        impl SpecPlugin for Greedy {
            fn name(&self) -> &'static str {
                "greedy"
            }
            fn detect(&self, _: &SpecSource) -> bool {
                true
            }
            fn fetch(&self, _: &SpecSource) -> Result<Vec<u8>, PluginError> {
                Ok(Vec::new())
            }
            fn parse(&self, _: &[u8], _: &SpecSource) -> Result<IntermediateRepr, PluginError> {
                Ok(IntermediateRepr::new())
            }
            fn validate(&self, _: &IntermediateRepr) -> Vec<Diagnostic> {
                Vec::new()
            }
        }

        let mut r = registry();
        r.register(Greedy);
        let src = SpecSource::typed("list", "a");
        assert_eq!(r.detect(&src).unwrap().name(), "list");
        assert_eq!(r.detect(&SpecSource::from_path("x")).unwrap().name(), "greedy");
    }

    #[test]
    fn builtin_registry_names() {
        assert_eq!(Registry::with_builtin().plugin_names(), vec!["openapi", "cli", "codebase"]);
    }

    #[test]
    fn findings_land_in_the_callers_sink() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning(DiagnosticCode::new(Category::Instructions, 1), "earlier"));
        let ir = registry()
            .process_into(&[SpecSource::typed("list", "a,b")], &sink)
            .unwrap();
        assert_eq!(ir.operation_ids(), vec!["a", "b"]);
        assert!(!sink.has_errors());
        let all = sink.take_all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].message, "earlier");
    }

    #[test]
    fn empty_sources_yield_empty_ir() {
        let out = registry().process(&[]).unwrap();
        assert!(out.ir.is_empty());
        assert!(out.warnings.is_empty());
    }
}
