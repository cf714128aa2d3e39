//! OpenAPI 3.x documents.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use skc_config::SpecSource;
use skc_diagnostics::{Category, Diagnostic, DiagnosticCode};
use skc_ir::{
    AuthScheme, Group, IntermediateRepr, Operation, Parameter, RequestBody, Response, TypeDef,
    TypeField,
};

use crate::error::PluginError;
use crate::plugin::SpecPlugin;

const NO_DESCRIPTION: DiagnosticCode = DiagnosticCode::new(Category::Source, 101);
const PARAM_NO_DESCRIPTION: DiagnosticCode = DiagnosticCode::new(Category::Source, 102);

/// Key recording the component name of an inlined `$ref`.
const REF_NAME_KEY: &str = "x-skc-ref";

/// Nesting limit for `$ref` inlining.
const MAX_REF_DEPTH: usize = 32;

const HTTP_METHODS: &[&str] = &["delete", "get", "head", "options", "patch", "post", "put", "trace"];

/// Handles OpenAPI 3.x documents from files, URLs, or command output.
#[derive(Debug, Clone, Default)]
pub struct OpenApiPlugin;

impl OpenApiPlugin {
    /// Creates the plugin.
    pub fn new() -> Self {
        Self
    }
}

impl SpecPlugin for OpenApiPlugin {
    fn name(&self) -> &'static str {
        "openapi"
    }

    fn detect(&self, source: &SpecSource) -> bool {
        if source.kind.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            return source.is_kind("openapi");
        }
        source.path.as_deref().is_some_and(|p| {
            let ext = Path::new(p)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            matches!(ext.as_deref(), Some("yaml" | "yml" | "json"))
        })
    }

    fn fetch(&self, source: &SpecSource) -> Result<Vec<u8>, PluginError> {
        if let Some(path) = &source.path {
            return std::fs::read(path).map_err(|e| PluginError::Io {
                path: path.into(),
                source: e,
            });
        }
        if let Some(url) = &source.url {
            return fetch_url(url);
        }
        if let Some(command) = &source.command {
            return run_command(command);
        }
        Err(PluginError::Invalid(
            "openapi source needs a path, url, or command".to_string(),
        ))
    }

    fn parse(&self, raw: &[u8], _source: &SpecSource) -> Result<IntermediateRepr, PluginError> {
        let mut doc: Value = serde_yaml::from_slice(raw)
            .map_err(|e| PluginError::Invalid(format!("parsing OpenAPI document: {e}")))?;
        let root = doc.clone();
        resolve_refs(&mut doc, &root, &mut Vec::new());

        let doc: Document = serde_yaml::from_value(doc)
            .map_err(|e| PluginError::Invalid(format!("reading OpenAPI document: {e}")))?;
        let version = scalar_string(&doc.openapi);
        if !version.starts_with("3.") {
            return Err(PluginError::Invalid(format!(
                "unsupported OpenAPI version {version:?} (only 3.x is supported)"
            )));
        }
        Ok(doc.into_ir())
    }

    fn validate(&self, ir: &IntermediateRepr) -> Vec<Diagnostic> {
        let mut warnings = Vec::new();
        for op in &ir.operations {
            let locator = format!("{} {}", op.method, op.path);
            if op.description.is_empty() && op.name.is_empty() {
                warnings.push(
                    Diagnostic::warning(NO_DESCRIPTION, format!("operation {} has no description or summary", op.id))
                        .at(locator.clone()),
                );
            }
            for param in &op.parameters {
                if param.description.is_empty() {
                    warnings.push(
                        Diagnostic::warning(
                            PARAM_NO_DESCRIPTION,
                            format!("parameter {} has no description", param.name),
                        )
                        .at(locator.clone()),
                    );
                }
            }
        }
        warnings
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>, PluginError> {
    let http_err = |reason: String| PluginError::Http {
        url: url.to_string(),
        reason,
    };
    let response = reqwest::blocking::get(url).map_err(|e| http_err(e.to_string()))?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(http_err(format!("HTTP {}", response.status().as_u16())));
    }
    let body = response.bytes().map_err(|e| http_err(e.to_string()))?;
    Ok(body.to_vec())
}

fn run_command(command: &str) -> Result<Vec<u8>, PluginError> {
    let cmd_err = |reason: String| PluginError::Command {
        command: command.to_string(),
        reason,
    };
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| cmd_err("empty command".to_string()))?;
    let output = Command::new(program)
        .args(parts)
        .output()
        .map_err(|e| cmd_err(e.to_string()))?;
    if !output.status.success() {
        return Err(cmd_err(format!(
            "{}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output.stdout)
}

/// Inlines local `#/...` references in place.
///
/// The referenced mapping's keys are copied over the referencing mapping and
/// the component name is kept under [`REF_NAME_KEY`]. A reference that is
/// already being expanded higher up is left alone, so recursive schemas
/// terminate.
fn resolve_refs(node: &mut Value, root: &Value, active: &mut Vec<String>) {
    match node {
        Value::Mapping(map) => {
            let reference = map
                .get("$ref")
                .and_then(Value::as_str)
                .map(str::to_string);
            let mut pushed = false;
            if let Some(reference) = reference {
                if !active.contains(&reference) && active.len() < MAX_REF_DEPTH {
                    if let Some(Value::Mapping(target)) = lookup_ref(&reference, root) {
                        map.remove("$ref");
                        for (k, v) in target {
                            map.insert(k.clone(), v.clone());
                        }
                        if !map.contains_key(REF_NAME_KEY) {
                            map.insert(REF_NAME_KEY.into(), ref_name(&reference).into());
                        }
                        active.push(reference);
                        pushed = true;
                    }
                }
            }
            for (_, value) in map.iter_mut() {
                resolve_refs(value, root, active);
            }
            if pushed {
                active.pop();
            }
        }
        Value::Sequence(items) => {
            for item in items {
                resolve_refs(item, root, active);
            }
        }
        _ => {}
    }
}

/// Follows a JSON pointer such as `#/components/schemas/Pet`.
fn lookup_ref<'a>(reference: &str, root: &'a Value) -> Option<&'a Value> {
    let pointer = reference.strip_prefix("#/")?;
    pointer.split('/').try_fold(root, |current, part| {
        let part = part.replace("~1", "/").replace("~0", "~");
        current.as_mapping()?.get(part.as_str())
    })
}

fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Document {
    openapi: Value,
    info: Info,
    paths: BTreeMap<String, Mapping>,
    components: Components,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Info {
    title: String,
    description: String,
    version: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOperation {
    operation_id: String,
    summary: String,
    description: String,
    tags: Vec<String>,
    deprecated: bool,
    security: Vec<BTreeMap<String, Value>>,
    parameters: Vec<RawParameter>,
    request_body: Option<RawRequestBody>,
    responses: BTreeMap<String, RawResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    description: String,
    required: bool,
    schema: Option<Schema>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRequestBody {
    description: String,
    required: bool,
    content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResponse {
    description: String,
    content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaType {
    schema: Option<Schema>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Schema {
    #[serde(rename = "x-skc-ref")]
    ref_name: Option<String>,
    #[serde(rename = "type")]
    ty: Value,
    format: String,
    description: String,
    properties: BTreeMap<String, Schema>,
    items: Option<Box<Schema>>,
    required: Vec<String>,
    #[serde(rename = "enum")]
    enum_values: Vec<Value>,
}

impl Schema {
    /// `string`, `string(date-time)`, `[]Pet`, or the component name.
    fn type_string(&self) -> String {
        let ty = match &self.ty {
            Value::Sequence(types) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .unwrap_or_default()
                .to_string(),
            other => scalar_string(other),
        };
        if ty == "array" {
            if let Some(items) = &self.items {
                return format!("[]{}", items.type_string());
            }
        }
        if let Some(name) = &self.ref_name {
            if ty.is_empty() || ty == "object" {
                return name.clone();
            }
        }
        if self.format.is_empty() {
            ty
        } else {
            format!("{ty}({})", self.format)
        }
    }

    fn enum_strings(&self) -> Vec<String> {
        self.enum_values.iter().map(scalar_string).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Components {
    schemas: BTreeMap<String, Schema>,
    security_schemes: BTreeMap<String, RawSecurityScheme>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSecurityScheme {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(rename = "in")]
    location: String,
    scheme: String,
    description: String,
}

/// Picks `application/json` when offered, otherwise the first media type.
fn preferred_media(content: &BTreeMap<String, MediaType>) -> Option<(&String, &MediaType)> {
    content
        .get_key_value("application/json")
        .or_else(|| content.iter().next())
}

impl Document {
    fn into_ir(self) -> IntermediateRepr {
        let mut ir = IntermediateRepr::new();
        for (key, value) in [
            ("title", self.info.title.clone()),
            ("description", self.info.description.clone()),
            ("version", scalar_string(&self.info.version)),
        ] {
            if !value.is_empty() {
                ir.metadata.insert(key.to_string(), value);
            }
        }

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (path, item) in &self.paths {
            let shared_params: Vec<RawParameter> = item
                .get("parameters")
                .cloned()
                .and_then(|v| serde_yaml::from_value(v).ok())
                .unwrap_or_default();

            let mut methods: Vec<(&str, &Value)> = item
                .iter()
                .filter_map(|(k, v)| {
                    let k = k.as_str()?;
                    HTTP_METHODS.contains(&k).then_some((k, v))
                })
                .collect();
            methods.sort_by_key(|(k, _)| *k);

            for (method, value) in methods {
                let raw: RawOperation = match serde_yaml::from_value(value.clone()) {
                    Ok(op) => op,
                    Err(e) => {
                        tracing::warn!("skipping {method} {path}: {e}");
                        continue;
                    }
                };
                let op = convert_operation(path, method, raw, &shared_params);
                for tag in &op.tags {
                    groups.entry(tag.clone()).or_default().push(op.id.clone());
                }
                ir.operations.push(op);
            }
        }

        for (name, schema) in &self.components.schemas {
            let fields = schema
                .properties
                .iter()
                .map(|(field, fs)| TypeField {
                    name: field.clone(),
                    ty: fs.type_string(),
                    description: fs.description.clone(),
                    required: schema.required.contains(field),
                    enum_values: fs.enum_strings(),
                })
                .collect();
            ir.types.push(TypeDef {
                name: name.clone(),
                description: schema.description.clone(),
                fields,
                enum_values: schema.enum_strings(),
            });
        }

        for (name, scheme) in self.components.security_schemes {
            ir.auth.push(AuthScheme {
                name,
                kind: scheme.kind,
                scheme: scheme.scheme,
                location: scheme.location,
                param_name: scheme.name,
                description: scheme.description,
            });
        }

        ir.groups = groups
            .into_iter()
            .map(|(name, operations)| Group {
                name,
                description: String::new(),
                operations,
            })
            .collect();
        ir
    }
}

fn convert_parameter(p: &RawParameter) -> Parameter {
    Parameter {
        name: p.name.clone(),
        location: p.location.clone(),
        description: p.description.clone(),
        required: p.required,
        ty: p.schema.as_ref().map(Schema::type_string).unwrap_or_default(),
        ..Parameter::default()
    }
}

fn convert_operation(
    path: &str,
    method: &str,
    raw: RawOperation,
    shared_params: &[RawParameter],
) -> Operation {
    let id = if raw.operation_id.is_empty() {
        format!("{method}_{}", path.trim_matches('/').replace('/', "_"))
    } else {
        raw.operation_id.clone()
    };

    // Operation-level parameters override path-level ones with the same name and location.
    let mut parameters: Vec<Parameter> = raw.parameters.iter().map(convert_parameter).collect();
    for shared in shared_params {
        let overridden = raw
            .parameters
            .iter()
            .any(|p| p.name == shared.name && p.location == shared.location);
        if !overridden {
            parameters.push(convert_parameter(shared));
        }
    }

    let request_body = raw.request_body.as_ref().and_then(|body| {
        let (content_type, media) = preferred_media(&body.content)?;
        Some(RequestBody {
            content_type: content_type.clone(),
            ty: media.schema.as_ref().map(Schema::type_string).unwrap_or_default(),
            description: body.description.clone(),
            required: body.required,
        })
    });

    let responses = raw
        .responses
        .iter()
        .map(|(status, resp)| {
            let (content_type, ty) = preferred_media(&resp.content)
                .map(|(ct, media)| {
                    (
                        ct.clone(),
                        media.schema.as_ref().map(Schema::type_string).unwrap_or_default(),
                    )
                })
                .unwrap_or_default();
            Response {
                status: status.clone(),
                description: resp.description.clone(),
                content_type,
                ty,
            }
        })
        .collect();

    let mut auth = Vec::new();
    for requirement in &raw.security {
        for name in requirement.keys() {
            if !auth.contains(name) {
                auth.push(name.clone());
            }
        }
    }
    auth.sort();

    Operation {
        id,
        name: raw.summary.clone(),
        description: if raw.description.is_empty() {
            raw.summary
        } else {
            raw.description
        },
        method: method.to_uppercase(),
        path: path.to_string(),
        parameters,
        request_body,
        responses,
        tags: raw.tags,
        deprecated: raw.deprecated,
        auth,
        aliases: Vec::new(),
    }
}
