//! Picking a provider from resolved settings.

use std::sync::Arc;

use skc_config::ResolvedProvider;

use crate::anthropic::{AnthropicProvider, ANTHROPIC_BASE_URL};
use crate::error::ProviderError;
use crate::openai::{OpenAiProvider, OPENAI_BASE_URL};
use crate::provider::Provider;

/// Model used for Anthropic-protocol providers when none is configured.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-6";

/// Model used for OpenAI-protocol providers when none is configured.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Protocol {
    Anthropic,
    OpenAi,
}

/// Builds the provider named by `resolved`.
///
/// `anthropic` and `openai` map to their public endpoints unless a base URL
/// is set. Any other name requires a base URL and speaks the Anthropic
/// protocol when the name contains `anthropic`, otherwise the OpenAI one.
pub fn build(resolved: &ResolvedProvider) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = resolved.provider.trim().to_lowercase();
    let base_url = resolved.base_url.as_deref().filter(|u| !u.trim().is_empty());

    let (protocol, default_base) = match name.as_str() {
        "anthropic" | "" => (Protocol::Anthropic, ANTHROPIC_BASE_URL),
        "openai" => (Protocol::OpenAi, OPENAI_BASE_URL),
        custom if base_url.is_some() => {
            if custom.contains("anthropic") {
                (Protocol::Anthropic, ANTHROPIC_BASE_URL)
            } else {
                (Protocol::OpenAi, OPENAI_BASE_URL)
            }
        }
        other => return Err(ProviderError::UnknownProvider(other.to_string())),
    };

    let env_var = match protocol {
        Protocol::Anthropic => "ANTHROPIC_API_KEY",
        Protocol::OpenAi => "OPENAI_API_KEY",
    };
    let api_key = resolved
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(ProviderError::MissingApiKey { env_var })?;
    let base_url = base_url.unwrap_or(default_base);
    let model = resolved.model.as_deref().filter(|m| !m.trim().is_empty());

    tracing::debug!(provider = %name, base_url, "building provider");
    Ok(match protocol {
        Protocol::Anthropic => Arc::new(AnthropicProvider::new(
            api_key,
            model.unwrap_or(DEFAULT_ANTHROPIC_MODEL),
            base_url,
        )?),
        Protocol::OpenAi => Arc::new(OpenAiProvider::new(
            api_key,
            model.unwrap_or(DEFAULT_OPENAI_MODEL),
            base_url,
        )?),
    })
}
