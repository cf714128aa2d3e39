//! The provider contract.

use async_trait::async_trait;

use crate::error::ProviderError;

/// One generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// System prompt selecting the artifact's template.
    pub system_prompt: String,
    /// User message carrying the IR and instruction sections.
    pub user_message: String,
    /// Output token ceiling.
    pub max_tokens: u32,
    /// Model override for this call. `None` uses the provider's model.
    pub model: Option<String>,
}

/// The generated text plus usage accounting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateResponse {
    /// Generated text.
    pub content: String,
    /// Model that produced it, as reported by the service.
    pub model: String,
    /// Prompt tokens consumed.
    pub tokens_in: u64,
    /// Completion tokens produced.
    pub tokens_out: u64,
}

/// A text-generation service.
///
/// Implementations must be safe to call concurrently; the pipeline issues
/// one call per artifact in parallel.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name used in logs (`anthropic`, `openai`).
    fn name(&self) -> &str;

    /// The default model for requests that do not override it.
    fn model(&self) -> &str;

    /// Generates text for a single request.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError>;
}

/// Sends a prepared request and decodes a JSON success body.
///
/// Non-2xx responses become [`ProviderError::Api`] with the body kept
/// verbatim so service error messages reach the user.
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Default client timeout for a single generation call.
pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Http(e.to_string()))
}
