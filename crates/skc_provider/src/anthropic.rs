//! Anthropic Messages API.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::provider::{http_client, send_json, GenerateRequest, GenerateResponse, Provider};

/// Public Anthropic endpoint.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";

/// Client for `POST /v1/messages`.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Creates a client. `base_url` has any trailing slash removed.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl MessagesResponse {
    fn into_response(self, requested_model: &str) -> Result<GenerateResponse, ProviderError> {
        let content: String = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text)
            .collect();
        if content.is_empty() {
            return Err(ProviderError::Decode("response contained no text".to_string()));
        }
        Ok(GenerateResponse {
            content,
            model: if self.model.is_empty() {
                requested_model.to_string()
            } else {
                self.model
            },
            tokens_in: self.usage.input_tokens,
            tokens_out: self.usage.output_tokens,
        })
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = MessagesRequest {
            model,
            max_tokens: request.max_tokens,
            system: &request.system_prompt,
            messages: [Message {
                role: "user",
                content: &request.user_message,
            }],
        };

        let started = Instant::now();
        let http = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        let raw: MessagesResponse = send_json(http).await?;
        let response = raw.into_response(model)?;
        tracing::debug!(
            model = %response.model,
            tokens_in = response.tokens_in,
            tokens_out = response.tokens_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "anthropic call complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateRequest {
        GenerateRequest {
            system_prompt: "You write skills.".into(),
            user_message: "IR here".into(),
            max_tokens: 8192,
            model: None,
        }
    }

    #[tokio::test]
    async fn sends_messages_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-sonnet-4-6",
                "max_tokens": 8192,
                "system": "You write skills.",
                "messages": [{"role": "user", "content": "IR here"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "claude-sonnet-4-6",
                "content": [
                    {"type": "text", "text": "# Skill"},
                    {"type": "text", "text": "\nbody"}
                ],
                "usage": {"input_tokens": 120, "output_tokens": 40}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("sk-test", "claude-sonnet-4-6", format!("{}/", server.uri())).unwrap();
        let response = provider.generate(request()).await.unwrap();
        assert_eq!(response.content, "# Skill\nbody");
        assert_eq!(response.model, "claude-sonnet-4-6");
        assert_eq!(response.tokens_in, 120);
        assert_eq!(response.tokens_out, 40);
    }

    #[tokio::test]
    async fn request_model_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(body_partial_json(json!({"model": "claude-opus-4-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "ok"}]
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("k", "claude-sonnet-4-6", server.uri()).unwrap();
        let response = provider
            .generate(GenerateRequest {
                model: Some("claude-opus-4-1".into()),
                ..request()
            })
            .await
            .unwrap();
        assert_eq!(response.model, "claude-opus-4-1");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("bad", "m", server.uri()).unwrap();
        let err = provider.generate(request()).await.unwrap_err();
        match err {
            ProviderError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid x-api-key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_content_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new("k", "m", server.uri()).unwrap();
        assert!(matches!(
            provider.generate(request()).await,
            Err(ProviderError::Decode(_))
        ));
    }
}
