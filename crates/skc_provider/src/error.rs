//! Provider errors.

/// Failure constructing a provider or completing a call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key was resolved.
    #[error("API key required: set SKC_API_KEY, {env_var}, or run `skc config set api-key <key>`")]
    MissingApiKey {
        /// The provider-specific variable that would also work.
        env_var: &'static str,
    },

    /// The provider name is not recognised and no base URL was given.
    #[error("unknown provider {0:?} (supported: anthropic, openai, or set base-url for a custom endpoint)")]
    UnknownProvider(String),

    /// The request never got a response.
    #[error("request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The call was abandoned because the run was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_env_var() {
        let err = ProviderError::MissingApiKey {
            env_var: "ANTHROPIC_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "API key required: set SKC_API_KEY, ANTHROPIC_API_KEY, or run `skc config set api-key <key>`"
        );
    }

    #[test]
    fn api_error_keeps_status_and_body() {
        let err = ProviderError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }
}
