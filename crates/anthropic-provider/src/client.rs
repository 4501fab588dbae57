//! Anthropic provider implementation.

use async_trait::async_trait;
use enhance_core::{Completion, CompletionProvider, ProviderError};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, Message, MessagesRequest, MessagesResponse};
use crate::config::{AnthropicConfig, ANTHROPIC_VERSION};

/// Completion provider backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "Anthropic API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            api_url = %config.api_url,
            timeout_secs = config.timeout.as_secs(),
            "Anthropic provider initialized"
        );

        Ok(Self { client, config })
    }

    /// Create a provider from environment variables.
    ///
    /// See [`AnthropicConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(AnthropicConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str, model: &str) -> MessagesRequest {
        MessagesRequest {
            model: model.to_string(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ProviderError> {
        let url = format!("{}/v1/messages", self.config.api_url.trim_end_matches('/'));
        let request = self.build_request(prompt, model);

        debug!(model = %model, "Sending request to Anthropic API");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), model = %model, "Anthropic API returned an error");
            return Err(error_for_status(status.as_u16(), &body));
        }

        let completion = parse_completion(&body)?;
        debug!(tokens = completion.tokens_consumed, "Received response from Anthropic API");

        Ok(completion)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(format!("Failed to send request: {}", err))
    }
}

/// Map a non-success response to a provider error.
pub(crate) fn error_for_status(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) if status == 429 || api_error.error.error_type == "rate_limit_error" => {
            ProviderError::RateLimited(api_error.error.message)
        }
        Ok(api_error) => ProviderError::Api {
            status,
            message: format!("{}: {}", api_error.error.error_type, api_error.error.message),
        },
        Err(_) if status == 429 => ProviderError::RateLimited(body.to_string()),
        Err(_) => ProviderError::Api {
            status,
            message: body.to_string(),
        },
    }
}

/// Join the text blocks of a response and sum its usage.
pub(crate) fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let text: Vec<&str> = response
        .content
        .iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    if text.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "response has no text content".to_string(),
        ));
    }

    let tokens = response
        .usage
        .input_tokens
        .saturating_add(response.usage.output_tokens);

    Ok(Completion::new(text.join(""), tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig::builder().api_key("ak-test").build()).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_key() {
        assert!(matches!(
            AnthropicProvider::new(AnthropicConfig::default()),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_request() {
        let request = provider().build_request("Tighten this", "claude-3-5-haiku-20241022");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "claude-3-5-haiku-20241022");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Tighten this");
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_parse_completion_sums_usage() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "\nBetter prompt  "}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 30, "output_tokens": 12}
        }"#;

        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.text, "Better prompt");
        assert_eq!(completion.tokens_consumed, 42);
    }

    #[test]
    fn test_parse_completion_rejects_empty_content() {
        let body = r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#;
        assert!(matches!(
            parse_completion(body),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_error_for_status() {
        let body = r#"{"type": "error", "error": {"type": "rate_limit_error", "message": "slow down"}}"#;
        assert_eq!(
            error_for_status(429, body),
            ProviderError::RateLimited("slow down".to_string())
        );

        let body = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        assert_eq!(
            error_for_status(529, body),
            ProviderError::Api {
                status: 529,
                message: "overloaded_error: Overloaded".to_string()
            }
        );

        assert!(matches!(
            error_for_status(502, "Bad Gateway"),
            ProviderError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().name(), "anthropic");
    }
}
