//! OpenAI provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use enhance_core::{Completion, CompletionProvider, ProviderError};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenAiConfig;

/// Completion provider backed by the OpenAI chat-completions API.
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "OpenAI API key is empty".to_string(),
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
            "OpenAI provider initialized"
        );

        Ok(Self { client, config })
    }

    /// Create a provider from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str, model: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::system(&self.config.system_prompt),
                ChatMessage::user(prompt),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url.trim_end_matches('/'));
        let request = self.build_request(prompt, model);

        debug!(model = %model, "Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), model = %model, "OpenAI API returned an error");
            return Err(error_for_status(status.as_u16(), &body));
        }

        let completion = parse_completion(&body)?;
        debug!(tokens = completion.tokens_consumed, "Received response from OpenAI API");

        Ok(completion)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        debug!(timeout_secs = timeout.as_secs(), "OpenAI request timed out");
        ProviderError::Timeout
    } else {
        ProviderError::Network(format!("Failed to send request: {}", err))
    }
}

/// Map a non-success response to a provider error.
pub(crate) fn error_for_status(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    if status == 429 {
        ProviderError::RateLimited(message)
    } else {
        ProviderError::Api { status, message }
    }
}

/// Extract the text and token count from a successful response body.
pub(crate) fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let text = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .ok_or_else(|| ProviderError::MalformedResponse("response has no content".to_string()))?;

    let tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0);

    Ok(Completion::new(text, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig::builder().api_key("sk-test").build()).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let result = OpenAiProvider::new(OpenAiConfig::default());
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }

    #[test]
    fn test_build_request() {
        let request = provider().build_request("Make this better", "gpt-4o");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are a prompt engineering expert.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Make this better");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Better prompt\n"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42}
        }"#;

        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.text, "Better prompt");
        assert_eq!(completion.tokens_consumed, 42);
    }

    #[test]
    fn test_parse_completion_without_content() {
        let body = r#"{"choices": [], "usage": {"total_tokens": 3}}"#;
        assert!(matches!(
            parse_completion(body),
            Err(ProviderError::MalformedResponse(_))
        ));

        assert!(matches!(
            parse_completion("<html>bad gateway</html>"),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_error_for_status() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        assert_eq!(
            error_for_status(429, body),
            ProviderError::RateLimited("Rate limit reached".to_string())
        );

        assert_eq!(
            error_for_status(500, "upstream exploded"),
            ProviderError::Api {
                status: 500,
                message: "upstream exploded".to_string()
            }
        );
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().name(), "openai");
    }
}
