//! Configuration for the Anthropic provider.

use enhance_core::ProviderError;
use std::env;
use std::time::Duration;

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for [`AnthropicProvider`](crate::AnthropicProvider).
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Anthropic API base URL.
    pub api_url: String,

    /// API key sent as `x-api-key`.
    pub api_key: String,

    /// Maximum tokens for the response.
    pub max_tokens: u32,

    /// Temperature for generation (0.0 - 1.0).
    pub temperature: f32,

    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl AnthropicConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ANTHROPIC_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `ANTHROPIC_API_URL` - API URL (default: https://api.anthropic.com)
    /// - `ANTHROPIC_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ProviderError::Configuration("ANTHROPIC_API_KEY not set".to_string())
        })?;

        let defaults = Self::default();

        let api_url = env::var("ANTHROPIC_API_URL").unwrap_or(defaults.api_url);

        let timeout = env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Ok(Self {
            api_url,
            api_key,
            timeout,
            ..defaults
        })
    }

    /// Create a new config builder.
    pub fn builder() -> AnthropicConfigBuilder {
        AnthropicConfigBuilder::default()
    }
}

/// Builder for AnthropicConfig.
#[derive(Debug, Default)]
pub struct AnthropicConfigBuilder {
    config: AnthropicConfig,
}

impl AnthropicConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = temp;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AnthropicConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnthropicConfig::default();

        assert_eq!(config.api_url, "https://api.anthropic.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = AnthropicConfig::builder()
            .api_key("ak-test")
            .max_tokens(100)
            .timeout(Duration::from_secs(3))
            .build();

        assert_eq!(config.api_key, "ak-test");
        assert_eq!(config.max_tokens, 100);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.api_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_anthropic_vars() {
            std::env::remove_var("ANTHROPIC_API_KEY");
            std::env::remove_var("ANTHROPIC_API_URL");
            std::env::remove_var("ANTHROPIC_TIMEOUT_SECS");
        }

        clear_all_anthropic_vars();
        assert!(matches!(
            AnthropicConfig::from_env(),
            Err(ProviderError::Configuration(_))
        ));

        std::env::set_var("ANTHROPIC_API_KEY", "ak-env");
        std::env::set_var("ANTHROPIC_TIMEOUT_SECS", "45");
        let config = AnthropicConfig::from_env().unwrap();
        assert_eq!(config.api_key, "ak-env");
        assert_eq!(config.api_url, "https://api.anthropic.com");
        assert_eq!(config.timeout, Duration::from_secs(45));

        clear_all_anthropic_vars();
    }
}
