//! Configuration for the OpenAI provider.

use enhance_core::ProviderError;
use std::env;
use std::time::Duration;

/// System prompt sent with every enhancement request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a prompt engineering expert.";

/// Configuration for [`OpenAiProvider`](crate::OpenAiProvider).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// OpenAI API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// System message preceding the instruction.
    pub system_prompt: String,

    /// Maximum tokens for the response.
    pub max_tokens: u32,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: f32,

    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.api_url);

        let timeout = env::var("OPENAI_TIMEOUT_SECS")
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
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }
}

/// Builder for OpenAiConfig.
#[derive(Debug, Default)]
pub struct OpenAiConfigBuilder {
    config: OpenAiConfig,
}

impl OpenAiConfigBuilder {
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

    /// Set the system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
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
    pub fn build(self) -> OpenAiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();

        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_all_options() {
        let config = OpenAiConfig::builder()
            .api_key("sk-test")
            .api_url("http://localhost:9999")
            .system_prompt("Be brief")
            .max_tokens(64)
            .temperature(0.2)
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_url, "http://localhost:9999");
        assert_eq!(config.system_prompt, "Be brief");
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    // Env vars are process-global, so all scenarios run in one test.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_openai_vars() {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_API_URL");
            std::env::remove_var("OPENAI_TIMEOUT_SECS");
        }

        // Missing API key
        clear_all_openai_vars();
        match OpenAiConfig::from_env() {
            Err(ProviderError::Configuration(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Defaults
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "sk-env");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.api_url, "https://api.openai.com");
        assert_eq!(config.timeout, Duration::from_secs(30));

        // Overrides, with an unparsable timeout falling back
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "sk-env");
        std::env::set_var("OPENAI_API_URL", "http://proxy.local");
        std::env::set_var("OPENAI_TIMEOUT_SECS", "12");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://proxy.local");
        assert_eq!(config.timeout, Duration::from_secs(12));

        std::env::set_var("OPENAI_TIMEOUT_SECS", "soon");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));

        clear_all_openai_vars();
    }
}
