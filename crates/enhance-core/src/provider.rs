//! Completion provider trait.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Text returned by a provider together with the tokens it billed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text. [`Completion::new`] trims surrounding whitespace.
    pub text: String,
    /// Total tokens consumed by the call (prompt + completion).
    pub tokens_consumed: u32,
}

impl Completion {
    /// Create a completion, trimming the text.
    pub fn new(text: impl AsRef<str>, tokens_consumed: u32) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            tokens_consumed,
        }
    }
}

/// A client for an external AI completion service.
///
/// Implementations perform exactly one request per call and never retry.
/// This trait is object-safe and can be used with `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` to `model` and return the generated text.
    ///
    /// Timeouts, rate limits and unparseable responses surface as
    /// [`ProviderError`] variants.
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ProviderError>;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;
}
