//! Failing provider - every call returns the configured error.

use std::sync::atomic::{AtomicUsize, Ordering};

use enhance_core::{async_trait, Completion, CompletionProvider, ProviderError};

/// A provider whose every call fails with the same error.
#[derive(Debug)]
pub struct FailingProvider {
    error: ProviderError,
    calls: AtomicUsize,
}

impl FailingProvider {
    /// Create a provider that fails with `error`.
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that times out.
    pub fn timeout() -> Self {
        Self::new(ProviderError::Timeout)
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _prompt: &str, _model: &str) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "FailingProvider"
    }
}
