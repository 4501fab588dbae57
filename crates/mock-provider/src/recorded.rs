//! Static provider - answers every call with the same completion.

use std::sync::Mutex;

use enhance_core::{async_trait, Completion, CompletionProvider, ProviderError};

/// One recorded call to a mock provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub prompt: String,
    pub model: String,
}

/// A provider that returns a fixed completion and records every call.
#[derive(Debug)]
pub struct StaticProvider {
    text: String,
    tokens: u32,
    name: String,
    calls: Mutex<Vec<ProviderCall>>,
}

impl StaticProvider {
    /// Create a provider answering `text` with `tokens` consumed.
    ///
    /// The text is trimmed the same way a real provider's output is.
    pub fn new(text: impl Into<String>, tokens: u32) -> Self {
        Self {
            text: text.into(),
            tokens,
            name: "StaticProvider".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the name reported by [`CompletionProvider::name`].
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// All calls made so far, oldest first.
    pub fn calls(&self) -> Vec<ProviderCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, prompt: &str, model: &str) {
        let call = ProviderCall {
            prompt: prompt.to_string(),
            model: model.to_string(),
        };
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }
}

#[async_trait]
impl CompletionProvider for StaticProvider {
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ProviderError> {
        self.record(prompt, model);
        Ok(Completion::new(&self.text, self.tokens))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
