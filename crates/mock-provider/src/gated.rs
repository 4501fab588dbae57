//! Gated provider - holds each call until the test lets it through.

use std::sync::Arc;

use enhance_core::{async_trait, Completion, CompletionProvider, ProviderError};
use tokio::sync::{watch, Semaphore};

/// Wraps another provider and parks every call at a gate.
///
/// Each call announces itself through [`GateHandle::wait_for_entered`] and
/// then waits for a permit from [`GateHandle::release`]. Tests use this to
/// line up concurrent requests at the provider call deterministically.
pub struct GatedProvider<P: CompletionProvider> {
    inner: P,
    gate: Arc<Semaphore>,
    entered: watch::Sender<usize>,
}

/// Test-side control of a [`GatedProvider`].
#[derive(Clone)]
pub struct GateHandle {
    gate: Arc<Semaphore>,
    entered: watch::Receiver<usize>,
}

impl<P: CompletionProvider> GatedProvider<P> {
    /// Wrap `inner`, returning the provider and its handle.
    pub fn new(inner: P) -> (Self, GateHandle) {
        let gate = Arc::new(Semaphore::new(0));
        let (entered, entered_rx) = watch::channel(0);

        let provider = Self {
            inner,
            gate: Arc::clone(&gate),
            entered,
        };
        let handle = GateHandle {
            gate,
            entered: entered_rx,
        };

        (provider, handle)
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl GateHandle {
    /// Let `calls` parked (or future) calls proceed.
    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    /// Wait until at least `calls` calls have reached the gate.
    pub async fn wait_for_entered(&self, calls: usize) {
        let mut entered = self.entered.clone();
        // The sender lives as long as the provider; a dropped provider ends the wait.
        let _ = entered.wait_for(|count| *count >= calls).await;
    }

    /// Number of calls that have reached the gate.
    pub fn entered(&self) -> usize {
        *self.entered.borrow()
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for GatedProvider<P> {
    async fn complete(&self, prompt: &str, model: &str) -> Result<Completion, ProviderError> {
        self.entered.send_modify(|count| *count += 1);

        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ProviderError::Network("gate closed".to_string()))?;
        permit.forget();

        self.inner.complete(prompt, model).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticProvider;

    #[tokio::test]
    async fn test_gate_holds_until_released() {
        let (provider, handle) = GatedProvider::new(StaticProvider::new("ok", 1));
        let provider = Arc::new(provider);

        let task = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.complete("p", "gpt-4o").await })
        };

        handle.wait_for_entered(1).await;
        assert_eq!(handle.entered(), 1);
        assert_eq!(provider.inner().call_count(), 0);

        handle.release(1);
        let completion = task.await.unwrap().unwrap();
        assert_eq!(completion.text, "ok");
        assert_eq!(provider.inner().call_count(), 1);
    }
}
