//! Core traits and types for prompt enhancement.
//!
//! This crate provides the shared vocabulary between the history service and
//! the external systems it consumes. It defines:
//!
//! - [`Credits`] - Fixed-point credit amounts (hundredths of a credit)
//! - [`CompletionProvider`] - The trait every AI provider client implements
//! - [`CreditLedger`] - The billing ledger capability the service requires
//! - [`ProviderError`] / [`LedgerError`] - Failures of those collaborators
//!
//! # Example
//!
//! ```rust
//! use enhance_core::{async_trait, Completion, CompletionProvider, ProviderError};
//!
//! struct Shouty;
//!
//! #[async_trait]
//! impl CompletionProvider for Shouty {
//!     async fn complete(&self, prompt: &str, _model: &str) -> Result<Completion, ProviderError> {
//!         Ok(Completion::new(prompt.to_uppercase(), 1))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Shouty"
//!     }
//! }
//! ```

mod credits;
mod error;
mod ledger;
mod provider;

pub use credits::{Credits, ParseCreditsError};
pub use error::{LedgerError, ProviderError};
pub use ledger::{CreditLedger, DebitReceipt};
pub use provider::{Completion, CompletionProvider};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
