//! Test doubles for the enhancement pipeline.
//!
//! This crate provides mock implementations of the collaborator traits:
//! - `StaticProvider` - Answers every call with a fixed completion
//! - `FailingProvider` - Fails every call with a fixed error
//! - `GatedProvider` - Holds calls until the test releases them
//! - `InMemoryLedger` - A credit ledger backed by a map
//!
//! Production wiring uses the `openai-provider` and `anthropic-provider`
//! crates and the SQLite ledger instead.
//!
//! # Example
//!
//! ```rust
//! use mock_provider::{CompletionProvider, Credits, CreditLedger, InMemoryLedger, StaticProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = StaticProvider::new("Better prompt", 42);
//!     let completion = provider.complete("make it better", "gpt-4o").await.unwrap();
//!     assert_eq!(completion.text, "Better prompt");
//!
//!     let ledger = InMemoryLedger::new().with_balance("alice", Credits::from_cents(100));
//!     assert_eq!(ledger.balance("alice").await.unwrap(), Credits::from_cents(100));
//! }
//! ```

mod failing;
mod gated;
mod ledger;
mod recorded;

pub use enhance_core::{
    async_trait, Completion, CompletionProvider, CreditLedger, Credits, DebitReceipt,
    LedgerError, ProviderError,
};

pub use failing::FailingProvider;
pub use gated::{GateHandle, GatedProvider};
pub use ledger::{DebitRecord, InMemoryLedger};
pub use recorded::{ProviderCall, StaticProvider};
