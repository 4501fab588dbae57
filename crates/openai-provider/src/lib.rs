//! OpenAI chat-completions provider.
//!
//! Implements [`CompletionProvider`] for GPT-family models. The enhancement
//! instruction is sent as the user message under a fixed system prompt and
//! the response's `total_tokens` is reported as the tokens consumed.
//!
//! ```rust,no_run
//! use openai_provider::{CompletionProvider, OpenAiProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAiProvider::from_env()?;
//!     let completion = provider.complete("Rewrite: say hi", "gpt-4o-mini").await?;
//!     println!("{} ({} tokens)", completion.text, completion.tokens_consumed);
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::OpenAiProvider;
pub use config::{OpenAiConfig, OpenAiConfigBuilder};

pub use enhance_core::{Completion, CompletionProvider, ProviderError};
