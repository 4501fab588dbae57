//! Anthropic messages provider.
//!
//! Implements [`CompletionProvider`] for Claude-family models. The
//! enhancement instruction is sent as a single user message; tokens consumed
//! are `input_tokens + output_tokens` from the response usage block.

mod api_types;
mod client;
mod config;

pub use client::AnthropicProvider;
pub use config::{AnthropicConfig, AnthropicConfigBuilder, ANTHROPIC_VERSION};

pub use enhance_core::{Completion, CompletionProvider, ProviderError};
