//! Error types for external collaborators.

use thiserror::Error;

/// Errors returned by an AI completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The client is missing configuration (API key, URL).
    #[error("provider misconfigured: {0}")]
    Configuration(String),

    /// The request never reached the provider or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the client timeout.
    #[error("provider request timed out")]
    Timeout,

    /// The provider rejected the request with HTTP 429.
    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider answered with a non-success status.
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be understood.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Errors returned by the credit ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The ledger could not be reached or failed internally.
    #[error("credit ledger unavailable: {0}")]
    Unavailable(String),

    /// No account exists for the user being debited.
    #[error("no credit account for user: {0}")]
    UnknownAccount(String),
}
