//! Application state shared across handlers.

use history_service::HistoryHandler;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Prompt history operations.
    pub history: HistoryHandler,
    /// Bearer token required on every request, if set.
    pub api_token: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(history: HistoryHandler, api_token: Option<String>) -> Self {
        Self { history, api_token }
    }
}
