//! Route handlers for the history API.

pub mod health;
pub mod history;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Prompt history
        .route("/history/", get(history::list).post(history::create))
        .route(
            "/history/:id/",
            get(history::get)
                .patch(history::update)
                .delete(history::delete),
        )
        .route("/history/:id/enhance/", post(history::enhance))
}
