//! HTTP API for prompt history and paid prompt enhancement.
//!
//! Callers are identified by headers set by an upstream gateway; see
//! [`auth`]. Every route except `/health` requires `X-User-Id`.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use state::AppState;

/// Build the application with its state attached.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}
