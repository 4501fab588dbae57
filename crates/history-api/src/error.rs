//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use history_service::HistoryError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Missing caller identity or wrong bearer token.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// The request body was not valid JSON of the expected shape.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::History(HistoryError::Validation(err)) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "field": err.field(),
                    "message": err.to_string(),
                }),
            ),
            ApiError::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "field": "body",
                    "message": message,
                }),
            ),
            ApiError::History(HistoryError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": "Not found.",
                }),
            ),
            ApiError::History(HistoryError::PaymentRequired { required, current }) => (
                StatusCode::PAYMENT_REQUIRED,
                json!({
                    "error": "insufficient_credits",
                    "message": self.to_string(),
                    "required_credits": required,
                    "current_credits": current,
                }),
            ),
            ApiError::History(HistoryError::EnhancementFailed(message)) => {
                warn!("Enhancement failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "enhancement_failed",
                        "message": message,
                    }),
                )
            }
            ApiError::History(HistoryError::Conflict(message)) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message,
                }),
            ),
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized request: {}", message);
                (
                    StatusCode::UNAUTHORIZED,
                    json!({
                        "error": "unauthorized",
                        "message": message,
                    }),
                )
            }
            ApiError::History(HistoryError::Database(err)) => {
                error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "Internal server error",
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
