//! Caller identity.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user in `X-User-Id` and their role in `X-User-Role`; when a shared token
//! is configured, requests must also carry it as a bearer token.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use history_service::Actor;

use crate::error::ApiError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        authorize(state.api_token.as_deref(), &parts.headers)?;

        let user_id = header_str(&parts.headers, USER_ID_HEADER)
            .ok_or(ApiError::Unauthorized("missing X-User-Id header"))?;

        let actor = match header_str(&parts.headers, USER_ROLE_HEADER) {
            Some(role) if is_moderator_role(role) => Actor::moderator(user_id),
            _ => Actor::user(user_id),
        };

        Ok(AuthUser(actor))
    }
}

fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Unauthorized("missing bearer token"));
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized("invalid bearer token"));
    };

    let Some(token) = value.strip_prefix("Bearer ") else {
        return Err(ApiError::Unauthorized("invalid bearer token"));
    };
    if token != expected {
        return Err(ApiError::Unauthorized("invalid bearer token"));
    }

    Ok(())
}

fn is_moderator_role(role: &str) -> bool {
    role.eq_ignore_ascii_case("moderator") || role.eq_ignore_ascii_case("staff")
}

/// A non-blank header value, trimmed.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
