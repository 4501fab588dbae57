//! Prompt history endpoints.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use history_service::{
    CreateEntryRequest, EnhanceRequest, EnhancementResponse, EntryView, ListParams,
    PromptHistoryEntry, UpdateEntryRequest,
};

use crate::auth::{header_str, AuthUser, IDEMPOTENCY_KEY_HEADER};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `GET /history/`
pub async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PromptHistoryEntry>>> {
    let entries = state.history.list_entries(&actor, &params).await?;
    Ok(Json(entries))
}

/// `POST /history/`
pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    headers: HeaderMap,
    payload: std::result::Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PromptHistoryEntry>)> {
    let Json(request) = payload?;
    let key = header_str(&headers, IDEMPOTENCY_KEY_HEADER);

    let entry = state.history.create_entry(&actor, &request, key).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /history/:id/`
pub async fn get(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EntryView>> {
    let view = state.history.get_entry(&actor, &id).await?;
    Ok(Json(view))
}

/// `PATCH /history/:id/`
pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateEntryRequest>, JsonRejection>,
) -> Result<Json<PromptHistoryEntry>> {
    let Json(request) = payload?;

    let entry = state.history.update_entry(&actor, &id, &request).await?;
    Ok(Json(entry))
}

/// `DELETE /history/:id/`
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.history.delete_entry(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /history/:id/enhance/`
///
/// The body is optional; an empty body selects the default model and style.
pub async fn enhance(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EnhancementResponse>> {
    let request = parse_enhance_body(&body)?;
    let key = header_str(&headers, IDEMPOTENCY_KEY_HEADER);

    let response = state.history.enhance_entry(&actor, &id, &request, key).await?;
    Ok(Json(response))
}

fn parse_enhance_body(body: &[u8]) -> Result<EnhanceRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EnhanceRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enhance_body() {
        let request = parse_enhance_body(b"").unwrap();
        assert!(request.model.is_none());
        assert!(request.style.is_none());

        let request = parse_enhance_body(b" \n").unwrap();
        assert!(request.model.is_none());

        let request = parse_enhance_body(br#"{"model":"gpt-4o","style":"concise"}"#).unwrap();
        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
        assert_eq!(request.style.as_deref(), Some("concise"));

        assert!(matches!(
            parse_enhance_body(b"{not json"),
            Err(ApiError::InvalidBody(_))
        ));
    }
}
