/**
 * Contact Routes
 * Visitor messages: submit, list, fetch, update status
 */
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{body_rejection, query_rejection};
use crate::db::models::{ContactMessage, NewContactMessage, ValidationErrors};
use crate::error::ApiError;
use crate::services::DEFAULT_LIMIT;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/contact
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

/// Query parameters for PATCH /api/contact/{id}/status
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/contact
pub async fn create_message(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ContactMessage>, ApiError> {
    let Json(payload) = payload.map_err(body_rejection)?;
    let fields = payload
        .as_object()
        .ok_or_else(|| ValidationErrors::single("body", "must be a JSON object"))?;

    let input = NewContactMessage::from_fields(fields)?;
    let message = state.contact.create(input).await?;
    Ok(Json(message))
}

/// GET /api/contact?skip=&limit=
pub async fn list_messages(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;
    let messages = state.contact.list(query.skip, query.limit).await?;
    Ok(Json(messages))
}

/// GET /api/contact/{id}
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact.get(&id).await?))
}

/// PATCH /api/contact/{id}/status
///
/// The new status comes from the `status` query parameter, or failing that
/// from a JSON body `{"status": "..."}`.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<StatusQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<StatusUpdateResponse>, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;
    let status = match query.status {
        Some(status) => status,
        None => status_from_body(&body)?,
    };

    state.contact.update_status(&id, &status).await?;
    Ok(Json(StatusUpdateResponse {
        message: "Status updated successfully".to_string(),
    }))
}

fn status_from_body(body: &[u8]) -> Result<String, ValidationErrors> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationErrors::single("status", "field required"));
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationErrors::single("body", format!("Invalid JSON: {e}")))?;

    match payload.get("status") {
        Some(Value::String(status)) => Ok(status.clone()),
        Some(_) => Err(ValidationErrors::single("status", "must be a string")),
        None => Err(ValidationErrors::single("status", "field required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_body() {
        assert_eq!(status_from_body(br#"{"status":"read"}"#).unwrap(), "read");

        let missing = status_from_body(b"").unwrap_err();
        assert_eq!(missing.fields()[0].field, "status");

        let wrong_type = status_from_body(br#"{"status":3}"#).unwrap_err();
        assert_eq!(wrong_type.fields()[0].field, "status");

        let garbage = status_from_body(b"{not json").unwrap_err();
        assert_eq!(garbage.fields()[0].field, "body");
    }
}
