//! Error taxonomy shared by the services and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{FieldError, ValidationErrors};
use crate::db::StoreError;

/// JSON error body returned by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out-of-range input, reported per field.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// Anything unexpected. The source is logged, never rendered.
    #[error("internal error: {0}")]
    Internal(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors.into_inner()),
            },
            ApiError::BadRequest(message) | ApiError::NotFound(message) => ErrorResponse {
                error: message,
                details: None,
            },
            ApiError::Internal(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let (status, body) = render(ApiError::Validation(ValidationErrors::single(
            "email",
            "value is not a valid email address",
        )))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) = render(ApiError::Internal(StoreError::Config(
            "password=hunter2".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("hunter2"));
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_not_found_and_bad_request_carry_message() {
        let (status, body) = render(ApiError::NotFound("Project not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Project not found");

        let (status, _) = render(ApiError::BadRequest("nope".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
