/**
 * Routes Module
 * API route handlers
 */

pub mod contact;
pub mod health;
pub mod portfolio;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::models::ValidationErrors;
use crate::error::{ApiError, ErrorResponse};

/// Fallback for every path that matches no route.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not Found".to_string(),
            details: None,
        }),
    )
}

/// Unparseable bodies are reported like any other field error.
pub(crate) fn body_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    ApiError::Validation(ValidationErrors::single("body", rejection.body_text()))
}

pub(crate) fn query_rejection(rejection: QueryRejection) -> ApiError {
    tracing::debug!(error = %rejection.body_text(), "Rejected query string");
    ApiError::Validation(ValidationErrors::single("query", rejection.body_text()))
}
