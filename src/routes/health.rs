/**
 * Health Routes
 * Liveness and store reachability
 */
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub const API_VERSION: &str = "1.0.0";
pub const SERVICE_NAME: &str = "portfolio-api";

/// Response for GET /api/
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
}

/// Response for GET /api/health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Single dependency check
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/
pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Portfolio API is running".to_string(),
        status: "healthy".to_string(),
        version: API_VERSION.to_string(),
    })
}

/// GET /api/health - does not touch the store
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// GET /api/health/database - always 200, the body carries the verdict
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    let check = match state.store.ping().await {
        Ok(duration) => ServiceCheck {
            status: "healthy".to_string(),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ServiceCheck {
                status: "unhealthy".to_string(),
                response_time: None,
                error: Some("database unreachable".to_string()),
            }
        }
    };
    Json(check)
}
