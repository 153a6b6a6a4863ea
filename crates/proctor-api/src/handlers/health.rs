//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub capture_dir: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness check endpoint (readiness probe).
///
/// Detectors are loaded before the server binds, so only the capture
/// directory is checked here.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let check = match tokio::fs::create_dir_all(state.frames.root()).await {
        Ok(()) => CheckStatus {
            status: "ok".to_string(),
            error: None,
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            error: Some(e.to_string()),
        },
    };

    let ok = check.status == "ok";
    let response = ReadinessResponse {
        status: if ok { "ready" } else { "degraded" }.to_string(),
        capture_dir: check,
    };

    if ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
