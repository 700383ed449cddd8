//! Health check and metrics endpoints
//!
//! - /health - Basic health check
//! - /health/ready - Readiness probe (checks the account store)
//! - /health/live - Liveness probe
//! - /metrics - Prometheus exposition

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual health checks
#[derive(Serialize)]
pub struct HealthChecks {
    pub accounts: CheckStatus,
    /// Live auth keys held in memory
    pub auth_keys: usize,
}

/// Status of an individual check
#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn respond(status: &str, checks: Option<HealthChecks>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    })
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    respond("healthy", None)
}

/// Readiness probe; 503 when the account store is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (ready, accounts) = match state.users().ping().await {
        Ok(()) => (
            true,
            CheckStatus {
                status: "healthy".to_string(),
                message: None,
            },
        ),
        Err(e) => (
            false,
            CheckStatus {
                status: "unhealthy".to_string(),
                message: Some(e.to_string()),
            },
        ),
    };

    let checks = HealthChecks {
        accounts,
        auth_keys: state.auth().tokens().len(),
    };

    if ready {
        Ok(respond("ready", Some(checks)))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, respond("not_ready", Some(checks))))
    }
}

/// Liveness probe
pub async fn liveness_check() -> Json<HealthResponse> {
    respond("alive", None)
}

/// Render Prometheus metrics; 404 when no recorder is installed
pub async fn render_metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(StatusCode::NOT_FOUND)
}
