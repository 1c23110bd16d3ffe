//! Health check endpoint: GET /health

use axum::{extract::State, response::Json};
use serde::Serialize;

use super::super::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    pending_events: usize,
    uptime_secs: u64,
}

/// GET /health - Liveness plus the number of pending events
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pending_events: state.registry.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
