//! Health check handlers

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health - Liveness probe (fast, no dependencies)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "auth-api",
    })
}

/// GET /ready - Readiness probe
///
/// All backings are in-process, so readiness follows liveness.
pub async fn ready() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        service: "auth-api",
    })
}
