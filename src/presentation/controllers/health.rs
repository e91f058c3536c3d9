//! Health check controller

use axum::{extract::State, http::StatusCode, response::Json};

use crate::presentation::controllers::AppState;
use crate::presentation::models::{HealthResponse, ReadinessResponse};

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe: the cache answers and at least one Harbor instance is configured
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready to accept traffic", body = ReadinessResponse),
        (status = 503, description = "Service is not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_probe(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let instances = app_state.resolver.len();
    let error = match app_state.cache_service.ping().await {
        Err(e) => Some(format!("cache unavailable: {}", e)),
        Ok(()) if instances == 0 => Some("no Harbor instances configured".to_string()),
        Ok(()) => None,
    };

    let status = if error.is_none() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if error.is_none() { "ready" } else { "not_ready" }.to_string(),
            cache: app_state.cache_service.backend().to_string(),
            instances,
            error,
        }),
    )
}
