//! HTTP middleware for the web server

use axum::{
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

use crate::application::errors::{ApplicationError, RegistryError};
use crate::domain::DomainError;
use crate::presentation::models::ErrorResponse;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: Uuid;
}

/// Id stamped by [`logging_middleware`] on the request being handled, if any
pub fn current_request_id() -> Option<Uuid> {
    REQUEST_ID.try_with(|id| *id).ok()
}

impl ApplicationError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApplicationError::Domain(DomainError::InvalidInput { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            ApplicationError::Domain(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApplicationError::Registry(RegistryError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT")
            }
            ApplicationError::Registry(RegistryError::Upstream { .. }) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            ApplicationError::Registry(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
            ApplicationError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            ApplicationError::Configuration { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
        }
    }
}

/// Error handling middleware
impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            ApplicationError::Domain(error) => error.to_string(),
            ApplicationError::Registry(_) => "Harbor request failed".to_string(),
            ApplicationError::Cache(_) => "Cache backend failed".to_string(),
            ApplicationError::Configuration { .. } => "Service configuration error".to_string(),
        };

        if status.is_server_error() {
            tracing::error!(code = code, error = %self, "Request failed");
        }

        let error_response = ErrorResponse {
            code: code.to_string(),
            message,
            details: Some(serde_json::json!({
                "type": self.error_type(),
                "error": self.to_string()
            })),
            request_id: current_request_id().unwrap_or_else(Uuid::new_v4),
            timestamp: Utc::now(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request<axum::body::Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let mut response = REQUEST_ID.scope(request_id, next.run(request)).await;
    let duration = start_time.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
