//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query parameters for listing a repository's artifacts
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArtifactsQuery {
    /// Configured instance host; empty selects the default instance
    #[serde(default)]
    pub host: String,

    /// Harbor project name
    #[param(example = "es")]
    pub project: String,

    /// Repository name inside the project, URL encoded
    #[param(example = "pipectl")]
    pub repository: String,
}

/// Query parameters for the per-team latest artifact listing
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamArtifactsQuery {
    /// Team name, used as cache key
    #[param(example = "platform")]
    pub team: String,

    /// Component type of the listed repositories
    #[serde(rename = "type", default)]
    #[param(example = "service")]
    pub component_type: Option<String>,

    /// Configured instance host; empty selects the default instance
    #[serde(default)]
    pub host: String,
}

/// Query parameters for repository search
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Configured instance host; empty selects the default instance
    #[serde(default)]
    pub host: String,

    /// Team name; when present results are cached under it
    pub team: Option<String>,
}

/// One repository name to search for
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchItem {
    #[schema(example = "pipectl")]
    pub repository: String,
}

/// Error response model
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "NOT_FOUND")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "No Harbor instance configured for host 'harbor.dev'")]
    pub message: String,

    /// Additional error context
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,

    /// Error timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Liveness response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Readiness response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    #[schema(example = "ready")]
    pub status: String,

    /// Active cache backend
    #[schema(example = "redis")]
    pub cache: String,

    /// Number of configured Harbor instances
    #[schema(example = 2)]
    pub instances: usize,

    /// Why the service is not ready
    pub error: Option<String>,
}
