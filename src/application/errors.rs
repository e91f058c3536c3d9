//! Application layer error types

use crate::domain::DomainError;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Failures talking to a Harbor instance
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timeout occurred after {seconds}s")]
    Timeout { seconds: u64 },

    /// Harbor answered, but with an error payload for this query
    #[error("Harbor reported an error: {message}")]
    Upstream { message: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Authentication failed")]
    Authentication,
}

/// Scan report decoding failures; always recovered into the unknown summary
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    #[error("Cache operation failed: {message}")]
    Operation { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },
}

impl ApplicationError {
    /// Get the error type as a string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApplicationError::Domain(DomainError::InvalidInput { .. }) => "invalid_input",
            ApplicationError::Domain(_) => "not_found",
            ApplicationError::Registry(RegistryError::Timeout { .. }) => "upstream_timeout",
            ApplicationError::Registry(RegistryError::Upstream { .. }) => "upstream_error",
            ApplicationError::Registry(_) => "upstream_unavailable",
            ApplicationError::Cache(_) => "cache_error",
            ApplicationError::Configuration { .. } => "configuration_error",
        }
    }
}
