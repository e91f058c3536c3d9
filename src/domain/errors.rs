//! Domain-specific error types

use thiserror::Error;

/// Domain-level errors for registry aggregation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No default Harbor instance configured")]
    NoDefaultInstance,

    #[error("No Harbor instance configured for host '{host}'")]
    InstanceNotFound { host: String },

    #[error("Invalid input for field {field}: {message}")]
    InvalidInput { field: String, message: String },
}

impl DomainError {
    /// Resolution failure for the given host key; an empty host means the default instance
    pub fn missing_instance(host: &str) -> Self {
        if host.is_empty() {
            Self::NoDefaultInstance
        } else {
            Self::InstanceNotFound {
                host: host.to_string(),
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoDefaultInstance | Self::InstanceNotFound { .. })
    }
}
