//! Traits and wire types for Harbor API clients

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::application::errors::RegistryError;
use crate::domain::RegistryInstance;

/// Outcome of one Harbor query, decoded once at the client boundary
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResponse<T> {
    Success(T),
    /// Harbor answered with an error payload for this query
    UpstreamError(String),
    /// Harbor answered successfully with nothing in it
    Empty,
}

impl<T> UpstreamResponse<T> {
    /// Collapse into a result; upstream errors become `RegistryError::Upstream`
    pub fn into_result(self) -> Result<Option<T>, RegistryError> {
        match self {
            Self::Success(payload) => Ok(Some(payload)),
            Self::Empty => Ok(None),
            Self::UpstreamError(message) => Err(RegistryError::Upstream { message }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Artifact record from `GET .../repositories/{repo}/artifacts`
#[derive(Debug, Clone, Deserialize)]
pub struct HarborArtifact {
    pub project_id: i64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub tags: Option<Vec<HarborTag>>,
    /// Kept verbatim; the artifact id embeds it
    pub push_time: String,
    pub pull_time: String,
    #[serde(default)]
    pub scan_overview: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarborTag {
    pub name: String,
}

/// Body of `GET /api/v2.0/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarborSearchResult {
    #[serde(default)]
    pub project: Vec<Value>,
    #[serde(default)]
    pub repository: Vec<HarborSearchRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarborSearchRepository {
    pub project_name: String,
    /// Fully qualified, `project/repository`
    pub repository_name: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub pull_count: Option<i64>,
}

/// Trait for Harbor API clients
#[async_trait]
pub trait HarborApiClient: Send + Sync {
    /// List the most recent artifacts of a repository with tags and scan overviews.
    /// Records are returned undecoded so one bad record cannot spoil the rest.
    async fn list_artifacts(
        &self,
        instance: &RegistryInstance,
        project: &str,
        repository: &str,
    ) -> Result<UpstreamResponse<Vec<Value>>, RegistryError>;

    /// Run a global search for `term`
    async fn search(
        &self,
        instance: &RegistryInstance,
        term: &str,
    ) -> Result<UpstreamResponse<HarborSearchResult>, RegistryError>;
}
