//! Domain entities representing core business concepts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Tag reported for artifacts that carry no tag at all
pub const UNTAGGED: &str = "undefined";

/// Divisor used for the megabyte figure. Not 1024: existing consumers store
/// values computed with 1028 and compare against them.
const SIZE_DIVISOR: f64 = 1028.0 * 1028.0;

/// One configured Harbor endpoint with its credentials
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryInstance {
    /// Lookup key; empty string is the default instance
    pub host: String,
    pub api_base_url: String,
    pub username: String,
    pub password: String,
}

impl RegistryInstance {
    pub fn new(
        host: impl Into<String>,
        api_base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            api_base_url: api_base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether this is the unlabeled default instance
    pub fn is_default(&self) -> bool {
        self.host.is_empty()
    }

    /// Base URL without a trailing slash, ready for path interpolation
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

impl fmt::Debug for RegistryInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryInstance")
            .field("host", &self.host)
            .field("api_base_url", &self.api_base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Normalized vulnerability counts for one artifact.
///
/// All numeric fields are `-1` when no scan data is available, which keeps
/// "not scanned" apart from "scanned, nothing found".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VulnerabilitySummary {
    pub count: i64,
    pub severity: String,
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub none: i64,
}

impl VulnerabilitySummary {
    /// Sentinel summary for artifacts without usable scan data
    pub fn unknown() -> Self {
        Self {
            count: -1,
            severity: String::new(),
            critical: -1,
            high: -1,
            medium: -1,
            low: -1,
            none: -1,
        }
    }

    /// Build a summary from a total and the four tracked buckets;
    /// `none` is whatever the buckets do not account for.
    pub fn from_counts(
        severity: impl Into<String>,
        total: i64,
        critical: i64,
        high: i64,
        medium: i64,
        low: i64,
    ) -> Self {
        Self {
            count: total,
            severity: severity.into(),
            critical,
            high,
            medium,
            low,
            none: total - critical - high - medium - low,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.count == -1
    }
}

impl Default for VulnerabilitySummary {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One pushed image entry in a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Derived from project id, tag and push time; not globally unique
    pub id: String,
    #[serde(rename = "projectID")]
    pub project_id: i64,
    pub tag: String,
    #[serde(rename = "artifactDigest")]
    pub digest: String,
    /// Size in megabytes, two decimals
    #[serde(rename = "size")]
    pub size_mb: f64,
    pub repo_url: String,
    #[serde(with = "harbor_time")]
    pub pull_time: DateTime<Utc>,
    #[serde(with = "harbor_time")]
    pub push_time: DateTime<Utc>,
    pub vulnerabilities: VulnerabilitySummary,
}

impl Artifact {
    /// Compose the artifact id the way existing consumers expect it
    pub fn derive_id(project_id: i64, tag: &str, push_time: &str) -> String {
        format!("{project_id}{tag}{push_time}")
    }

    /// Convert a byte count into the rounded megabyte figure
    pub fn size_in_mb(size_bytes: i64) -> f64 {
        ((size_bytes as f64 / SIZE_DIVISOR) * 100.0).round() / 100.0
    }
}

/// Timestamps in Harbor's own layout, always with milliseconds and a `Z` suffix
mod harbor_time {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// Identifies a repository inside a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RepoInformation {
    #[schema(example = "es")]
    pub project: String,
    #[schema(example = "pipectl")]
    pub repository: String,
}

impl RepoInformation {
    pub fn new(project: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            repository: repository.into(),
        }
    }
}

/// Latest artifact of a repository, labeled with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamArtifact {
    #[serde(flatten)]
    pub artifact: Artifact,
    pub project: String,
    pub repository: String,
}

impl TeamArtifact {
    pub fn new(artifact: Artifact, repo: &RepoInformation) -> Self {
        Self {
            artifact,
            project: repo.project.clone(),
            repository: repo.repository.clone(),
        }
    }
}

/// A repository that could not contribute to a team aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFailure {
    pub project: String,
    pub repository: String,
    #[serde(rename = "errorMsg")]
    pub error_msg: String,
}

impl RepositoryFailure {
    pub fn new(repo: &RepoInformation, error_msg: impl Into<String>) -> Self {
        Self {
            project: repo.project.clone(),
            repository: repo.repository.clone(),
            error_msg: error_msg.into(),
        }
    }
}

/// Outcome of a latest-artifact-per-repository aggregation
#[derive(Debug, Clone, Default)]
pub struct TeamArtifactsReport {
    pub artifacts: Vec<TeamArtifact>,
    pub errors: Vec<RepositoryFailure>,
}
