//! Application services for orchestrating registry queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::errors::{ApplicationError, RegistryError};
use crate::config::CacheConfig;
use crate::domain::{
    Artifact, DomainError, InstanceResolver, RegistryInstance, RepoInformation, RepositoryFailure,
    TeamArtifact, TeamArtifactsReport, UNTAGGED, dedup_by_repository, latest_by_push_time,
};
use crate::infrastructure::api_clients::{HarborApiClient, HarborArtifact, UpstreamResponse};
use crate::infrastructure::parsers::ScanOverviewNormalizer;

/// Service for managing caching strategies
/// Note: This trait is not dyn-compatible due to generic methods
/// Use concrete implementations instead of trait objects
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: serde::de::DeserializeOwned + Send;

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: serde::Serialize + Send + Sync;

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError>;
}

/// Service for listing the artifacts of one repository
#[async_trait]
pub trait ArtifactService: Send + Sync {
    /// Resolve `host` and list the newest artifacts of `project/repository`
    async fn fetch_artifacts(
        &self,
        host: &str,
        project: &str,
        repository: &str,
    ) -> Result<Vec<Artifact>, ApplicationError>;

    /// Same as `fetch_artifacts` against an already resolved instance
    async fn fetch_for_instance(
        &self,
        instance: &RegistryInstance,
        project: &str,
        repository: &str,
    ) -> Result<Vec<Artifact>, RegistryError>;
}

/// Service for looking up which projects hold a set of repository names
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(
        &self,
        host: &str,
        repository_names: &[String],
    ) -> Result<Vec<RepoInformation>, ApplicationError>;
}

/// Artifact service backed by a Harbor client
pub struct ArtifactServiceImpl {
    resolver: Arc<InstanceResolver>,
    client: Arc<dyn HarborApiClient>,
    normalizer: ScanOverviewNormalizer,
}

impl ArtifactServiceImpl {
    pub fn new(resolver: Arc<InstanceResolver>, client: Arc<dyn HarborApiClient>) -> Self {
        Self {
            resolver,
            client,
            normalizer: ScanOverviewNormalizer::new(),
        }
    }

    /// Browser link to the repository page. Single-level component encoding of the
    /// plain repository name, unlike the API path.
    pub fn repo_url(instance: &RegistryInstance, project_id: i64, repository: &str) -> String {
        format!(
            "{}/harbor/projects/{}/repositories/{}",
            instance.base_url(),
            project_id,
            urlencoding::encode(repository)
        )
    }

    fn parse_time(field: &str, value: &str) -> Result<DateTime<Utc>, DomainError> {
        DateTime::parse_from_rfc3339(value)
            .map(|time| time.with_timezone(&Utc))
            .map_err(|e| DomainError::InvalidInput {
                field: field.to_string(),
                message: format!("'{}' is not an RFC 3339 timestamp: {}", value, e),
            })
    }

    /// Turn one raw Harbor record into an artifact
    fn enrich(
        &self,
        instance: &RegistryInstance,
        repository: &str,
        raw: Value,
    ) -> Result<Artifact, ApplicationError> {
        let raw: HarborArtifact = serde_json::from_value(raw).map_err(RegistryError::Json)?;

        let tag = raw
            .tags
            .as_deref()
            .and_then(|tags| tags.first())
            .map(|tag| tag.name.clone())
            .unwrap_or_else(|| UNTAGGED.to_string());

        Ok(Artifact {
            id: Artifact::derive_id(raw.project_id, &tag, &raw.push_time),
            project_id: raw.project_id,
            repo_url: Self::repo_url(instance, raw.project_id, repository),
            size_mb: Artifact::size_in_mb(raw.size),
            pull_time: Self::parse_time("pull_time", &raw.pull_time)?,
            push_time: Self::parse_time("push_time", &raw.push_time)?,
            vulnerabilities: self.normalizer.normalize(raw.scan_overview.as_ref()),
            digest: raw.digest,
            tag,
        })
    }
}

#[async_trait]
impl ArtifactService for ArtifactServiceImpl {
    async fn fetch_artifacts(
        &self,
        host: &str,
        project: &str,
        repository: &str,
    ) -> Result<Vec<Artifact>, ApplicationError> {
        let instance = self.resolver.resolve(host)?;
        Ok(self.fetch_for_instance(instance, project, repository).await?)
    }

    async fn fetch_for_instance(
        &self,
        instance: &RegistryInstance,
        project: &str,
        repository: &str,
    ) -> Result<Vec<Artifact>, RegistryError> {
        let response = self
            .client
            .list_artifacts(instance, project, repository)
            .await?;

        let Some(raw_artifacts) = response.into_result()? else {
            debug!(project = %project, repository = %repository, "No artifacts found");
            return Ok(Vec::new());
        };

        let total = raw_artifacts.len();
        let mut artifacts = Vec::with_capacity(total);
        for raw in raw_artifacts {
            match self.enrich(instance, repository, raw) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    error!(
                        project = %project,
                        repository = %repository,
                        "Dropping artifact that could not be converted: {}",
                        e
                    );
                }
            }
        }

        debug!(
            project = %project,
            repository = %repository,
            "Converted {} of {} artifacts",
            artifacts.len(),
            total
        );
        Ok(artifacts)
    }
}

/// Search service fanning out one Harbor search per repository name
pub struct SearchServiceImpl {
    resolver: Arc<InstanceResolver>,
    client: Arc<dyn HarborApiClient>,
}

impl SearchServiceImpl {
    pub fn new(resolver: Arc<InstanceResolver>, client: Arc<dyn HarborApiClient>) -> Self {
        Self { resolver, client }
    }

    /// Run one search; every failure is logged and yields no matches
    async fn search_term(
        client: Arc<dyn HarborApiClient>,
        instance: RegistryInstance,
        term: String,
    ) -> Vec<RepoInformation> {
        let result = match client.search(&instance, &term).await {
            Ok(UpstreamResponse::Success(result)) => result,
            Ok(UpstreamResponse::Empty) => {
                debug!(term = %term, "Search found no repositories");
                return Vec::new();
            }
            Ok(UpstreamResponse::UpstreamError(message)) => {
                warn!(term = %term, "Harbor search reported an error: {}", message);
                return Vec::new();
            }
            Err(e) => {
                warn!(term = %term, "Harbor search failed: {}", e);
                return Vec::new();
            }
        };

        result
            .repository
            .into_iter()
            .filter_map(|entry| {
                // only the second segment is kept; deeper names lose their tail
                match entry.repository_name.split('/').nth(1) {
                    Some(repository) => Some(RepoInformation::new(entry.project_name, repository)),
                    None => {
                        debug!(
                            name = %entry.repository_name,
                            "Skipping search hit without a project prefix"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl SearchService for SearchServiceImpl {
    async fn search(
        &self,
        host: &str,
        repository_names: &[String],
    ) -> Result<Vec<RepoInformation>, ApplicationError> {
        let instance = self.resolver.resolve(host)?;

        let mut join_set = JoinSet::new();
        for term in repository_names {
            join_set.spawn(Self::search_term(
                self.client.clone(),
                instance.clone(),
                term.clone(),
            ));
        }

        let mut found = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(entries) => found.extend(entries),
                Err(e) => error!("Join error: {}", e),
            }
        }

        let unique = dedup_by_repository(found);
        info!(
            terms = repository_names.len(),
            "Search matched {} unique repositories",
            unique.len()
        );
        Ok(unique)
    }
}

/// Cache-backed aggregations keyed by team name
pub struct TeamAggregationService<C: CacheService> {
    resolver: Arc<InstanceResolver>,
    artifact_service: Arc<dyn ArtifactService>,
    search_service: Arc<dyn SearchService>,
    cache_service: Arc<C>,
    search_ttl: Duration,
    team_artifacts_ttl: Duration,
}

impl<C: CacheService> TeamAggregationService<C> {
    pub fn new(
        resolver: Arc<InstanceResolver>,
        artifact_service: Arc<dyn ArtifactService>,
        search_service: Arc<dyn SearchService>,
        cache_service: Arc<C>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            resolver,
            artifact_service,
            search_service,
            cache_service,
            search_ttl: Duration::from_secs(config.search_ttl_seconds),
            team_artifacts_ttl: Duration::from_secs(config.team_artifacts_ttl_seconds),
        }
    }

    pub fn team_artifacts_cache_key(team: &str) -> String {
        format!("{}Artifacts", team)
    }

    /// Search, served from the team's cache entry when a team is given
    pub async fn search(
        &self,
        host: &str,
        team: Option<&str>,
        repository_names: &[String],
    ) -> Result<Vec<RepoInformation>, ApplicationError> {
        let Some(team) = team.filter(|team| !team.is_empty()) else {
            return self.search_service.search(host, repository_names).await;
        };

        if let Some(cached) = self
            .cache_service
            .get::<Vec<RepoInformation>>(team)
            .await?
            .filter(|cached| !cached.is_empty())
        {
            debug!(team = %team, "Cache hit for team search");
            return Ok(cached);
        }

        debug!(team = %team, "Cache miss for team search, querying Harbor");
        let found = self.search_service.search(host, repository_names).await?;

        if let Err(e) = self.cache_service.set(team, &found, self.search_ttl).await {
            warn!(team = %team, "Failed to cache search results: {}", e);
        }

        Ok(found)
    }

    /// Latest artifact of every repository the team owns, cached per team
    pub async fn team_artifacts(
        &self,
        host: &str,
        team: &str,
        repositories: &[RepoInformation],
    ) -> Result<Vec<TeamArtifact>, ApplicationError> {
        if team.is_empty() {
            return Err(DomainError::InvalidInput {
                field: "team".to_string(),
                message: "must not be empty".to_string(),
            }
            .into());
        }

        let cache_key = Self::team_artifacts_cache_key(team);
        if let Some(cached) = self
            .cache_service
            .get::<Vec<TeamArtifact>>(&cache_key)
            .await?
            .filter(|cached| !cached.is_empty())
        {
            debug!(team = %team, "Cache hit for team artifacts");
            return Ok(cached);
        }

        debug!(team = %team, "Cache miss for team artifacts, querying Harbor");
        let report = self.latest_artifacts(host, repositories).await?;

        for failure in &report.errors {
            warn!(
                team = %team,
                project = %failure.project,
                repository = %failure.repository,
                "Repository left out of team artifacts: {}",
                failure.error_msg
            );
        }

        if let Err(e) = self
            .cache_service
            .set(&cache_key, &report.artifacts, self.team_artifacts_ttl)
            .await
        {
            warn!(team = %team, "Failed to cache team artifacts: {}", e);
        }

        Ok(report.artifacts)
    }

    /// Fetch every repository concurrently and keep each one's most recent push
    pub async fn latest_artifacts(
        &self,
        host: &str,
        repositories: &[RepoInformation],
    ) -> Result<TeamArtifactsReport, ApplicationError> {
        let instance = self.resolver.resolve(host)?;

        let mut join_set = JoinSet::new();
        for repo in repositories {
            let artifact_service = self.artifact_service.clone();
            let instance = instance.clone();
            let repo = repo.clone();
            join_set.spawn(async move {
                let result = artifact_service
                    .fetch_for_instance(&instance, &repo.project, &repo.repository)
                    .await;
                (repo, result)
            });
        }

        let mut report = TeamArtifactsReport::default();
        while let Some(joined) = join_set.join_next().await {
            let (repo, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Join error: {}", e);
                    continue;
                }
            };

            match result.map(latest_by_push_time) {
                Ok(Some(latest)) => report.artifacts.push(TeamArtifact::new(latest, &repo)),
                Ok(None) => report
                    .errors
                    .push(RepositoryFailure::new(&repo, "No artifacts found")),
                Err(e) => report
                    .errors
                    .push(RepositoryFailure::new(&repo, e.to_string())),
            }
        }

        info!(
            repositories = repositories.len(),
            failures = report.errors.len(),
            "Collected {} latest artifacts",
            report.artifacts.len()
        );
        Ok(report)
    }
}
