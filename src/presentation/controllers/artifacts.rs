//! Registry controller for artifact listing and repository search

use axum::{
    extract::{Query, State},
    response::Json,
};
use std::sync::Arc;

use crate::application::{ArtifactService, TeamAggregationService, errors::ApplicationError};
use crate::domain::{Artifact, DomainError, InstanceResolver, RepoInformation, TeamArtifact};
use crate::infrastructure::cache::CacheServiceWrapper;
use crate::presentation::models::{
    ArtifactsQuery, ErrorResponse, SearchItem, SearchQuery, TeamArtifactsQuery,
};

/// Application state for dependency injection
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<InstanceResolver>,
    pub artifact_service: Arc<dyn ArtifactService>,
    pub aggregation_service: Arc<TeamAggregationService<CacheServiceWrapper>>,
    pub cache_service: Arc<CacheServiceWrapper>,
}

/// Repository names arrive encoded once more than the query string layer strips
fn decode_repository(repository: &str) -> Result<String, ApplicationError> {
    urlencoding::decode(repository)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            DomainError::InvalidInput {
                field: "repository".to_string(),
                message: format!("not valid percent-encoded UTF-8: {}", e),
            }
            .into()
        })
}

/// List the newest artifacts of a repository
#[utoipa::path(
    get,
    path = "/artifacts",
    tag = "artifacts",
    params(ArtifactsQuery),
    responses(
        (status = 200, description = "Artifacts of the repository", body = [Artifact]),
        (status = 404, description = "No Harbor instance for the host", body = ErrorResponse),
        (status = 502, description = "Harbor reported an error", body = ErrorResponse),
        (status = 504, description = "Harbor did not answer in time", body = ErrorResponse)
    )
)]
pub async fn get_artifacts(
    State(app_state): State<AppState>,
    Query(query): Query<ArtifactsQuery>,
) -> Result<Json<Vec<Artifact>>, ApplicationError> {
    let repository = decode_repository(&query.repository)?;
    tracing::debug!(
        host = %query.host,
        project = %query.project,
        repository = %repository,
        "Listing artifacts"
    );

    let artifacts = app_state
        .artifact_service
        .fetch_artifacts(&query.host, &query.project, &repository)
        .await?;

    Ok(Json(artifacts))
}

/// Latest artifact of each of a team's repositories
#[utoipa::path(
    post,
    path = "/teamartifacts",
    tag = "artifacts",
    params(TeamArtifactsQuery),
    request_body = [RepoInformation],
    responses(
        (status = 200, description = "Latest artifact per repository", body = [TeamArtifact]),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "No Harbor instance for the host", body = ErrorResponse)
    )
)]
pub async fn post_team_artifacts(
    State(app_state): State<AppState>,
    Query(query): Query<TeamArtifactsQuery>,
    Json(repositories): Json<Vec<RepoInformation>>,
) -> Result<Json<Vec<TeamArtifact>>, ApplicationError> {
    tracing::info!(
        team = %query.team,
        component_type = query.component_type.as_deref().unwrap_or(""),
        repositories = repositories.len(),
        "Collecting team artifacts"
    );

    let artifacts = app_state
        .aggregation_service
        .team_artifacts(&query.host, &query.team, &repositories)
        .await?;

    Ok(Json(artifacts))
}

/// Find the projects holding the given repository names
#[utoipa::path(
    post,
    path = "/search",
    tag = "search",
    params(SearchQuery),
    request_body = [SearchItem],
    responses(
        (status = 200, description = "Matching repositories, deduplicated by name", body = [RepoInformation]),
        (status = 404, description = "No Harbor instance for the host", body = ErrorResponse)
    )
)]
pub async fn post_search(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Json(items): Json<Vec<SearchItem>>,
) -> Result<Json<Vec<RepoInformation>>, ApplicationError> {
    let names: Vec<String> = items.into_iter().map(|item| item.repository).collect();
    tracing::info!(
        team = query.team.as_deref().unwrap_or(""),
        terms = names.len(),
        "Searching repositories"
    );

    let found = app_state
        .aggregation_service
        .search(&query.host, query.team.as_deref(), &names)
        .await?;

    Ok(Json(found))
}
