//! Harborview - artifact and vulnerability aggregation over Harbor registries
//!
//! This crate follows a Domain-Driven Design (DDD) layout: registry-independent
//! rules in `domain`, orchestration in `application`, Harbor/cache adapters in
//! `infrastructure` and the HTTP surface in `presentation`.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use config::Config;
pub use logging::init_tracing;

use std::sync::Arc;

use application::{
    ApplicationError, ArtifactServiceImpl, SearchServiceImpl, TeamAggregationService,
};
use domain::InstanceResolver;
use infrastructure::{HarborClient, cache::CacheServiceWrapper};
use presentation::AppState;

/// Wire the services for `config` on top of an already created cache backend
pub fn build_app_state(
    config: &Config,
    cache_service: CacheServiceWrapper,
) -> Result<AppState, ApplicationError> {
    let instances = config.harbor.registry_instances();
    if instances.is_empty() {
        tracing::warn!("No Harbor instances configured; every registry request will fail");
    }
    let resolver = Arc::new(InstanceResolver::new(instances));

    let harbor_client = Arc::new(HarborClient::from_config(&config.harbor)?);
    let artifact_service = Arc::new(ArtifactServiceImpl::new(
        resolver.clone(),
        harbor_client.clone(),
    ));
    let search_service = Arc::new(SearchServiceImpl::new(resolver.clone(), harbor_client));

    let cache_service = Arc::new(cache_service);
    let aggregation_service = Arc::new(TeamAggregationService::new(
        resolver.clone(),
        artifact_service.clone(),
        search_service,
        cache_service.clone(),
        &config.cache,
    ));

    Ok(AppState {
        resolver,
        artifact_service,
        aggregation_service,
        cache_service,
    })
}

/// Build the full router for `config`, creating the cache backend it names
pub async fn create_app(config: Config) -> Result<axum::Router, ApplicationError> {
    let cache_service = infrastructure::cache::CacheFactory::create_with_fallback(
        &config.cache,
        &config.redis_or_default(),
    )
    .await;
    let app_state = build_app_state(&config, cache_service)?;
    Ok(presentation::create_router(app_state, &config))
}
