//! Route definitions and server setup

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::Config;
use crate::domain::{Artifact, RepoInformation, TeamArtifact, VulnerabilitySummary};
use crate::presentation::{
    controllers::{
        artifacts::{AppState, get_artifacts, post_search, post_team_artifacts},
        health::{health_check, readiness_probe},
    },
    middleware::logging_middleware,
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::artifacts::get_artifacts,
        crate::presentation::controllers::artifacts::post_team_artifacts,
        crate::presentation::controllers::artifacts::post_search,
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::health::readiness_probe
    ),
    components(
        schemas(
            Artifact,
            TeamArtifact,
            VulnerabilitySummary,
            RepoInformation,
            SearchItem,
            ErrorResponse,
            HealthResponse,
            ReadinessResponse
        )
    ),
    tags(
        (name = "artifacts", description = "Artifact listings with normalized vulnerability counts"),
        (name = "search", description = "Repository lookup across Harbor projects"),
        (name = "health", description = "Liveness and readiness probes")
    ),
    info(
        title = "Harborview API",
        version = "1.0.0",
        description = "Aggregates artifacts and vulnerability scan results from one or more Harbor registries."
    )
)]
pub struct ApiDoc;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Create the application router with the middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/artifacts", get(get_artifacts))
        .route("/teamartifacts", post(post_team_artifacts))
        .route("/search", post(post_search));

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_probe));

    let mut router = Router::new().merge(api_routes).merge(health_routes);

    if config.server.enable_docs {
        router = router
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            ServiceBuilder::new()
                // HTTP tracing
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.allowed_origins))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                )))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(app_state)
}
