//! Harborview - Main application entry point

use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};

use harborview::{
    Config, build_app_state, infrastructure::cache::CacheFactory, init_tracing,
    presentation::create_router,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        Config::default()
    });

    init_tracing(&config.logging)?;

    tracing::info!("Starting Harborview server...");
    tracing::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    let cache_service =
        CacheFactory::create_with_fallback(&config.cache, &config.redis_or_default()).await;
    tracing::info!(backend = cache_service.backend(), "Cache service ready");

    let app_state = build_app_state(&config, cache_service.clone())?;
    tracing::info!(
        instances = app_state.resolver.len(),
        "Harbor instances configured"
    );

    let app = create_router(app_state, &config);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!("Server listening on {}", addr);
    if config.server.enable_docs {
        tracing::info!("API documentation available at http://{}/docs", addr);
    }

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_service.shutdown();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
