//! Logging and tracing configuration

use crate::config::LoggingConfig;
use tracing_subscriber::{
    EnvFilter, filter::ParseError, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// HTTP plumbing that floods debug output with per-connection noise
const QUIET_TARGETS: &[&str] = &["hyper_util=warn", "h2=warn", "rustls=warn", "tower_http=info"];

/// Filter for the configured level. An explicit `RUST_LOG` replaces it entirely;
/// otherwise the HTTP plumbing targets are capped.
fn build_filter(level: &str, env_override: Option<&str>) -> Result<EnvFilter, ParseError> {
    if let Some(directives) = env_override.filter(|directives| !directives.trim().is_empty()) {
        return EnvFilter::try_new(directives);
    }

    let directives = std::iter::once(level)
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives)
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_override = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(&config.level, env_override.as_deref())?;

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).json())
                .try_init()?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .try_init()?;
        }
    }

    Ok(())
}
