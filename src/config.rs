//! Configuration management

use serde::{Deserialize, Serialize};

use crate::domain::RegistryInstance;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub harbor: HarborConfig,
    /// Cache backend address; a local redis is assumed when absent
    pub redis: Option<RedisConfig>,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI)
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only). Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
}

/// Harbor registry configuration.
///
/// The top-level `base_url`/`username`/`password` triple is the legacy single
/// instance and maps to the default host `""`; `instances` adds named ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarborConfig {
    // config lowercases keys coming from some sources, hence the second alias
    #[serde(alias = "baseUrl", alias = "baseurl")]
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub instances: Vec<HarborInstanceConfig>,
    /// Per upstream call
    pub timeout_seconds: u64,
    pub page_size: u32,
}

/// A named Harbor instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarborInstanceConfig {
    pub host: String,
    #[serde(alias = "baseUrl", alias = "baseurl")]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Redis connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Full connection URL; takes precedence over host/port
    pub url: Option<String>,
    pub key_prefix: String,
    pub max_key_length: usize,
}

/// Cache backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Redis, falling back to memory when unreachable at startup
    Redis,
    /// In-process only
    Memory,
}

/// Cache configuration. A TTL of 0 disables expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub strategy: CacheStrategy,
    pub search_ttl_seconds: u64,
    pub team_artifacts_ttl_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_docs: true,
            request_timeout_seconds: 60,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for HarborConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            instances: Vec::new(),
            timeout_seconds: 30,
            page_size: 10,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            url: None,
            key_prefix: "harborview:".to_string(),
            max_key_length: 512,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: CacheStrategy::Redis,
            search_ttl_seconds: 3600,
            team_artifacts_ttl_seconds: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl HarborConfig {
    /// All configured instances: the legacy one first (host `""`), then the
    /// named ones in configuration order. Nothing configured yields an empty list.
    pub fn registry_instances(&self) -> Vec<RegistryInstance> {
        let legacy = self.base_url.as_ref().map(|base_url| {
            RegistryInstance::new(
                "",
                base_url.clone(),
                self.username.clone().unwrap_or_default(),
                self.password.clone().unwrap_or_default(),
            )
        });

        legacy
            .into_iter()
            .chain(self.instances.iter().map(|instance| {
                RegistryInstance::new(
                    instance.host.clone(),
                    instance.base_url.clone(),
                    instance.username.clone(),
                    instance.password.clone(),
                )
            }))
            .collect()
    }
}

impl RedisConfig {
    /// Connection URL for the pool
    pub fn connection_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("redis://{}:{}", self.host, self.port))
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Override with environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder
            .add_source(config::Environment::with_prefix("HARBORVIEW").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Redis settings, defaulting to a local server
    pub fn redis_or_default(&self) -> RedisConfig {
        self.redis.clone().unwrap_or_default()
    }
}
