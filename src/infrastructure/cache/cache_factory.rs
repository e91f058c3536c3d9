//! Cache factory for creating the configured cache backend

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    application::ApplicationError,
    config::{CacheConfig, CacheStrategy, RedisConfig},
    infrastructure::cache::{
        cache_service_wrapper::CacheServiceWrapper, redis_cache::RedisCacheRepository,
    },
};

/// Cache factory for creating cache services based on configuration
pub struct CacheFactory;

impl CacheFactory {
    /// Create the backend named by `config.strategy`
    pub async fn create_cache_service(
        config: &CacheConfig,
        redis: &RedisConfig,
    ) -> Result<CacheServiceWrapper, ApplicationError> {
        match config.strategy {
            CacheStrategy::Redis => {
                info!(url = %redis.connection_url(), "Creating Redis cache service");
                let cache = RedisCacheRepository::new(redis).await?;
                Ok(CacheServiceWrapper::redis(Arc::new(cache)))
            }
            CacheStrategy::Memory => {
                info!("Creating in-memory cache service");
                Ok(CacheServiceWrapper::in_memory())
            }
        }
    }

    /// Create the configured backend, falling back to memory when it is unavailable
    pub async fn create_with_fallback(
        config: &CacheConfig,
        redis: &RedisConfig,
    ) -> CacheServiceWrapper {
        match Self::create_cache_service(config, redis).await {
            Ok(cache) => cache,
            Err(e) => {
                error!("Failed to create configured cache service: {}", e);
                warn!("Falling back to in-memory cache");
                CacheServiceWrapper::in_memory()
            }
        }
    }
}
