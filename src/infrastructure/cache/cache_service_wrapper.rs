//! Cache service wrapper to dispatch over the configured backend

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};

use crate::{
    application::{ApplicationError, CacheService},
    infrastructure::cache::{
        memory_cache::{MemoryCacheRepository, MemoryCacheStats},
        redis_cache::{RedisCacheRepository, RedisCacheStats},
    },
};

/// Wrapper enum for the cache backends
#[derive(Clone)]
pub enum CacheServiceWrapper {
    Redis(Arc<RedisCacheRepository>),
    Memory(Arc<MemoryCacheRepository>),
}

impl CacheServiceWrapper {
    pub fn redis(cache: Arc<RedisCacheRepository>) -> Self {
        Self::Redis(cache)
    }

    pub fn memory(cache: Arc<MemoryCacheRepository>) -> Self {
        Self::Memory(cache)
    }

    /// Fresh in-process cache
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(MemoryCacheRepository::new()))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory(_) => "memory",
        }
    }

    pub async fn get_stats(&self) -> CacheStats {
        match self {
            Self::Redis(cache) => CacheStats::Redis(cache.get_stats().await),
            Self::Memory(cache) => CacheStats::Memory(cache.get_stats().await),
        }
    }

    /// Check the backend is usable; the memory backend always is
    pub async fn ping(&self) -> Result<(), ApplicationError> {
        match self {
            Self::Redis(cache) => cache.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Release backend resources at shutdown
    pub fn shutdown(&self) {
        if let Self::Redis(cache) = self {
            cache.close();
        }
    }
}

#[async_trait]
impl CacheService for CacheServiceWrapper {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Redis(cache) => cache.get(key).await,
            Self::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: Serialize + Send + Sync,
    {
        match self {
            Self::Redis(cache) => cache.set(key, value, ttl).await,
            Self::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError> {
        match self {
            Self::Redis(cache) => cache.invalidate(key).await,
            Self::Memory(cache) => cache.invalidate(key).await,
        }
    }
}

/// Backend-specific cache statistics
#[derive(Debug, Clone)]
pub enum CacheStats {
    Redis(RedisCacheStats),
    Memory(MemoryCacheStats),
}

impl CacheStats {
    pub fn total_hits(&self) -> u64 {
        match self {
            Self::Redis(stats) => stats.hits,
            Self::Memory(stats) => stats.hits,
        }
    }

    pub fn total_misses(&self) -> u64 {
        match self {
            Self::Redis(stats) => stats.misses,
            Self::Memory(stats) => stats.misses,
        }
    }

    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_hits() + self.total_misses();
        if total == 0 {
            0.0
        } else {
            (self.total_hits() as f64 / total as f64) * 100.0
        }
    }
}
