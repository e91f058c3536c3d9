//! Redis-backed cache with a pooled connection

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::current_timestamp;
use crate::{
    application::{ApplicationError, CacheError, CacheService},
    config::RedisConfig,
};

/// Stored value with creation and expiry metadata; `expires_at` is `None` for entries without TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheEntry<T> {
    pub data: T,
    pub created_at: u64,
    pub expires_at: Option<u64>,
}

impl<T> RedisCacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| current_timestamp() > expires_at)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RedisCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}

/// Cache repository storing JSON documents in Redis
pub struct RedisCacheRepository {
    pool: Pool,
    key_prefix: String,
    max_key_length: usize,
    stats: Arc<Mutex<RedisCacheStats>>,
}

impl RedisCacheRepository {
    /// Create the pool and check the server answers PING
    pub async fn new(config: &RedisConfig) -> Result<Self, ApplicationError> {
        let url = config.connection_url();
        let pool = PoolConfig::from_url(url.as_str())
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| {
                error!("Failed to create Redis connection pool: {}", e);
                CacheError::Connection {
                    message: format!("Redis pool creation failed: {}", e),
                }
            })?;

        let repository = Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            max_key_length: config.max_key_length,
            stats: Arc::new(Mutex::new(RedisCacheStats::default())),
        };

        repository.ping().await?;
        info!(host = %config.host, port = config.port, "Redis cache repository initialized");

        Ok(repository)
    }

    fn cache_key(&self, key: &str) -> Result<String, ApplicationError> {
        let full_key = format!("{}{}", self.key_prefix, key);

        if full_key.len() > self.max_key_length {
            return Err(CacheError::Operation {
                message: format!(
                    "Cache key too long: {} > {}",
                    full_key.len(),
                    self.max_key_length
                ),
            }
            .into());
        }

        Ok(full_key)
    }

    async fn connection(&self) -> Result<Connection, ApplicationError> {
        match self.pool.get().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.update_stats(|stats| stats.errors += 1).await;
                Err(CacheError::RedisPool(e).into())
            }
        }
    }

    async fn update_stats<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut RedisCacheStats),
    {
        let mut stats = self.stats.lock().await;
        update_fn(&mut stats);
    }

    pub async fn get_stats(&self) -> RedisCacheStats {
        self.stats.lock().await.clone()
    }

    /// Round-trip a PING to the server
    pub async fn ping(&self) -> Result<(), ApplicationError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis ping failed: {}", e);
                CacheError::Redis(e)
            })?;
        Ok(())
    }

    /// Store a value; a zero TTL stores it without expiry
    pub async fn set_with_ttl<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), ApplicationError>
    where
        T: Serialize + Send + Sync,
    {
        let cache_key = self.cache_key(key)?;
        let now = current_timestamp();
        let entry = RedisCacheEntry {
            data: value,
            created_at: now,
            expires_at: (!ttl.is_zero()).then(|| now + ttl.as_secs()),
        };
        let payload = serde_json::to_string(&entry).map_err(CacheError::Json)?;

        let mut conn = self.connection().await?;
        let result: Result<(), redis::RedisError> = if ttl.is_zero() {
            conn.set(&cache_key, payload).await
        } else {
            conn.set_ex(&cache_key, payload, ttl.as_secs()).await
        };

        if let Err(e) = result {
            error!("Redis SET command failed: {}", e);
            self.update_stats(|stats| stats.errors += 1).await;
            return Err(CacheError::Redis(e).into());
        }

        self.update_stats(|stats| stats.sets += 1).await;
        debug!(key = %cache_key, ttl_seconds = ttl.as_secs(), "Cached entry");
        Ok(())
    }

    pub async fn get_entry<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: DeserializeOwned + Send,
    {
        let cache_key = self.cache_key(key)?;
        let mut conn = self.connection().await?;

        let payload: Option<String> = conn.get(&cache_key).await.map_err(|e| {
            error!("Redis GET command failed: {}", e);
            CacheError::Redis(e)
        })?;

        let Some(payload) = payload else {
            self.update_stats(|stats| stats.misses += 1).await;
            debug!(key = %cache_key, "Cache miss");
            return Ok(None);
        };

        let entry: RedisCacheEntry<T> = match serde_json::from_str(&payload) {
            Ok(entry) => entry,
            Err(e) => {
                error!(key = %cache_key, "Failed to deserialize cache entry: {}", e);
                self.update_stats(|stats| stats.errors += 1).await;
                return Err(CacheError::Json(e).into());
            }
        };

        if entry.is_expired() {
            let deleted: Result<(), redis::RedisError> = conn.del(&cache_key).await;
            if let Err(e) = deleted {
                warn!("Failed to delete expired cache entry: {}", e);
            }
            self.update_stats(|stats| stats.misses += 1).await;
            debug!(key = %cache_key, "Cache entry expired");
            return Ok(None);
        }

        self.update_stats(|stats| stats.hits += 1).await;
        debug!(key = %cache_key, "Cache hit");
        Ok(Some(entry.data))
    }

    /// Remove an entry; returns whether one existed
    pub async fn delete(&self, key: &str) -> Result<bool, ApplicationError> {
        let cache_key = self.cache_key(key)?;
        let mut conn = self.connection().await?;

        let deleted: u32 = conn.del(&cache_key).await.map_err(|e| {
            error!("Redis DEL command failed: {}", e);
            CacheError::Redis(e)
        })?;

        if deleted > 0 {
            self.update_stats(|stats| stats.deletes += 1).await;
        }
        Ok(deleted > 0)
    }

    /// Close the pool; later operations fail with a pool error
    pub fn close(&self) {
        self.pool.close();
        info!("Redis connection pool closed");
    }
}

#[async_trait]
impl CacheService for RedisCacheRepository {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_entry(key).await
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: Serialize + Send + Sync,
    {
        self.set_with_ttl(key, value, ttl).await
    }

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError> {
        self.delete(key).await?;
        Ok(())
    }
}
