//! In-process cache used when Redis is not wanted or not reachable

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{ApplicationError, CacheError, CacheService};

struct MemoryEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub expired_entries: u64,
    pub total_entries: u64,
}

/// Cache repository keeping JSON values in a process-local map
#[derive(Default)]
pub struct MemoryCacheRepository {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    stats: Arc<Mutex<MemoryCacheStats>>,
}

impl MemoryCacheRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_stats(&self) -> MemoryCacheStats {
        let mut stats = self.stats.lock().await.clone();
        stats.total_entries = self.entries.lock().await.len() as u64;
        stats
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheService for MemoryCacheRepository {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: DeserializeOwned + Send,
    {
        let now = Instant::now();
        let value = {
            let mut entries = self.entries.lock().await;
            match entries.get(key) {
                Some(entry) if entry.is_expired(now) => {
                    entries.remove(key);
                    self.stats.lock().await.expired_entries += 1;
                    None
                }
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };

        let Some(value) = value else {
            self.stats.lock().await.misses += 1;
            debug!(key = %key, "Cache miss");
            return Ok(None);
        };

        let data = serde_json::from_value(value).map_err(CacheError::Json)?;
        self.stats.lock().await.hits += 1;
        debug!(key = %key, "Cache hit");
        Ok(Some(data))
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: Serialize + Send + Sync,
    {
        let value = serde_json::to_value(value).map_err(CacheError::Json)?;
        let now = Instant::now();
        let expires_at = (!ttl.is_zero()).then(|| now + ttl);

        // every write drops all expired keys, not only this one
        let removed = {
            let mut entries = self.entries.lock().await;
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            let removed = (before - entries.len()) as u64;
            entries.insert(key.to_string(), MemoryEntry { value, expires_at });
            removed
        };

        let mut stats = self.stats.lock().await;
        stats.sets += 1;
        stats.expired_entries += removed;
        drop(stats);

        debug!(
            key = %key,
            ttl_seconds = ttl.as_secs(),
            purged = removed,
            "Cached entry"
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
