//! Caching implementations

pub mod cache_factory;
pub mod cache_service_wrapper;
pub mod memory_cache;
pub mod redis_cache;

pub use cache_factory::CacheFactory;
pub use cache_service_wrapper::{CacheServiceWrapper, CacheStats};
pub use memory_cache::MemoryCacheRepository;
pub use redis_cache::RedisCacheRepository;

/// Seconds since the Unix epoch
pub(crate) fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
