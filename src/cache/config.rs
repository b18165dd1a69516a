//! Cache configuration.

use std::time::Duration;

pub(crate) const DEFAULT_LISTING_TTL_SECS: u64 = 3600;
pub(crate) const DEFAULT_DETAIL_TTL_SECS: u64 = 3600;
pub(crate) const DEFAULT_REDIS_POOL_SIZE: u32 = 16;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Disabling the cache turns every read into a store computation and
    /// every invalidation into a no-op.
    pub enabled: bool,
    /// Redis connection URL. When absent, the in-process backend is used.
    pub url: Option<String>,
    /// Time-to-live for cached listing pages.
    pub listing_ttl: Duration,
    /// Time-to-live for cached sale detail entries.
    pub detail_ttl: Duration,
    /// Redis connection pool size.
    pub pool_size: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            listing_ttl: Duration::from_secs(DEFAULT_LISTING_TTL_SECS),
            detail_ttl: Duration::from_secs(DEFAULT_DETAIL_TTL_SECS),
            pool_size: DEFAULT_REDIS_POOL_SIZE,
        }
    }
}
