//! Typed cache facade used by the application services.
//!
//! Owns JSON encoding, TTL selection per key kind, and the degradation
//! contract: a failing backend is logged and metered, never surfaced to
//! the business operation. Reads fall back to a miss; invalidation
//! failures leave stale entries to age out through their TTL.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::backend::CacheBackend;
use super::config::CacheConfig;
use super::keys::{CacheKey, ListingKind};

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHealth {
    Ok,
    Degraded,
    Disabled,
}

#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        let backend = config.enabled.then_some(backend);
        Self { backend, config }
    }

    /// A store that treats every read as a miss and every write as a no-op.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            config: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Fetch and decode a cached entry. Backend failures and decode
    /// failures both read as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let rendered = key.render();

        let raw = match backend.get(&rendered).await {
            Ok(raw) => raw,
            Err(err) => {
                counter!("mercato_cache_error_total", "op" => "get").increment(1);
                warn!(target: SOURCE, key = %rendered, error = %err, "cache read failed, falling back to store");
                return None;
            }
        };

        let Some(raw) = raw else {
            counter!("mercato_cache_miss_total").increment(1);
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!("mercato_cache_hit_total").increment(1);
                Some(value)
            }
            Err(err) => {
                // A payload written by an incompatible build; drop it so the
                // next read repopulates.
                counter!("mercato_cache_error_total", "op" => "decode").increment(1);
                warn!(target: SOURCE, key = %rendered, error = %err, "discarding undecodable cache entry");
                let _ = backend.delete(&rendered).await;
                None
            }
        }
    }

    /// Encode and store an entry under the TTL for its key kind.
    pub async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let rendered = key.render();

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(target: SOURCE, key = %rendered, error = %err, "failed to encode cache entry");
                return;
            }
        };

        let ttl = match key {
            CacheKey::Listing { .. } => self.config.listing_ttl,
            CacheKey::SaleDetail { .. } => self.config.detail_ttl,
        };

        if let Err(err) = backend.set(&rendered, raw, ttl).await {
            counter!("mercato_cache_error_total", "op" => "set").increment(1);
            warn!(target: SOURCE, key = %rendered, error = %err, "cache write failed");
        }
    }

    /// Blanket-invalidate every cached page of a listing namespace.
    ///
    /// Callers await this before responding so a follow-up read cannot
    /// observe a page computed from pre-write state. Failure is logged and
    /// absorbed: stale entries then age out through their TTL.
    pub async fn invalidate_listing(&self, kind: ListingKind) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let pattern = kind.pattern();

        match backend.delete_matching(&pattern).await {
            Ok(removed) => {
                counter!("mercato_cache_invalidated_total").increment(removed);
                debug!(target: SOURCE, pattern = %pattern, removed, "listing cache invalidated");
            }
            Err(err) => {
                counter!("mercato_cache_error_total", "op" => "invalidate").increment(1);
                warn!(
                    target: SOURCE,
                    pattern = %pattern,
                    error = %err,
                    "listing cache invalidation failed; entries will expire via TTL"
                );
            }
        }
    }

    pub async fn health(&self) -> CacheHealth {
        match self.backend.as_ref() {
            None => CacheHealth::Disabled,
            Some(backend) => match backend.health_check().await {
                Ok(()) => CacheHealth::Ok,
                Err(_) => CacheHealth::Degraded,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::cache::backend::{CacheError, MemoryBackend};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        id: i64,
        label: String,
    }

    fn store_with_memory() -> (CacheStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = CacheStore::new(backend.clone(), CacheConfig::default());
        (store, backend)
    }

    #[tokio::test]
    async fn json_roundtrip() {
        let (store, _) = store_with_memory();
        let key = CacheKey::sale_detail(9);
        let value = Snapshot {
            id: 9,
            label: "cached".to_string(),
        };

        assert_eq!(store.get_json::<Snapshot>(&key).await, None);
        store.put_json(&key, &value).await;
        assert_eq!(store.get_json::<Snapshot>(&key).await, Some(value));
    }

    #[tokio::test]
    async fn invalidation_is_scoped_to_the_listing_namespace() {
        let (store, _) = store_with_memory();
        let page = CacheKey::sales_page(1, 10);
        let detail = CacheKey::sale_detail(3);
        let customers = CacheKey::listing(ListingKind::Customers, 1, 10);
        let value = Snapshot {
            id: 1,
            label: "x".to_string(),
        };

        store.put_json(&page, &value).await;
        store.put_json(&detail, &value).await;
        store.put_json(&customers, &value).await;

        store.invalidate_listing(ListingKind::Sales).await;

        assert_eq!(store.get_json::<Snapshot>(&page).await, None);
        assert!(store.get_json::<Snapshot>(&detail).await.is_some());
        assert!(store.get_json::<Snapshot>(&customers).await.is_some());
    }

    #[tokio::test]
    async fn undecodable_entries_are_dropped() {
        let (store, backend) = store_with_memory();
        let key = CacheKey::sale_detail(4);
        backend
            .set(&key.render(), "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get_json::<Snapshot>(&key).await, None);
        assert!(backend.is_empty(), "bad entry should be evicted");
    }

    #[tokio::test]
    async fn disabled_store_is_inert() {
        let store = CacheStore::disabled();
        let key = CacheKey::sales_page(1, 10);
        let value = Snapshot {
            id: 1,
            label: "x".to_string(),
        };

        store.put_json(&key, &value).await;
        assert_eq!(store.get_json::<Snapshot>(&key).await, None);
        assert_eq!(store.health().await, CacheHealth::Disabled);
    }

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn set(
            &self,
            _key: &str,
            _value: String,
            _ttl: Duration,
        ) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
            Err(CacheError::backend("connection refused"))
        }

        async fn health_check(&self) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }
    }

    #[tokio::test]
    async fn backend_failures_degrade_to_misses() {
        let store = CacheStore::new(Arc::new(FailingBackend), CacheConfig::default());
        let key = CacheKey::sales_page(1, 10);
        let value = Snapshot {
            id: 1,
            label: "x".to_string(),
        };

        assert_eq!(store.get_json::<Snapshot>(&key).await, None);
        store.put_json(&key, &value).await;
        store.invalidate_listing(ListingKind::Sales).await;
        assert_eq!(store.health().await, CacheHealth::Degraded);
    }
}
