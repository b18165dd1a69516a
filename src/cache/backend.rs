//! Cache backend abstraction and the in-process implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::keys::key_matches;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Key-value store with TTL support and pattern-based bulk deletion.
///
/// Values are serialized JSON; the typed layer above owns encoding and TTL
/// policy, backends own storage and expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key matching a `*` glob pattern, returning the number
    /// of entries removed.
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn health_check(&self) -> Result<(), CacheError>;
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process backend: a sharded map with per-entry deadlines.
///
/// Expired entries are dropped lazily on access and swept during pattern
/// deletion; there is no eviction beyond TTL.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<DashMap<String, MemoryEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Drop the read guard before removing the stale entry.
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut removed = 0u64;
        self.entries.retain(|key, entry| {
            if entry.is_expired() {
                return false;
            }
            if key_matches(key, pattern) {
                removed += 1;
                return false;
            }
            true
        });
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
