//! Read cache for listing and detail views.
//!
//! The cache is a non-authoritative accelerator in front of Postgres:
//! read misses populate it with a TTL, writes blanket-invalidate the
//! affected listing namespace, and any backend failure degrades to the
//! persistent store instead of failing the request.
//!
//! Two backends sit behind [`CacheBackend`]: Redis (pooled, shared across
//! processes) and an in-process map for cache-less deployments and tests.

mod backend;
mod config;
mod keys;
mod redis;
mod store;

pub use backend::{CacheBackend, CacheError, MemoryBackend};
pub use config::CacheConfig;
pub use keys::{CacheKey, ListingKind, key_matches};
pub use redis::RedisBackend;
pub use store::{CacheHealth, CacheStore};
