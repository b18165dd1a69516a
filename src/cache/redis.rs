//! Redis cache backend.
//!
//! Pattern deletion walks the keyspace with cursor-based `SCAN MATCH`
//! instead of `KEYS`, deleting each page of matches as it goes so a large
//! namespace never has to fit in memory at once.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config as PoolConfig, Pool, PoolConfig as DeadpoolConfig, Runtime};
use tracing::debug;

use super::backend::{CacheBackend, CacheError};

const SCAN_PAGE_SIZE: usize = 200;

#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Build a pooled Redis backend from a connection URL.
    pub fn connect(url: &str, pool_size: u32) -> Result<Self, CacheError> {
        let mut config = PoolConfig::from_url(url);
        config.pool = Some(DeadpoolConfig::new(pool_size as usize));

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| CacheError::backend(format!("failed to create redis pool: {err}")))?;

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| CacheError::backend(format!("failed to get redis connection: {err}")))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|err| CacheError::backend(format!("redis GET `{key}` failed: {err}")))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(|err| CacheError::backend(format!("redis SETEX `{key}` failed: {err}")))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|err| CacheError::backend(format!("redis DEL `{key}` failed: {err}")))
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_PAGE_SIZE)
                .query_async(&mut *conn)
                .await
                .map_err(|err| {
                    CacheError::backend(format!("redis SCAN `{pattern}` failed: {err}"))
                })?;

            if !keys.is_empty() {
                removed += keys.len() as u64;
                conn.del::<_, ()>(keys).await.map_err(|err| {
                    CacheError::backend(format!("redis DEL batch for `{pattern}` failed: {err}"))
                })?;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern, removed, "redis pattern invalidation complete");
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|err| CacheError::backend(format!("redis PING failed: {err}")))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::backend(format!(
                "redis PING returned unexpected response: {pong}"
            )))
        }
    }
}
