//! Shared key/value cache client used by the photofeed services.
//!
//! The cache is an opaque TTL-bearing store: entries may vanish at any time,
//! there is no ordering and no transactions. Callers follow a cache-aside
//! discipline (read, fall back to the relational store on miss, repopulate
//! best-effort) and must tolerate stale entries until they expire.

mod memory;

pub use memory::MemoryCacheStore;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by a cache backend.
///
/// Connectivity and protocol problems are collapsed into `Backend`; callers
/// decide whether a failure is fatal (batched feed reads) or degrades to a
/// miss (identity lookups, write-backs).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Byte-oriented key/value store with TTL and multi-key fetch.
///
/// `get_multi` returns present keys only; absent keys are simply missing
/// from the map. All operations are last-write-wins, no compare-and-swap.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}

/// Redis-backed implementation over a shared `ConnectionManager`.
///
/// The manager multiplexes one connection and reconnects internally, so
/// clones are cheap and the store is used as a process-wide client.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect to the cache at `redis_url` and wrap the connection manager.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!("cache connection manager initialized");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn get_multi(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;

        let mut found = HashMap::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            if let Some(bytes) = value {
                found.insert(key.clone(), bytes);
            }
        }

        Ok(found)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // SET with EX; a zero TTL would be rejected by the server.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await?;
        Ok(())
    }
}
