//! # Redis Cache Implementation
//!
//! Stores the eligible-set snapshot as one JSON value under a fixed key,
//! through an auto-reconnecting async connection manager.

use crate::bidding::cache::{AdCache, CacheError, decode_snapshot, encode_snapshot};
use crate::bidding::EligibleSet;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tracing::info;

/// A handler for the Redis-backed snapshot cache.
#[derive(Clone)]
pub struct RedisAdCache {
    /// Shared multiplexed connection; clones are cheap.
    manager: ConnectionManager,
    /// The fixed logical key of the snapshot.
    key: String,
    /// Expiry applied on every write, if any.
    ttl_secs: Option<u64>,
}

impl RedisAdCache {
    /// Opens the connection and returns the cache handle.
    ///
    /// # Arguments
    /// * `url` - The redis URL (e.g., "redis://127.0.0.1/").
    /// * `key` - Key the snapshot lives under.
    /// * `ttl_secs` - Optional expiry for each written snapshot.
    pub async fn connect(
        url: &str,
        key: impl Into<String>,
        ttl_secs: Option<u64>,
    ) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(unavailable)?;
        let manager = ConnectionManager::new(client).await.map_err(unavailable)?;
        info!("Redis connected");
        Ok(Self {
            manager,
            key: key.into(),
            ttl_secs: ttl_secs.filter(|ttl| *ttl > 0),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl AdCache for RedisAdCache {
    async fn get(&self) -> Result<Option<EligibleSet>, CacheError> {
        let mut conn = self.manager.clone();
        let bytes: Option<Vec<u8>> = conn.get(&self.key).await.map_err(unavailable)?;
        match bytes {
            None => Ok(None),
            Some(bytes) => {
                let records = decode_snapshot(&bytes)?;
                Ok((!records.is_empty()).then_some(records))
            }
        }
    }

    async fn set(&self, records: &EligibleSet) -> Result<(), CacheError> {
        if records.is_empty() {
            return Ok(());
        }
        let bytes = encode_snapshot(records)?;
        let mut conn = self.manager.clone();
        match self.ttl_secs {
            Some(ttl) => {
                let _: () = conn.set_ex(&self.key, bytes, ttl).await.map_err(unavailable)?;
            }
            None => {
                let _: () = conn.set(&self.key, bytes).await.map_err(unavailable)?;
            }
        }
        info!(key = %self.key, records = records.len(), "Ads are set to Redis");
        Ok(())
    }

    async fn invalidate(&self) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.del(&self.key).await.map_err(unavailable)?;
        info!(key = %self.key, removed, "Delete all ads in Redis");
        Ok(())
    }
}

fn unavailable(e: RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}
