//! # Fast Cache Seam
//!
//! The cache holds one complete `EligibleSet` snapshot under a fixed key.
//! Readers see either no snapshot or a whole one. Every fault here is
//! recoverable: the loader treats it as a miss and goes to the store.

use super::model::EligibleSet;
use async_trait::async_trait;
use thiserror::Error;

/// Faults raised by a cache accessor.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Connectivity or protocol failure talking to the cache.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The stored snapshot could not be encoded or decoded.
    #[error("Snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Snapshot cache for the eligible set.
#[async_trait]
pub trait AdCache: Send + Sync {
    /// Returns the snapshot, or `None` when nothing is cached.
    async fn get(&self) -> Result<Option<EligibleSet>, CacheError>;

    /// Replaces the snapshot. Empty sets are never written.
    async fn set(&self, records: &EligibleSet) -> Result<(), CacheError>;

    /// Drops the snapshot so the next load goes to the store.
    async fn invalidate(&self) -> Result<(), CacheError>;
}

/// Encodes a snapshot for storage under the cache key.
pub fn encode_snapshot(records: &EligibleSet) -> Result<Vec<u8>, CacheError> {
    Ok(serde_json::to_vec(records)?)
}

/// Decodes a stored snapshot.
pub fn decode_snapshot(bytes: &[u8]) -> Result<EligibleSet, CacheError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::model::AdRecord;

    #[test]
    fn test_snapshot_codec_preserves_order() {
        let set = EligibleSet::new(vec![
            AdRecord::new("1", 100),
            AdRecord::new("2", 50),
            AdRecord::new("3", 50),
        ]);
        let bytes = encode_snapshot(&set).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), set);
    }

    #[test]
    fn test_garbage_is_a_codec_error() {
        let err = decode_snapshot(b"\x80\x04not json").unwrap_err();
        assert!(matches!(err, CacheError::Codec(_)));
    }
}
