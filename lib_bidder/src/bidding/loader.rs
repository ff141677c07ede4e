//! # Record Loader
//!
//! Cache-aside read path for the eligible set:
//!
//! 1. A non-empty cached snapshot is used as-is, however stale.
//! 2. On a miss (or any cache fault) the store is scanned.
//! 3. A non-empty scan result is written back to the cache before it is
//!    returned, regardless of what the caller later does with it.
//! 4. An empty scan is never cached and is reported as `NoEligibleRecords`.
//!
//! Every cache call runs under its own deadline. A cache that stalls is a
//! miss like any other cache fault, so it never eats the request's budget.
//!
//! Concurrent misses may each scan and overwrite the snapshot; the last
//! writer wins.

use super::cache::{AdCache, CacheError};
use super::errors::StoreError;
use super::model::EligibleSet;
use super::store::AdStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why `RecordLoader::load` produced no records.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Neither the cache nor the store holds an eligible record.
    #[error("No eligible records in cache or store")]
    NoEligibleRecords,

    /// The store scan failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Deadline applied to each cache call unless configured otherwise.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Cache-aside loader over an `AdStore` and an `AdCache`.
#[derive(Clone)]
pub struct RecordLoader {
    store: Arc<dyn AdStore>,
    cache: Arc<dyn AdCache>,
    cache_timeout: Duration,
}

impl RecordLoader {
    pub fn new(store: Arc<dyn AdStore>, cache: Arc<dyn AdCache>) -> Self {
        Self {
            store,
            cache,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    /// Overrides the per-call cache deadline.
    pub fn with_cache_timeout(mut self, cache_timeout: Duration) -> Self {
        self.cache_timeout = cache_timeout;
        self
    }

    pub fn cache_timeout(&self) -> Duration {
        self.cache_timeout
    }

    pub fn store(&self) -> &Arc<dyn AdStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<dyn AdCache> {
        &self.cache
    }

    pub async fn load(&self) -> Result<EligibleSet, LoadError> {
        match self.bounded("read", self.cache.get()).await {
            Ok(Some(records)) if !records.is_empty() => {
                debug!(records = records.len(), "Eligible set served from cache");
                return Ok(records);
            }
            Ok(_) => debug!("Cache miss, scanning store"),
            Err(e) => warn!(error = %e, "Cache read failed, falling back to store"),
        }

        let records = self.store.scan_eligible().await?;
        if records.is_empty() {
            debug!("Store scan returned no eligible records");
            return Err(LoadError::NoEligibleRecords);
        }

        match self.bounded("write", self.cache.set(&records)).await {
            Ok(()) => info!(records = records.len(), "Eligible set written to cache"),
            Err(e) => warn!(error = %e, "Cache write failed, serving scan result uncached"),
        }
        Ok(records)
    }

    /// Runs one cache call under the cache deadline. Expiry is reported as
    /// `CacheError::Unavailable`.
    async fn bounded<T>(
        &self,
        op: &str,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.cache_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(CacheError::Unavailable(format!(
                    "cache {op} timed out after {} ms",
                    self.cache_timeout.as_millis()
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::errors::StoreErrorKind;
    use crate::bidding::memory::{MemoryAdCache, MemoryAdStore};
    use crate::bidding::model::AdRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Cache whose every call stalls far past any deadline.
    #[derive(Default)]
    struct StalledCache {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AdCache for StalledCache {
        async fn get(&self) -> Result<Option<EligibleSet>, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn set(&self, _records: &EligibleSet) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn invalidate(&self) -> Result<(), CacheError> {
            Ok(())
        }
    }

    fn fixture(cpms: &[u32]) -> (Arc<MemoryAdStore>, Arc<MemoryAdCache>, RecordLoader) {
        let records = cpms
            .iter()
            .enumerate()
            .map(|(i, cpm)| AdRecord::new(i.to_string(), *cpm))
            .collect();
        let store = Arc::new(MemoryAdStore::with_records(2, records));
        let cache = Arc::new(MemoryAdCache::new());
        let loader = RecordLoader::new(store.clone(), cache.clone());
        (store, cache, loader)
    }

    #[tokio::test]
    async fn test_cold_load_scans_and_fills_cache() {
        let (store, cache, loader) = fixture(&[30, 20, 10]);
        let first = loader.load().await.unwrap();
        assert_eq!(first.cpms(), vec![30, 20, 10]);
        assert_eq!(store.scans(), 1);
        assert_eq!(cache.writes(), 1);

        // Warm: served from cache, store untouched.
        let second = loader.load().await.unwrap();
        assert_eq!(second, first);
        assert_eq!(store.scans(), 1);
    }

    #[tokio::test]
    async fn test_cached_snapshot_is_returned_exactly() {
        let (store, cache, loader) = fixture(&[1]);
        let snapshot = EligibleSet::new(vec![
            AdRecord::new("x", 70),
            AdRecord::new("y", 70),
            AdRecord::new("z", 3),
        ]);
        cache.set(&snapshot).await.unwrap();
        assert_eq!(loader.load().await.unwrap(), snapshot);
        assert_eq!(store.scans(), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_wins_until_invalidated() {
        let (store, cache, loader) = fixture(&[10]);
        loader.load().await.unwrap();
        store.insert(AdRecord::new("new", 99)).unwrap();
        assert_eq!(loader.load().await.unwrap().cpms(), vec![10]);

        cache.invalidate().await.unwrap();
        assert_eq!(loader.load().await.unwrap().cpms(), vec![99, 10]);
        assert_eq!(store.scans(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_is_not_cached() {
        let (store, cache, loader) = fixture(&[]);
        assert!(matches!(loader.load().await, Err(LoadError::NoEligibleRecords)));
        assert!(matches!(loader.load().await, Err(LoadError::NoEligibleRecords)));
        assert_eq!(cache.writes(), 0);
        assert!(!cache.is_populated());
        assert_eq!(store.scans(), 2);
    }

    #[tokio::test]
    async fn test_cache_faults_fall_through_to_store() {
        let (store, cache, loader) = fixture(&[5, 4]);
        cache.set_offline(true);
        assert_eq!(loader.load().await.unwrap().cpms(), vec![5, 4]);
        assert_eq!(loader.load().await.unwrap().cpms(), vec![5, 4]);
        assert_eq!(store.scans(), 2);
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_a_miss_and_gets_replaced() {
        let (store, cache, loader) = fixture(&[8]);
        cache.put_raw(b"\x00\x01".to_vec());
        assert_eq!(loader.load().await.unwrap().cpms(), vec![8]);
        assert_eq!(store.scans(), 1);
        assert_eq!(cache.get().await.unwrap().map(|s| s.cpms()), Some(vec![8]));
    }

    #[tokio::test]
    async fn test_store_faults_propagate() {
        let (store, _cache, loader) = fixture(&[8]);
        store.set_fault(Some(StoreErrorKind::SchemaMissing));
        match loader.load().await {
            Err(LoadError::Store(e)) => assert_eq!(e.kind(), StoreErrorKind::SchemaMissing),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stalled_cache_is_a_miss_and_the_scan_result_is_kept() {
        let store = Arc::new(MemoryAdStore::with_records(2, vec![AdRecord::new("7", 20)]));
        let cache = Arc::new(StalledCache::default());
        let loader = RecordLoader::new(store.clone(), cache.clone())
            .with_cache_timeout(Duration::from_millis(20));

        let started = Instant::now();
        let records = loader.load().await.unwrap();
        assert_eq!(records.cpms(), vec![20]);
        assert_eq!(store.scans(), 1);
        // Both the read and the write-back were attempted and abandoned.
        assert_eq!(cache.calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_default_cache_timeout() {
        let (_, _, loader) = fixture(&[1]);
        assert_eq!(loader.cache_timeout(), DEFAULT_CACHE_TIMEOUT);
    }
}
