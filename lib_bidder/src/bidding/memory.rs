//! # In-Memory Store and Cache
//!
//! Process-local implementations of `AdStore` and `AdCache`. The store serves
//! ranked batches exactly like the Postgres cursor does and counts what it
//! hands out; both can be told to fail, which is how the fault paths of the
//! loader and the HTTP boundary are exercised.

use super::cache::{AdCache, CacheError, decode_snapshot, encode_snapshot};
use super::errors::{StoreError, StoreErrorKind};
use super::model::{AdRecord, EligibleSet};
use super::scan::BatchScan;
use super::store::AdStore;
use async_trait::async_trait;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// In-process `AdStore`.
#[derive(Debug)]
pub struct MemoryAdStore {
    records: RwLock<Vec<AdRecord>>,
    batch_size: usize,
    fault: RwLock<Option<StoreErrorKind>>,
    scans: AtomicUsize,
    batches_fetched: AtomicUsize,
    records_fetched: AtomicUsize,
}

impl MemoryAdStore {
    /// Creates a store that serves batches of `batch_size` (at least 1).
    pub fn new(batch_size: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            batch_size: batch_size.max(1),
            fault: RwLock::new(None),
            scans: AtomicUsize::new(0),
            batches_fetched: AtomicUsize::new(0),
            records_fetched: AtomicUsize::new(0),
        }
    }

    pub fn with_records(batch_size: usize, records: Vec<AdRecord>) -> Self {
        let store = Self::new(batch_size);
        if let Ok(mut guard) = store.records.write() {
            *guard = records;
        }
        store
    }

    /// Adds a record, active or not.
    pub fn insert(&self, record: AdRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::unavailable("in-memory store lock poisoned"))?
            .push(record);
        Ok(())
    }

    /// Makes every following scan fail with `kind`, or clears the fault.
    pub fn set_fault(&self, kind: Option<StoreErrorKind>) {
        if let Ok(mut fault) = self.fault.write() {
            *fault = kind;
        }
    }

    /// Completed or attempted scans.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Non-empty batches handed out across all scans.
    pub fn batches_fetched(&self) -> usize {
        self.batches_fetched.load(Ordering::SeqCst)
    }

    /// Records handed out across all scans.
    pub fn records_fetched(&self) -> usize {
        self.records_fetched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdStore for MemoryAdStore {
    async fn scan_eligible(&self) -> Result<EligibleSet, StoreError> {
        self.scans.fetch_add(1, Ordering::SeqCst);

        let fault = *self
            .fault
            .read()
            .map_err(|_| StoreError::unavailable("in-memory store lock poisoned"))?;
        match fault {
            Some(StoreErrorKind::SchemaMissing) => {
                return Err(StoreError::schema_missing("in-memory table \"ad\" does not exist"));
            }
            Some(StoreErrorKind::StoreUnavailable) => {
                return Err(StoreError::unavailable("in-memory store is offline"));
            }
            None => {}
        }

        let ranked = {
            let records = self
                .records
                .read()
                .map_err(|_| StoreError::unavailable("in-memory store lock poisoned"))?;
            EligibleSet::ranked(records.iter().filter(|r| r.active).cloned().collect())
        };

        let mut scan = BatchScan::new();
        let mut cursor = ranked.records().chunks(self.batch_size);
        loop {
            let batch = cursor.next().map(<[AdRecord]>::to_vec).unwrap_or_default();
            if !batch.is_empty() {
                self.batches_fetched.fetch_add(1, Ordering::SeqCst);
                self.records_fetched.fetch_add(batch.len(), Ordering::SeqCst);
            }
            if scan.push(batch).is_stop() {
                break;
            }
        }
        debug!(batches = scan.batches(), "In-memory scan finished");
        Ok(scan.finish())
    }
}

/// In-process `AdCache` holding the encoded snapshot.
#[derive(Debug, Default)]
pub struct MemoryAdCache {
    snapshot: RwLock<Option<Vec<u8>>>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryAdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes under the key, bypassing the codec.
    pub fn put_raw(&self, bytes: Vec<u8>) {
        if let Ok(mut snapshot) = self.snapshot.write() {
            *snapshot = Some(bytes);
        }
    }

    /// Makes every following call fail with `CacheError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Successful snapshot writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether a snapshot is currently stored.
    pub fn is_populated(&self) -> bool {
        self.snapshot.read().map(|s| s.is_some()).unwrap_or(false)
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("in-memory cache is offline".to_string()));
        }
        Ok(())
    }
}

fn poisoned() -> CacheError {
    CacheError::Unavailable("in-memory cache lock poisoned".to_string())
}

#[async_trait]
impl AdCache for MemoryAdCache {
    async fn get(&self) -> Result<Option<EligibleSet>, CacheError> {
        self.check_online()?;
        let snapshot = self.snapshot.read().map_err(|_| poisoned())?;
        match snapshot.as_deref() {
            None => Ok(None),
            Some(bytes) => {
                let records = decode_snapshot(bytes)?;
                Ok((!records.is_empty()).then_some(records))
            }
        }
    }

    async fn set(&self, records: &EligibleSet) -> Result<(), CacheError> {
        self.check_online()?;
        if records.is_empty() {
            return Ok(());
        }
        let bytes = encode_snapshot(records)?;
        *self.snapshot.write().map_err(|_| poisoned())? = Some(bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn invalidate(&self) -> Result<(), CacheError> {
        self.check_online()?;
        *self.snapshot.write().map_err(|_| poisoned())? = None;
        Ok(())
    }
}
