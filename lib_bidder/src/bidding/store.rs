//! # Backing Store Seam

use super::errors::StoreError;
use super::model::EligibleSet;
use async_trait::async_trait;

/// Authoritative source of eligible records.
///
/// `scan_eligible` returns active records ranked by `bidding_cpm` descending,
/// fetched in bounded batches and cut short by `BatchScan`. It never writes.
#[async_trait]
pub trait AdStore: Send + Sync {
    async fn scan_eligible(&self) -> Result<EligibleSet, StoreError>;
}
