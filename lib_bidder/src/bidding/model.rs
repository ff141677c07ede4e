//! # Bidding Data Model
//!
//! Records as the store hands them out, the ranked set the loader caches, and
//! the outcome of a single bid attempt.

use serde::{Deserialize, Serialize};

/// # Ad Record
///
/// One advertisement eligible for bidding. Read-only on the bidding path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRecord {
    /// Store-assigned identifier, surfaced to callers as a string.
    pub id: String,
    /// Eligibility flag. Only active records are ever scanned.
    pub active: bool,
    /// Base valuation unit of the record.
    pub bidding_cpm: u32,
}

impl AdRecord {
    /// Creates an active record.
    pub fn new(id: impl Into<String>, bidding_cpm: u32) -> Self {
        Self {
            id: id.into(),
            active: true,
            bidding_cpm,
        }
    }

    /// Highest price this record can bid under any multiplier draw.
    pub fn price_ceiling(&self) -> u64 {
        u64::from(self.bidding_cpm) * u64::from(super::multiplier::MAX_MULTIPLIER)
    }
}

/// # Eligible Set
///
/// Records believed eligible, ranked by `bidding_cpm` descending. It may be a
/// proper prefix of the active records in the store: the scan drops the tail
/// that can never outbid the leader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EligibleSet(Vec<AdRecord>);

impl EligibleSet {
    /// Wraps records that are already ranked.
    pub fn new(records: Vec<AdRecord>) -> Self {
        Self(records)
    }

    /// Ranks arbitrary records by `bidding_cpm` descending. The sort is
    /// stable, so records with equal cpm keep their relative order.
    pub fn ranked(mut records: Vec<AdRecord>) -> Self {
        records.sort_by(|a, b| b.bidding_cpm.cmp(&a.bidding_cpm));
        Self(records)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn records(&self) -> &[AdRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AdRecord> {
        self.0.iter()
    }

    /// Whether the set is non-increasing in `bidding_cpm`.
    pub fn is_ranked(&self) -> bool {
        self.0
            .windows(2)
            .all(|pair| pair[0].bidding_cpm >= pair[1].bidding_cpm)
    }

    /// The `bidding_cpm` values in order.
    pub fn cpms(&self) -> Vec<u32> {
        self.0.iter().map(|r| r.bidding_cpm).collect()
    }

    pub(crate) fn extend(&mut self, batch: Vec<AdRecord>) {
        self.0.extend(batch);
    }

    pub fn into_records(self) -> Vec<AdRecord> {
        self.0
    }
}

impl From<Vec<AdRecord>> for EligibleSet {
    fn from(records: Vec<AdRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a EligibleSet {
    type Item = &'a AdRecord;
    type IntoIter = std::slice::Iter<'a, AdRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// # Winning Bid
///
/// The wire shape of a successful bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningBid {
    pub ad_id: String,
    pub price: u64,
}

/// Why a bid attempt produced no winner.
#[derive(Debug, Clone, PartialEq)]
pub enum NoBidReason {
    /// Neither the cache nor the store held an eligible record.
    NoEligibleRecords,
    /// The best computed price did not reach the floor.
    BelowFloor { best_price: u64, floor: f64 },
}

/// # Bid Outcome
///
/// The ordinary result of an auction. Store faults are reported separately
/// as `StoreError`, so an empty auction can never be mistaken for a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum BidOutcome {
    Won(WinningBid),
    NoBid(NoBidReason),
}

impl BidOutcome {
    pub fn is_won(&self) -> bool {
        matches!(self, BidOutcome::Won(_))
    }

    /// The winning bid, if any.
    pub fn winner(&self) -> Option<&WinningBid> {
        match self {
            BidOutcome::Won(bid) => Some(bid),
            BidOutcome::NoBid(_) => None,
        }
    }
}
