//! # Bid Engine
//!
//! Answers one bid request: load the eligible set, price every record with an
//! independent multiplier draw, take the highest price (first seen wins a
//! tie) and accept it when it reaches the floor. The engine keeps no state
//! between calls.

use super::errors::StoreError;
use super::loader::{LoadError, RecordLoader};
use super::model::{AdRecord, BidOutcome, EligibleSet, NoBidReason, WinningBid};
use super::multiplier::MultiplierSource;
use std::sync::Arc;
use tracing::debug;

/// A record together with its price for one bid attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedRecord<'a> {
    pub record: &'a AdRecord,
    pub bid_price: u64,
}

#[derive(Clone)]
pub struct BidEngine {
    loader: RecordLoader,
    multiplier: Arc<dyn MultiplierSource>,
}

impl BidEngine {
    pub fn new(loader: RecordLoader, multiplier: Arc<dyn MultiplierSource>) -> Self {
        Self { loader, multiplier }
    }

    pub fn loader(&self) -> &RecordLoader {
        &self.loader
    }

    /// Runs one auction against `floor_price`.
    ///
    /// Store faults are the only errors; "nothing eligible" and "floor not
    /// met" are both ordinary `BidOutcome::NoBid` values.
    pub async fn bid(&self, floor_price: f64) -> Result<BidOutcome, StoreError> {
        let records = match self.loader.load().await {
            Ok(records) => records,
            Err(LoadError::NoEligibleRecords) => {
                return Ok(BidOutcome::NoBid(NoBidReason::NoEligibleRecords));
            }
            Err(LoadError::Store(e)) => return Err(e),
        };

        let Some(best) = self.select(&records) else {
            return Ok(BidOutcome::NoBid(NoBidReason::NoEligibleRecords));
        };

        // Prices are far below 2^53, so the conversion is exact.
        if best.bid_price as f64 >= floor_price {
            debug!(ad_id = %best.record.id, price = best.bid_price, floor_price, "Bid won");
            Ok(BidOutcome::Won(WinningBid {
                ad_id: best.record.id.clone(),
                price: best.bid_price,
            }))
        } else {
            debug!(best_price = best.bid_price, floor_price, "Best price below floor");
            Ok(BidOutcome::NoBid(NoBidReason::BelowFloor {
                best_price: best.bid_price,
                floor: floor_price,
            }))
        }
    }

    /// Prices every record and returns the highest. Ties keep the earlier
    /// record.
    pub fn select<'a>(&self, records: &'a EligibleSet) -> Option<PricedRecord<'a>> {
        let mut best: Option<PricedRecord<'a>> = None;
        for record in records {
            let priced = PricedRecord {
                record,
                bid_price: self.price(record),
            };
            if best
                .as_ref()
                .is_none_or(|current| priced.bid_price > current.bid_price)
            {
                best = Some(priced);
            }
        }
        best
    }

    fn price(&self, record: &AdRecord) -> u64 {
        u64::from(record.bidding_cpm) * u64::from(self.multiplier.draw())
    }
}
