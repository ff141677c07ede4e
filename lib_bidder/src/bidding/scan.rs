//! # Bounded Batch Scan
//!
//! Stores hand out active records ranked by `bidding_cpm` descending, one
//! fixed-size batch at a time. `BatchScan` accumulates those batches and
//! decides after each one whether fetching further can still matter.
//!
//! The first record of the first non-empty batch carries the largest cpm of
//! the scan, so the leader is guaranteed a price of at least that cpm. A
//! record whose ceiling (`cpm * MAX_MULTIPLIER`) falls below it can never
//! win, and because batches are ranked neither can anything after it. The
//! scan therefore stops when:
//!
//! 1. a batch comes back empty (store exhausted), or
//! 2. the last record of the batch just absorbed has a ceiling below the
//!    leader's cpm.
//!
//! Pruning is per batch: the batch that trips the rule is kept whole.

use super::model::{AdRecord, EligibleSet};
use tracing::debug;

/// What the caller should do after handing a batch to the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

impl ScanControl {
    pub fn is_stop(self) -> bool {
        self == ScanControl::Stop
    }
}

/// Accumulator for one bounded scan.
#[derive(Debug, Default)]
pub struct BatchScan {
    records: EligibleSet,
    max_cpm: u64,
    batches: usize,
    stopped: bool,
}

impl BatchScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs the next ranked batch and reports whether to keep fetching.
    /// Once `Stop` has been returned, further batches are ignored.
    pub fn push(&mut self, batch: Vec<AdRecord>) -> ScanControl {
        if self.stopped {
            return ScanControl::Stop;
        }

        let Some(last) = batch.last() else {
            debug!(batches = self.batches, "Store exhausted, ending scan");
            self.stopped = true;
            return ScanControl::Stop;
        };
        let last_ceiling = last.price_ceiling();

        if self.batches == 0 {
            self.max_cpm = u64::from(batch[0].bidding_cpm);
        }
        self.batches += 1;
        debug!(
            batch = self.batches,
            size = batch.len(),
            max_cpm = self.max_cpm,
            last_ceiling,
            "Absorbed batch"
        );
        self.records.extend(batch);

        if last_ceiling < self.max_cpm {
            debug!(batches = self.batches, "Remaining records cannot outbid the leader, ending scan");
            self.stopped = true;
            return ScanControl::Stop;
        }
        ScanControl::Continue
    }

    /// Largest `bidding_cpm` seen so far, or 0 before the first record.
    pub fn max_cpm(&self) -> u64 {
        self.max_cpm
    }

    /// Number of non-empty batches absorbed.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn finish(self) -> EligibleSet {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(cpms: &[u32]) -> Vec<AdRecord> {
        cpms.iter()
            .enumerate()
            .map(|(i, cpm)| AdRecord::new(format!("{cpm}-{i}"), *cpm))
            .collect()
    }

    /// Feeds `cpms` to a scan in chunks of `size`, returning the kept cpms
    /// and how many batches were requested from the "store".
    fn run(cpms: &[u32], size: usize) -> (Vec<u32>, usize) {
        let mut scan = BatchScan::new();
        let mut requested = 0;
        let mut chunks = cpms.chunks(size);
        loop {
            requested += 1;
            let next = chunks.next().map(batch).unwrap_or_default();
            if scan.push(next).is_stop() {
                break;
            }
        }
        (scan.finish().cpms(), requested)
    }

    #[test]
    fn test_stops_on_first_batch_whose_tail_cannot_win() {
        // 8 * 10 < 100: the second batch trips the rule, no third fetch.
        let (kept, requested) = run(&[100, 50, 9, 8, 7], 2);
        assert_eq!(kept, vec![100, 50, 9, 8]);
        assert_eq!(requested, 2);
    }

    #[test]
    fn test_single_record_batches_never_fetch_past_the_cut() {
        let (kept, requested) = run(&[100, 50, 9, 8], 1);
        assert_eq!(kept, vec![100, 50, 9]);
        assert_eq!(requested, 3);
    }

    #[test]
    fn test_exhausted_store_ends_with_empty_batch() {
        let (kept, requested) = run(&[30, 20, 10], 2);
        assert_eq!(kept, vec![30, 20, 10]);
        // [30, 20], [10], then the empty batch.
        assert_eq!(requested, 3);
    }

    #[test]
    fn test_equal_ceiling_keeps_scanning() {
        // 10 * 10 == 100 is not below the leader's cpm.
        let (kept, _) = run(&[100, 10, 10, 9], 2);
        assert_eq!(kept, vec![100, 10, 10, 9]);
    }

    #[test]
    fn test_empty_store_yields_empty_set() {
        let mut scan = BatchScan::new();
        assert!(scan.push(Vec::new()).is_stop());
        assert_eq!(scan.max_cpm(), 0);
        assert_eq!(scan.batches(), 0);
        assert!(scan.finish().is_empty());
    }

    #[test]
    fn test_max_cpm_comes_from_first_record_only() {
        let mut scan = BatchScan::new();
        assert_eq!(scan.push(batch(&[40, 35])), ScanControl::Continue);
        assert_eq!(scan.max_cpm(), 40);
        assert_eq!(scan.push(batch(&[30, 5])), ScanControl::Continue);
        assert_eq!(scan.max_cpm(), 40);
        assert_eq!(scan.push(batch(&[3])), ScanControl::Stop);
        assert!(scan.is_stopped());
        assert_eq!(scan.batches(), 3);
    }

    #[test]
    fn test_batches_after_stop_are_ignored() {
        let mut scan = BatchScan::new();
        scan.push(batch(&[100, 1]));
        assert!(scan.is_stopped());
        assert_eq!(scan.push(batch(&[1])), ScanControl::Stop);
        assert_eq!(scan.finish().cpms(), vec![100, 1]);
    }

    #[test]
    fn test_result_is_always_ranked() {
        let cpms: Vec<u32> = (1..=60).rev().collect();
        for size in 1..=7 {
            let (kept, _) = run(&cpms, size);
            assert!(kept.windows(2).all(|w| w[0] >= w[1]), "size {size}");
            // Every dropped record has a ceiling below the leader.
            for dropped in &cpms[kept.len()..] {
                assert!(u64::from(*dropped) * 10 < 60);
            }
        }
    }
}
