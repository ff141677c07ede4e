//! # Bid Multipliers
//!
//! Each record's bid price is its `bidding_cpm` times an independent uniform
//! integer in `[MIN_MULTIPLIER, MAX_MULTIPLIER]`, drawn once per record per
//! request. The draw source is pluggable so tests can pin or seed it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Smallest multiplier a draw can return.
pub const MIN_MULTIPLIER: u32 = 1;
/// Largest multiplier a draw can return.
pub const MAX_MULTIPLIER: u32 = 10;

/// A source of per-record multipliers. Implementations must stay inside
/// `[MIN_MULTIPLIER, MAX_MULTIPLIER]`.
pub trait MultiplierSource: Send + Sync {
    fn draw(&self) -> u32;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngMultiplier;

impl MultiplierSource for ThreadRngMultiplier {
    fn draw(&self) -> u32 {
        rand::rng().random_range(MIN_MULTIPLIER..=MAX_MULTIPLIER)
    }
}

/// Reproducible source: the same seed yields the same sequence of draws.
#[derive(Debug)]
pub struct SeededMultiplier {
    rng: Mutex<StdRng>,
}

impl SeededMultiplier {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl MultiplierSource for SeededMultiplier {
    fn draw(&self) -> u32 {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(MIN_MULTIPLIER..=MAX_MULTIPLIER)
    }
}

/// Source that always returns the same value, clamped into range.
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(u32);

impl FixedMultiplier {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl MultiplierSource for FixedMultiplier {
    fn draw(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_stays_in_range() {
        let source = ThreadRngMultiplier;
        for _ in 0..1_000 {
            let r = source.draw();
            assert!((MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&r));
        }
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let a = SeededMultiplier::new(42);
        let b = SeededMultiplier::new(42);
        let seq_a: Vec<u32> = (0..32).map(|_| a.draw()).collect();
        let seq_b: Vec<u32> = (0..32).map(|_| b.draw()).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().all(|r| (MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(r)));
    }

    #[test]
    fn test_seeded_draws_cover_both_bounds() {
        let source = SeededMultiplier::new(7);
        let draws: Vec<u32> = (0..2_000).map(|_| source.draw()).collect();
        assert!(draws.contains(&MIN_MULTIPLIER));
        assert!(draws.contains(&MAX_MULTIPLIER));
    }

    #[test]
    fn test_fixed_is_clamped() {
        assert_eq!(FixedMultiplier::new(0).value(), 1);
        assert_eq!(FixedMultiplier::new(5).draw(), 5);
        assert_eq!(FixedMultiplier::new(99).value(), 10);
    }
}
