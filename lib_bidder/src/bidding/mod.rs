//! # Bidding Core
//!
//! Everything needed to answer one bid request, independent of any concrete
//! backing store or cache.
//!
//! ## Components:
//!
//! - **`model`**: `AdRecord`, the ranked `EligibleSet` and the bid outcome types.
//! - **`scan`**: `BatchScan`, the early-termination rule applied while a store
//!   streams ranked batches.
//! - **`store`** / **`cache`**: the `AdStore` and `AdCache` seams.
//! - **`loader`**: `RecordLoader`, the cache-aside read path.
//! - **`multiplier`**: sources of the per-record random multiplier.
//! - **`engine`**: `BidEngine`, pricing, max-selection and the floor comparison.
//! - **`memory`**: in-process implementations of both seams.

/// Cache seam and its error type.
pub mod cache;
/// The bid engine.
pub mod engine;
/// Store fault taxonomy.
pub mod errors;
/// Cache-aside loader.
pub mod loader;
/// In-memory store and cache.
pub mod memory;
/// Records, eligible sets and outcomes.
pub mod model;
/// Random multiplier sources.
pub mod multiplier;
/// Bounded batch scan state machine.
pub mod scan;
/// Store seam.
pub mod store;

pub use cache::{AdCache, CacheError};
pub use engine::BidEngine;
pub use errors::{StoreError, StoreErrorKind};
pub use loader::{DEFAULT_CACHE_TIMEOUT, LoadError, RecordLoader};
pub use memory::{MemoryAdCache, MemoryAdStore};
pub use model::{AdRecord, BidOutcome, EligibleSet, NoBidReason, WinningBid};
pub use multiplier::{
    FixedMultiplier, MAX_MULTIPLIER, MIN_MULTIPLIER, MultiplierSource, SeededMultiplier,
    ThreadRngMultiplier,
};
pub use scan::{BatchScan, ScanControl};
pub use store::AdStore;
