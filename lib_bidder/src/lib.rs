//! # lib_bidder
//!
//! Bid-selection core for the real-time bidder and the adapters that back it.
//!
//! - **`bidding`**: the cache-aside record loader, the bounded batch scan with
//!   its early-termination rule, and the bid engine that prices and selects an
//!   advertisement against a floor price.
//! - **`connections`**: Postgres and Redis implementations of the store and
//!   cache seams declared in `bidding`.

#![forbid(unsafe_code)]

#[cfg(feature = "bidding")]
pub mod bidding;

#[cfg(feature = "connections")]
pub mod connections;

// Re-export the types every caller needs.
#[cfg(feature = "bidding")]
pub use bidding::{
    AdCache, AdRecord, AdStore, BidEngine, BidOutcome, CacheError, EligibleSet, NoBidReason,
    RecordLoader, StoreError, StoreErrorKind, WinningBid,
};
