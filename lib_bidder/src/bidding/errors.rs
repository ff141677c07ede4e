//! # Store Fault Taxonomy
//!
//! Faults raised by a backing store while scanning. Both kinds are fatal to
//! the request that hit them; neither is retried at request time. Each error
//! remembers where it was raised so the boundary can report it.

use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// The class of a store fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The eligible-records table does not exist.
    SchemaMissing,
    /// Connectivity, pool, protocol or data fault.
    StoreUnavailable,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErrorKind::SchemaMissing => write!(f, "SchemaMissing"),
            StoreErrorKind::StoreUnavailable => write!(f, "StoreUnavailable"),
        }
    }
}

/// # Store Error
#[derive(Debug, Clone, Error)]
#[error("[{kind}] {detail}")]
pub struct StoreError {
    kind: StoreErrorKind,
    detail: String,
    location: &'static Location<'static>,
}

impl StoreError {
    #[track_caller]
    pub fn new(kind: StoreErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn schema_missing(detail: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::SchemaMissing, detail)
    }

    #[track_caller]
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::StoreUnavailable, detail)
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// One-line operational diagnostic: origin, class and detail.
    pub fn diagnostic(&self) -> String {
        format!(
            "Exception raised in {}, line {}: [{}] {}.",
            self.location.file(),
            self.location.line(),
            self.kind,
            self.detail
        )
    }
}
