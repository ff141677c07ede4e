//! # Connections Module
//!
//! This module handles persistent connections to external services
//! including databases and caching layers, exposed through the `AdStore`
//! and `AdCache` seams of the bidding core.

/// Module for PostgreSQL connection pooling, the bounded ad scan and ad provisioning.
pub mod db_postgres;

/// Module for the Redis-backed eligible-set snapshot cache.
pub mod cache_redis;

pub use cache_redis::RedisAdCache;
pub use db_postgres::{
    PgAdStore, ProvisionError, database_name, ensure_database, maintenance_config,
};
