//! # Bidder Admin
//!
//! Provisioning tool for the bidder's backing stores: creates the database
//! and the `ad` table, writes ads, and keeps the Redis snapshot in step with
//! those writes. `scan` runs the same bounded scan the server uses and prints
//! the result.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lib_bidder::AdStore;
use lib_bidder::bidding::AdCache;
use lib_bidder::connections::{
    PgAdStore, ProvisionError, RedisAdCache, database_name, ensure_database, maintenance_config,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Shares the server's layering so both binaries agree on the snapshot key.
#[allow(dead_code)]
#[path = "bidder_logic/config.rs"]
mod config;

const POOL_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[clap(about = "Provisioning tool for the bidder's PostgreSQL and Redis stores", version)]
struct Cli {
    #[clap(long, env = "DATABASE_URL", help = "PostgreSQL connection URL of the ad database.")]
    db_url: String,

    #[clap(long, env = "REDIS_URL", help = "Redis connection URL (needed by cache-touching commands).")]
    redis_url: Option<String>,

    #[clap(long, env = "BIDDER_CACHE_KEY", help = "Redis key holding the eligible-ad snapshot (default: as the server resolves it).")]
    cache_key: Option<String>,

    #[clap(long, env = "BIDDER_CONFIG_PATH", help = "Server JSON configuration file consulted for redisUrl and cacheKey.")]
    config_path: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database when missing, then the ad table.
    InitDb {
        #[clap(long, help = "Maintenance connection string used to create the database (default: same server, `postgres` database).")]
        admin_url: Option<String>,
    },
    /// Create the ad table.
    CreateTable,
    /// Insert an ad and invalidate the cached snapshot.
    Insert {
        #[clap(long)]
        cpm: u32,
        #[clap(long, help = "Insert the ad as not eligible.")]
        inactive: bool,
    },
    /// Change an ad's eligibility and invalidate the cached snapshot.
    SetStatus {
        #[clap(long)]
        id: i32,
        #[clap(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Drop the cached snapshot.
    InvalidateCache,
    /// Run the bounded scan and print the eligible set as JSON.
    Scan {
        #[clap(long, default_value_t = 100)]
        fetch_count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::InitDb { ref admin_url } => {
            let db_name = database_name(&cli.db_url)
                .context("database URL does not name a database")?;
            let admin = maintenance_config(&cli.db_url, admin_url.as_deref())
                .context("invalid maintenance connection string")?;
            if ensure_database(&admin, &db_name).await? {
                info!("Created database {}", db_name);
            } else {
                info!("Database {} already exists", db_name);
            }
            let store = open_store(&cli.db_url, 1)?;
            match store.create_ad_table().await {
                Ok(()) => {}
                Err(ProvisionError::DuplicateTable(table)) => {
                    info!("Table {} already exists", table)
                }
                Err(e) => return Err(e.into()),
            }
            store.close();
        }
        Command::CreateTable => {
            let store = open_store(&cli.db_url, 1)?;
            store.create_ad_table().await?;
            store.close();
        }
        Command::Insert { cpm, inactive } => {
            let store = open_store(&cli.db_url, 1)?;
            let id = store.insert_ad(!inactive, cpm).await?;
            store.close();
            println!("{id}");
            invalidate(&cli).await?;
        }
        Command::SetStatus { id, active } => {
            let store = open_store(&cli.db_url, 1)?;
            let updated = store.set_ad_status(id, active).await?;
            store.close();
            if !updated {
                bail!("no ad with id {id}");
            }
            invalidate(&cli).await?;
        }
        Command::InvalidateCache => invalidate(&cli).await?,
        Command::Scan { fetch_count } => {
            let store = open_store(&cli.db_url, fetch_count)?;
            let result = store.scan_eligible().await;
            store.close();
            let records = result.map_err(|e| anyhow::anyhow!(e.diagnostic()))?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}

fn open_store(db_url: &str, fetch_count: usize) -> Result<PgAdStore> {
    PgAdStore::connect(db_url, 2, fetch_count, POOL_WAIT).context("failed to create PostgreSQL pool")
}

/// Drops the snapshot so the next bid request reloads from PostgreSQL.
async fn invalidate(cli: &Cli) -> Result<()> {
    let target = config::resolve_cache_target(config::Config {
        config_path: cli.config_path.clone(),
        redis_url: cli.redis_url.clone(),
        cache_key: cli.cache_key.clone(),
        ..Default::default()
    })?;
    let Some(redis_url) = target.redis_url else {
        warn!(key = %target.cache_key, "No Redis URL configured; cached snapshot left as is");
        return Ok(());
    };
    let cache = RedisAdCache::connect(&redis_url, target.cache_key, None)
        .await
        .context("Redis is unreachable")?;
    cache.invalidate().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn env_of(cmd: &clap::Command, id: &str) -> Option<String> {
        cmd.get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn test_shared_settings_read_the_same_environment_as_the_server() {
        let admin = Cli::command();
        let server = config::Config::command();
        for id in ["cache_key", "redis_url", "config_path", "db_url"] {
            assert!(env_of(&admin, id).is_some(), "{id}");
            assert_eq!(env_of(&admin, id), env_of(&server, id), "{id}");
        }
    }

    #[test]
    fn test_set_status_takes_an_explicit_bool() {
        let cli = Cli::try_parse_from([
            "bidder_admin",
            "--db-url",
            "postgres://u:p@localhost/ad_db",
            "set-status",
            "--id",
            "4",
            "--active",
            "false",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::SetStatus { id: 4, active: false }));
    }
}
