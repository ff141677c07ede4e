use crate::bidder_logic::config::Settings;
use anyhow::{Context, Result};
use lib_bidder::bidding::{MultiplierSource, ThreadRngMultiplier};
use lib_bidder::connections::{PgAdStore, RedisAdCache};
use lib_bidder::{BidEngine, RecordLoader};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Per-request view shared with the handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BidEngine>,
    pub request_timeout: Duration,
    // Health probe; absent when the engine runs on in-memory seams.
    pub db: Option<PgAdStore>,
}

impl AppState {
    pub fn new(engine: BidEngine, request_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            request_timeout,
            db: None,
        }
    }

    pub fn with_db(mut self, db: PgAdStore) -> Self {
        self.db = Some(db);
        self
    }
}

/// Everything the process opens at startup, closed once on shutdown.
pub struct AppContext {
    store: PgAdStore,
    state: AppState,
}

impl AppContext {
    pub async fn open(settings: &Settings) -> Result<Self> {
        let store = PgAdStore::connect(
            &settings.db_url,
            settings.db_pool_size,
            settings.fetch_count,
            settings.db_wait_timeout,
        )
        .context("failed to create PostgreSQL pool")?;
        store.ping().await.context("PostgreSQL is unreachable")?;
        info!("PostgreSQL connected");

        let cache = RedisAdCache::connect(
            &settings.redis_url,
            settings.cache_key.clone(),
            settings.cache_ttl_secs,
        )
        .await
        .context("Redis is unreachable")?;

        let loader = RecordLoader::new(Arc::new(store.clone()), Arc::new(cache))
            .with_cache_timeout(settings.cache_timeout);
        let multiplier: Arc<dyn MultiplierSource> = Arc::new(ThreadRngMultiplier);
        let engine = BidEngine::new(loader, multiplier);
        let state = AppState::new(engine, settings.request_timeout).with_db(store.clone());

        Ok(Self { store, state })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn close(self) {
        self.store.close();
    }
}
