//! # Bidder Server
//!
//! Answers `POST /bw_dsp` bid requests with the best eligible advertisement
//! for the offered floor price.
//!
//! Eligible ads live in PostgreSQL (table `ad`); a snapshot of the eligible
//! set is kept in Redis and read through on every request. Settings come from
//! defaults, `server_bidder.conf`, `.env`, the environment and the command line.

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

mod bidder_logic;
use bidder_logic::{api, config, logger, state};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load_config()?;
    let _log_guard = logger::setup_logging(&settings.log_dir, &settings.log_level)?;
    info!(
        "Configuration loaded: DB URL (hidden), Redis URL (hidden), bind: {}, fetch count: {}",
        settings.bind_addr, settings.fetch_count
    );

    let ctx = state::AppContext::open(&settings).await?;
    let app = api::router(ctx.state());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!("Starting HTTP server on http://{}", settings.bind_addr);

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Release connections even when the server loop failed.
    ctx.close();
    served?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, initiating shutdown."),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
                info!("SIGTERM received, initiating shutdown.");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
