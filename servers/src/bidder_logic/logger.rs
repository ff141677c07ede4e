use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_PREFIX: &str = "server_bidder_";

/// Installs the global subscriber: stdout plus a fresh timestamped file in
/// `log_dir`. `RUST_LOG` overrides `log_level` when set. Keep the returned
/// guard alive for the life of the process so buffered lines are flushed.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<WorkerGuard> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    // Clean up old log files, keeping only the most recent one
    cleanup_old_logs(log_dir)?;

    let log_file_name = format!(
        "{}{}.log",
        LOG_PREFIX,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let file_appender = tracing_appender::rolling::never(log_dir, log_file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}

fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" | "fatal" => "error",
        _ => "info",
    }
}

fn cleanup_old_logs(log_dir: &Path) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| is_own_log(p))
        .collect();

    // Timestamped names sort chronologically; newest first
    entries.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    // Keep the most recent one (index 0), delete the rest
    for path in entries.iter().skip(1) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to delete old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}

fn is_own_log(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "log")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_PREFIX))
}
