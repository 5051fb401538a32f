//! Log sink for the CLI.
//!
//! Writes to a daily-rolling file under `<root>/logs` through a non-blocking
//! writer; falls back to stderr when the directory cannot be created.
//! `QUOTA_HUD_DEBUG_LOG=1` forces debug level, otherwise `RUST_LOG` or `info`.

use std::env;

use fs_err as fs;
use quota_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "quota-token.log";

fn filter() -> EnvFilter {
    let debug_enabled = env::var("QUOTA_HUD_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(storage: &StorageConfig) -> Option<WorkerGuard> {
    let logs_dir = storage.logs_dir();
    if let Err(err) = fs::create_dir_all(&logs_dir) {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!(error = %err, "Failed to create log directory, logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
