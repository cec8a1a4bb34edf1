//! Subscriber setup for the `nebuia-flow` binary.
//!
//! Library code only emits `tracing` events. The binary calls [`init_tracing`] once, which
//! writes compact events to stdout and appends them to a log file, and keeps the returned guard
//! alive until it exits so buffered file output is flushed.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable overriding the log file path.
pub const LOG_FILE_ENV: &str = "NEBUIA_LOG_FILE";
/// Log file used when [`LOG_FILE_ENV`] is unset or blank.
pub const DEFAULT_LOG_FILE: &str = "logs/nebuia-flow.log";

/// Install the stdout and file subscribers.
///
/// Filtering follows `RUST_LOG` and falls back to `info`. When the log file cannot be opened
/// only stdout is used and `None` is returned.
pub fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let path = log_file_path(std::env::var(LOG_FILE_ENV).ok());
    let (file_layer, guard) = match open_log_writer(&path) {
        Ok((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            (Some(layer), Some(guard))
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
    guard
}

fn log_file_path(configured: Option<String>) -> PathBuf {
    configured
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_writer(path: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(tracing_appender::non_blocking(file))
}
