//! File logging; the terminal belongs to the UI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{self, LogSettings};

const LOG_FILE_PREFIX: &str = "binday.log";

/// Install the global subscriber. Keep the guard alive until exit or buffered lines are lost.
pub(crate) fn init(settings: &LogSettings, dir_override: Option<&Path>) -> Result<WorkerGuard> {
    let directory = match dir_override.or(settings.directory.as_deref()) {
        Some(dir) => dir.to_path_buf(),
        None => config::default_log_dir()?,
    };
    fs::create_dir_all(&directory)
        .with_context(|| format!("creating log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_err| EnvFilter::try_new(&settings.filter))
        .with_context(|| format!("invalid log filter {:?}", settings.filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
