//! Process-wide tracing: human-readable output on stdout plus a daily-rolling
//! plain-text file in the data directory's `logs/`.

use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::core::config::{AppPaths, Settings};

/// Flushes the file writer on exit; must outlive the subscriber.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Installs the global subscriber. The filter is `settings.log_filter`, which
/// already folds in `RUST_LOG`/`RAGATE_LOG`.
pub fn init(paths: &AppPaths, settings: &Settings) -> Result<(), LoggingError> {
    std::fs::create_dir_all(&paths.log_dir).map_err(|source| LoggingError::LogDir {
        path: paths.log_dir.clone(),
        source,
    })?;
    let filter = EnvFilter::try_new(&settings.log_filter)?;

    let appender = tracing_appender::rolling::daily(&paths.log_dir, &settings.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()?;

    let _ = FILE_GUARD.set(guard);
    tracing::debug!(
        "Logging to {} with filter {:?}",
        paths.log_dir.join(&settings.log_file).display(),
        settings.log_filter
    );
    Ok(())
}
