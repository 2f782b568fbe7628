use std::fs::OpenOptions;
use std::io;
use std::str::FromStr;
use std::sync::Mutex;

use arena_http::config::ServiceConfig;
use thiserror::Error;
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::FmtSubscriber;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log level {level}")]
    InvalidLevel { level: String },

    #[error("can't open log file: {source}")]
    Open { source: io::Error },

    #[error("setting default subscriber failed: {source}")]
    Install { source: SetGlobalDefaultError },
}

/// Installs the global `FmtSubscriber`, writing to the configured log file or stderr.
///
/// # Errors
///
/// Returns [`LoggingError`] for an unknown level, a log file that can't be opened, or
/// when a global subscriber is already set.
pub fn init(config: &ServiceConfig) -> Result<(), LoggingError> {
    let level =
        Level::from_str(&config.log_level).map_err(|_| LoggingError::InvalidLevel { level: config.log_level.clone() })?;
    let builder = FmtSubscriber::builder().with_max_level(level);

    let installed = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::Open { source })?;
            tracing::subscriber::set_global_default(builder.with_ansi(false).with_writer(Mutex::new(file)).finish())
        }
        None => tracing::subscriber::set_global_default(builder.with_writer(io::stderr).finish()),
    };
    installed.map_err(|source| LoggingError::Install { source })
}
