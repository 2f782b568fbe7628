//! Command line and configuration file handling.
//!
//! Settings start from [`ServiceConfig::default`], are replaced by the TOML file given
//! with `-c` and finally overridden by the remaining flags, whatever their order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arena_http::config::ServiceConfig;
use clap::Parser;
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("can't read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid log level {level}, expected one of trace, debug, info, warn, error")]
    InvalidLogLevel { level: String },
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "arena-http-server", version, about = "Single threaded HTTP/1.x server on paged arenas")]
pub struct Args {
    /// Load settings from a TOML file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Listen address [default: 0.0.0.0:8888]
    #[arg(short = 'l', long, value_name = "ADDRESS")]
    pub listen: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(short = 'd', long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, value_name = "LEVEL", value_parser = LOG_LEVELS, ignore_case = true)]
    pub log_level: Option<String>,
}

impl Args {
    /// Loads the config file, if any, then applies the flags on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a config file that can't be read or parsed, or a log
    /// level other than `trace`, `debug`, `info`, `warn` or `error`.
    pub fn into_config(self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => load_file(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }

        validate(&config)?;
        Ok(config)
    }
}

/// Reads a TOML file holding a [`ServiceConfig`] table; missing keys keep their defaults.
pub fn load_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
    let level = config.log_level.to_ascii_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLogLevel { level: config.log_level.clone() })
    }
}
