use std::path::PathBuf;

use serde::Deserialize;

use crate::arena::DEFAULT_PAGE_SIZE;
use crate::codec::ParserLimits;

/// Default for [`ServiceConfig::max_headers`]
pub const MAX_HEADER_NUM: usize = 64;

/// Default for [`ServiceConfig::max_header_bytes`]
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default for [`ServiceConfig::max_body_bytes`]
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Settings of one service instance, passed explicitly to everything that needs them.
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```
/// # use arena_http::config::ServiceConfig;
/// let config = ServiceConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:8888");
/// assert_eq!(config.page_size, 2048);
/// assert_eq!(config.header_pool_capacity, 8 * config.context_pool_capacity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Address the server listens on
    pub listen: String,
    /// Page size of every session arena, rounded up to a power of two
    pub page_size: u32,
    /// Preallocated session contexts
    pub context_pool_capacity: usize,
    /// Preallocated header records, per direction
    pub header_pool_capacity: usize,
    pub max_header_bytes: usize,
    pub max_headers: usize,
    pub max_body_bytes: u64,
    /// Listen backlog
    pub backlog: u32,
    /// Max level of the log output, one of `trace`, `debug`, `info`, `warn`, `error`
    pub log_level: String,
    /// Log file, logs go to stderr when unset
    pub log_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let context_pool_capacity = 32;
        Self {
            listen: "0.0.0.0:8888".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            context_pool_capacity,
            header_pool_capacity: context_pool_capacity * 8,
            max_header_bytes: MAX_HEADER_BYTES,
            max_headers: MAX_HEADER_NUM,
            max_body_bytes: MAX_BODY_BYTES,
            backlog: 5,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl ServiceConfig {
    pub fn limits(&self) -> ParserLimits {
        ParserLimits {
            max_header_bytes: self.max_header_bytes,
            max_headers: self.max_headers,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
