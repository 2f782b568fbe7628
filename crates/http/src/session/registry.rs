use tracing::debug;

use crate::config::ServiceConfig;
use crate::pool::Pool;
use crate::protocol::HeaderEntry;
use crate::session::SessionContext;

/// The pools one service instance allocates from.
///
/// Request and response header records come from separate pools so a handler can read
/// request headers while it adds response headers.
#[derive(Debug)]
pub struct PoolRegistry {
    pub(crate) contexts: Pool<SessionContext>,
    pub(crate) request_headers: Pool<HeaderEntry>,
    pub(crate) response_headers: Pool<HeaderEntry>,
}

impl PoolRegistry {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            contexts: Pool::new(config.context_pool_capacity),
            request_headers: Pool::new(config.header_pool_capacity),
            response_headers: Pool::new(config.header_pool_capacity),
        }
    }

    #[inline]
    pub fn contexts(&self) -> &Pool<SessionContext> {
        &self.contexts
    }

    #[inline]
    pub fn request_headers(&self) -> &Pool<HeaderEntry> {
        &self.request_headers
    }

    #[inline]
    pub fn response_headers(&self) -> &Pool<HeaderEntry> {
        &self.response_headers
    }
}

impl Drop for PoolRegistry {
    fn drop(&mut self) {
        debug!(
            contexts_in_use = self.contexts.capacity() - self.contexts.free_count() + self.contexts.overflow_len(),
            "releasing session pools"
        );
    }
}
