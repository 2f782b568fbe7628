use crate::arena::Arena;
use crate::codec::{RequestParser, ResponseFrame};
use crate::config::ServiceConfig;
use crate::pool::Pool;
use crate::protocol::{HeaderEntry, RequestHead, ResponseHead};

/// Where a connection is in its request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Accepted,
    Reading,
    Dispatching,
    Writing,
    Closed,
}

/// Everything one live connection owns.
///
/// Contexts are drawn from the service's context pool on accept, reset after every
/// written response, and returned to the pool when the connection closes.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub(crate) conn_id: u64,
    pub(crate) state: ConnectionState,
    pub(crate) inbound: Arena,
    pub(crate) outbound: Arena,
    pub(crate) parser: RequestParser,
    pub(crate) request: RequestHead,
    pub(crate) response: ResponseHead,
    pub(crate) frame: ResponseFrame,
    pub(crate) written: u64,
}

impl SessionContext {
    pub(crate) fn init(&mut self, conn_id: u64, config: &ServiceConfig) {
        self.conn_id = conn_id;
        self.state = ConnectionState::Accepted;
        self.inbound = Arena::new(config.page_size);
        self.outbound = Arena::new(config.page_size);
        self.parser = RequestParser::new(config.limits());
        self.request = RequestHead::default();
        self.response = ResponseHead::default();
        self.frame = ResponseFrame::default();
        self.written = 0;
    }

    /// Releases both arenas page by page and returns every header record to its pool,
    /// leaving the context ready to read the next request.
    pub(crate) fn reset(&mut self, request_headers: &mut Pool<HeaderEntry>, response_headers: &mut Pool<HeaderEntry>) {
        self.request.headers.flush(request_headers);
        self.response.headers.flush(response_headers);
        self.inbound.clear();
        self.outbound.clear();
        self.parser.reset();
        self.request = RequestHead::default();
        self.response = ResponseHead::default();
        self.frame = ResponseFrame::default();
        self.written = 0;
        self.state = ConnectionState::Reading;
    }

    #[inline]
    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[inline]
    pub fn inbound(&self) -> &Arena {
        &self.inbound
    }

    #[inline]
    pub fn outbound(&self) -> &Arena {
        &self.outbound
    }

    #[inline]
    pub fn request(&self) -> &RequestHead {
        &self.request
    }

    #[inline]
    pub fn response(&self) -> &ResponseHead {
        &self.response
    }

    #[inline]
    pub fn frame(&self) -> ResponseFrame {
        self.frame
    }
}
