use std::io::IoSlice;

use http::Method;
use tracing::{debug, error, trace};

use crate::arena::View;
use crate::codec::{ParseState, ResponseEncoder};
use crate::config::ServiceConfig;
use crate::handler::Handler;
use crate::pool::{Pool, PoolKey};
use crate::protocol::{HeaderEntry, HttpError, ParseError, Request, Response};
use crate::session::{ConnectionState, PoolRegistry, SessionContext};

/// Handle of one accepted connection inside a [`Service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKey(PoolKey);

/// Outcome of handing read bytes to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The request is incomplete, keep reading.
    NeedMore,
    /// A response has been serialized, write [`Service::segments`] out.
    Respond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteProgress {
    Pending,
    Complete,
}

/// What to do with the connection once a response is fully written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterWrite {
    KeepReading,
    Close,
}

/// The protocol side of the server, free of any I/O.
///
/// The reactor accepts a socket, asks for a [`SessionKey`], and then only moves bytes:
/// it reads into [`read_buffer`](Service::read_buffer), reports the count through
/// [`on_bytes_read`](Service::on_bytes_read), and when a response is ready writes the
/// [`segments`](Service::segments) until [`on_bytes_written`](Service::on_bytes_written)
/// reports completion.
#[derive(Debug)]
pub struct Service<H> {
    config: ServiceConfig,
    pools: PoolRegistry,
    handler: H,
    encoder: ResponseEncoder,
    next_conn_id: u64,
    live: usize,
}

impl<H: Handler> Service<H> {
    pub fn new(config: ServiceConfig, handler: H) -> Self {
        let pools = PoolRegistry::new(&config);
        Self { config, pools, handler, encoder: ResponseEncoder::new(), next_conn_id: 0, live: 0 }
    }

    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[inline]
    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    /// Number of sessions accepted and not yet closed.
    #[inline]
    pub fn live_sessions(&self) -> usize {
        self.live
    }

    pub fn context(&self, key: SessionKey) -> Option<&SessionContext> {
        self.pools.contexts.slot(key.0)
    }

    /// Starts a session for a freshly accepted connection.
    pub fn accept(&mut self) -> SessionKey {
        let key = self.pools.contexts.get();
        self.next_conn_id += 1;
        self.live += 1;

        let ctx = &mut self.pools.contexts[key];
        ctx.init(self.next_conn_id, &self.config);
        ctx.state = ConnectionState::Reading;
        debug!(conn_id = ctx.conn_id, overflow = key.is_overflow(), "session accepted");
        SessionKey(key)
    }

    /// Spare room at the end of the session's inbound arena, growing it by a page when full.
    ///
    /// The socket reads straight into this slice; report the count with
    /// [`on_bytes_read`](Service::on_bytes_read).
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::SessionClosed`] for an unknown key, or the arena error when no
    /// page can be allocated.
    pub fn read_buffer(&mut self, key: SessionKey) -> Result<&mut [u8], HttpError> {
        let ctx = self.context_mut(key)?;
        Ok(ctx.inbound.last_page_for_write().map_err(ParseError::from)?)
    }

    /// Accounts `n` bytes the socket wrote into [`read_buffer`](Service::read_buffer) and
    /// parses them.
    pub fn on_bytes_read(&mut self, key: SessionKey, n: usize) -> Result<Progress, HttpError> {
        let ctx = self.context_mut(key)?;
        let n = u32::try_from(n).unwrap_or(u32::MAX);
        let chunk = ctx.inbound.commit(n).map_err(ParseError::from)?;
        trace!(conn_id = ctx.conn_id, bytes = n, "read");
        self.process(key, chunk)
    }

    /// Copies `bytes` into the session and parses them.
    ///
    /// Same as filling [`read_buffer`](Service::read_buffer) for callers that already hold
    /// the bytes elsewhere.
    pub fn feed(&mut self, key: SessionKey, bytes: &[u8]) -> Result<Progress, HttpError> {
        let ctx = self.context_mut(key)?;
        let chunk = ctx.inbound.append(bytes).map_err(ParseError::from)?;
        self.process(key, chunk)
    }

    /// The not yet written part of the pending response, as slices of the outbound arena.
    ///
    /// Empty when no response is pending.
    pub fn segments(&self, key: SessionKey) -> Vec<IoSlice<'_>> {
        match self.context(key) {
            Some(ctx) if ctx.state == ConnectionState::Writing => ctx.frame.segments(&ctx.outbound, ctx.written),
            _ => Vec::new(),
        }
    }

    pub fn on_bytes_written(&mut self, key: SessionKey, n: usize) -> Result<WriteProgress, HttpError> {
        let ctx = self.context_mut(key)?;
        ctx.written += n as u64;
        if ctx.written >= ctx.frame.len() { Ok(WriteProgress::Complete) } else { Ok(WriteProgress::Pending) }
    }

    /// Resets the session after its response went out and tells whether to keep reading.
    pub fn on_write_complete(&mut self, key: SessionKey) -> Result<AfterWrite, HttpError> {
        let PoolRegistry { contexts, request_headers, response_headers } = &mut self.pools;
        let ctx = contexts.slot_mut(key.0).ok_or(HttpError::SessionClosed)?;

        let keep_alive = ctx.response.keep_alive;
        let (conn_id, status, bytes) = (ctx.conn_id, ctx.response.status, ctx.written);
        debug!(conn_id, status, keep_alive, bytes, "response written");
        ctx.reset(request_headers, response_headers);

        if keep_alive {
            Ok(AfterWrite::KeepReading)
        } else {
            ctx.state = ConnectionState::Closed;
            Ok(AfterWrite::Close)
        }
    }

    /// Ends the session and returns its context to the pool.
    ///
    /// Unknown or already closed keys are ignored.
    pub fn close(&mut self, key: SessionKey) {
        let PoolRegistry { contexts, request_headers, response_headers } = &mut self.pools;
        let Some(ctx) = contexts.slot_mut(key.0) else {
            return;
        };
        ctx.request.headers.flush(request_headers);
        ctx.response.headers.flush(response_headers);
        debug!(conn_id = ctx.conn_id, "session closed");

        contexts.put(key.0);
        self.live -= 1;
    }

    fn context_mut(&mut self, key: SessionKey) -> Result<&mut SessionContext, HttpError> {
        self.pools.contexts.slot_mut(key.0).ok_or(HttpError::SessionClosed)
    }

    fn process(&mut self, key: SessionKey, chunk: View) -> Result<Progress, HttpError> {
        let Self { pools, handler, encoder, .. } = self;
        let ctx = pools.contexts.slot_mut(key.0).ok_or(HttpError::SessionClosed)?;

        let state = ctx.parser.feed(&ctx.inbound, chunk, &mut ctx.request, &mut pools.request_headers)?;
        if state != ParseState::Complete {
            return Ok(Progress::NeedMore);
        }

        ctx.state = ConnectionState::Dispatching;
        dispatch(handler, ctx, &pools.request_headers, &mut pools.response_headers);

        let send_body = ctx.request.method != Method::HEAD;
        ctx.frame = encoder.encode(&ctx.response, &mut ctx.outbound, &pools.response_headers, send_body)?;

        // the request is answered, its bytes and header records are no longer needed
        ctx.request.headers.flush(&mut pools.request_headers);
        ctx.inbound.clear();

        ctx.written = 0;
        ctx.state = ConnectionState::Writing;
        Ok(Progress::Respond)
    }
}

fn dispatch<H: Handler>(
    handler: &H,
    ctx: &mut SessionContext,
    request_headers: &Pool<HeaderEntry>,
    response_headers: &mut Pool<HeaderEntry>,
) {
    ctx.response.keep_alive = ctx.request.is_persistent();

    let request = Request::new(&ctx.request, &ctx.inbound, request_headers);
    let mut response = Response::new(&mut ctx.response, &mut ctx.outbound, response_headers);
    match handler.call(&request, &mut response) {
        Ok(()) => response.body_end(),
        Err(e) => {
            error!(conn_id = ctx.conn_id, cause = %e, "handler failed, responding with internal server error");
            response.reset_to(500);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use http::StatusCode;
    use indoc::indoc;

    use super::*;
    use crate::handler::{make_handler, HandlerError};

    fn demo(request: &Request<'_>, response: &mut Response<'_>) -> Result<(), HandlerError> {
        if request.path_matches("/hello") {
            response.set_content_type("text/plain")?;
            response.body_begin()?;
            response.body_append("Hello")?;
            response.body_append(" World!")?;
            response.body_end();
        } else if request.path_matches("/fail") {
            response.set_body("never sent")?;
            return Err(io::Error::other("backend unavailable").into());
        } else {
            response.set_status(StatusCode::NOT_FOUND);
            response.set_content_type("application/json")?;
            response.set_body(r#"{"code": 404, "message": "Not Found"}"#)?;
        }
        Ok(())
    }

    fn service(config: ServiceConfig) -> Service<impl Handler> {
        Service::new(config, make_handler(demo))
    }

    fn drain<H: Handler>(service: &mut Service<H>, key: SessionKey) -> Vec<u8> {
        let wire: Vec<u8> = service.segments(key).iter().flat_map(|slice| slice.iter().copied()).collect();
        assert_eq!(service.on_bytes_written(key, wire.len()).unwrap(), WriteProgress::Complete);
        wire
    }

    #[test]
    fn hello_route_end_to_end() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();

        let progress = service.feed(key, b"GET /hello/ HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
        assert_eq!(progress, Progress::Respond);

        let wire = drain(&mut service, key);
        assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n"));
        assert!(wire.ends_with(b"Hello World!"));
        assert_eq!(service.on_write_complete(key).unwrap(), AfterWrite::KeepReading);
    }

    #[test]
    fn body_is_written_from_arena_pages() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();
        service.feed(key, b"GET /hello HTTP/1.1\r\n\r\n").unwrap();

        let ctx = service.context(key).unwrap();
        let body = ctx.response().body();
        let body_page = ctx.outbound().get(body.offset()).unwrap().as_ptr();
        let segments = service.segments(key);
        assert_eq!(segments.last().unwrap().as_ptr(), body_page);
    }

    #[test]
    fn unknown_route_is_not_found() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();
        service.feed(key, b"GET /x1 HTTP/1.0\r\n\r\n").unwrap();

        let wire = String::from_utf8(drain(&mut service, key)).unwrap();
        assert!(wire.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(wire.contains("Content-Type: application/json\r\n"));
        assert!(!wire.contains("Connection: keep-alive"));
        assert!(wire.ends_with(r#""message": "Not Found"}"#));
        assert_eq!(service.on_write_complete(key).unwrap(), AfterWrite::Close);
    }

    #[test]
    fn http10_keep_alive_with_trailing_whitespace_stays_open() {
        let request = b"GET /hello HTTP/1.0\r\nConnection: keep-alive \r\nHost: h\t\r\n\r\n";

        for read_size in [request.len(), 3] {
            let config = ServiceConfig { page_size: 16, ..ServiceConfig::default() };
            let mut service = service(config);
            let key = service.accept();

            let mut progress = Progress::NeedMore;
            for read in request.chunks(read_size) {
                progress = service.feed(key, read).unwrap();
            }
            assert_eq!(progress, Progress::Respond, "read size {read_size}");

            let wire = String::from_utf8(drain(&mut service, key)).unwrap();
            assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"), "read size {read_size}");
            assert!(wire.contains("\r\nConnection: keep-alive\r\n"), "read size {read_size}");
            assert_eq!(service.on_write_complete(key).unwrap(), AfterWrite::KeepReading, "read size {read_size}");
        }
    }

    #[test]
    fn context_is_clean_after_each_response() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();
        let free_request_headers = service.pools().request_headers().free_count();
        let free_response_headers = service.pools().response_headers().free_count();

        for _ in 0..3 {
            let request = indoc! {"
                GET /index?x=1 HTTP/1.1
                Host: localhost
                Accept: */*
                User-Agent: test

            "};
            assert_eq!(service.feed(key, request.as_bytes()).unwrap(), Progress::Respond);
            drain(&mut service, key);
            assert_eq!(service.on_write_complete(key).unwrap(), AfterWrite::KeepReading);

            let ctx = service.context(key).unwrap();
            assert_eq!(ctx.state(), ConnectionState::Reading);
            assert_eq!(ctx.inbound().len(), 0);
            assert_eq!(ctx.outbound().len(), 0);
            assert_eq!(ctx.inbound().page_count(), 0);
            assert_eq!(ctx.outbound().page_count(), 0);
            assert!(ctx.request().headers.is_empty());
            assert!(ctx.response().headers.is_empty());
            assert_eq!(service.pools().request_headers().free_count(), free_request_headers);
            assert_eq!(service.pools().response_headers().free_count(), free_response_headers);
        }
    }

    #[test]
    fn request_split_across_reads() {
        let config = ServiceConfig { page_size: 16, ..ServiceConfig::default() };
        let mut service = service(config);
        let key = service.accept();

        let request = b"GET /hello/ HTTP/1.1\r\nHost: a-long-host-name.example\r\nConnection: close\r\n\r\n";
        let mut rest = &request[..];
        let mut progress = Progress::NeedMore;
        while !rest.is_empty() {
            assert_eq!(progress, Progress::NeedMore);
            let buf = service.read_buffer(key).unwrap();
            let n = buf.len().min(rest.len()).min(5);
            buf[..n].copy_from_slice(&rest[..n]);
            progress = service.on_bytes_read(key, n).unwrap();
            rest = &rest[n..];
        }
        assert_eq!(progress, Progress::Respond);

        let wire = drain(&mut service, key);
        assert!(wire.ends_with(b"\r\n\r\nHello World!"));
        assert_eq!(service.on_write_complete(key).unwrap(), AfterWrite::Close);
    }

    #[test]
    fn partial_writes_resume_where_they_stopped() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();
        service.feed(key, b"GET /hello HTTP/1.1\r\n\r\n").unwrap();

        let full: Vec<u8> = service.segments(key).iter().flat_map(|slice| slice.iter().copied()).collect();
        assert_eq!(service.on_bytes_written(key, 10).unwrap(), WriteProgress::Pending);
        let rest: Vec<u8> = service.segments(key).iter().flat_map(|slice| slice.iter().copied()).collect();
        assert_eq!(rest, &full[10..]);
        assert_eq!(service.on_bytes_written(key, rest.len()).unwrap(), WriteProgress::Complete);
    }

    #[test]
    fn handler_error_becomes_internal_server_error() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();
        service.feed(key, b"GET /fail HTTP/1.1\r\n\r\n").unwrap();

        let wire = drain(&mut service, key);
        assert_eq!(wire, b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: keep-alive\r\n\r\n");
    }

    #[test]
    fn head_request_gets_no_body() {
        let mut service = service(ServiceConfig::default());
        let key = service.accept();
        service.feed(key, b"HEAD /hello HTTP/1.1\r\n\r\n").unwrap();

        let wire = drain(&mut service, key);
        assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n"));
        assert!(wire.ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn parse_error_surfaces_and_close_returns_context() {
        let mut service = service(ServiceConfig::default());
        let free = service.pools().contexts().free_count();
        let key = service.accept();
        assert_eq!(service.pools().contexts().free_count(), free - 1);

        let result = service.feed(key, b"GET /hello HTTP/1.1\r\nbad header line\r\n\r\n");
        assert!(matches!(result, Err(HttpError::RequestError { .. })));

        service.close(key);
        assert_eq!(service.pools().contexts().free_count(), free);
        assert_eq!(service.live_sessions(), 0);
        assert!(matches!(service.feed(key, b"GET / HTTP/1.1\r\n\r\n"), Err(HttpError::SessionClosed)));
        service.close(key);
    }

    #[test]
    fn sessions_beyond_pool_capacity_still_work() {
        let config = ServiceConfig { context_pool_capacity: 1, header_pool_capacity: 1, ..ServiceConfig::default() };
        let mut service = service(config);
        let capacity = service.pools().contexts().capacity();

        let keys: Vec<SessionKey> = (0..capacity + 2).map(|_| service.accept()).collect();
        for &key in &keys {
            service.feed(key, b"GET /hello HTTP/1.1\r\nA: 1\r\nB: 2\r\n\r\n").unwrap();
            assert!(drain(&mut service, key).ends_with(b"Hello World!"));
        }
        for key in keys {
            service.close(key);
        }
        assert_eq!(service.pools().contexts().free_count(), capacity);
        assert_eq!(service.live_sessions(), 0);
    }
}
