use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::handler::Handler;
use crate::protocol::HttpError;
use crate::session::{AfterWrite, Progress, Service, SessionKey, WriteProgress};

/// One accepted connection and its session.
///
/// The service is shared through `Rc<RefCell<_>>` by all connections of a
/// [`LocalSet`](tokio::task::LocalSet); a borrow is never held across an `.await`.
#[derive(Debug)]
pub struct HttpConnection<H> {
    stream: TcpStream,
    service: Rc<RefCell<Service<H>>>,
    key: SessionKey,
    conn_id: u64,
}

impl<H: Handler> HttpConnection<H> {
    /// Opens a session for `stream`.
    pub fn new(stream: TcpStream, service: Rc<RefCell<Service<H>>>) -> Self {
        let (key, conn_id) = {
            let mut service = service.borrow_mut();
            let key = service.accept();
            (key, service.context(key).map_or(0, |ctx| ctx.conn_id()))
        };
        Self { stream, service, key, conn_id }
    }

    #[inline]
    pub fn key(&self) -> SessionKey {
        self.key
    }

    #[inline]
    pub fn conn_id(&self) -> u64 {
        self.conn_id
    }

    /// Serves requests until the peer goes away, a response asks to close, or an error
    /// occurs. The session is closed in every case.
    ///
    /// # Errors
    ///
    /// Returns the parse error of a malformed request, the arena error when memory runs
    /// out, or the socket error.
    pub async fn process(self) -> Result<(), HttpError> {
        let result = self.serve().await;
        self.service.borrow_mut().close(self.key);
        result
    }

    async fn serve(&self) -> Result<(), HttpError> {
        loop {
            if !self.read_request().await? {
                debug!(conn_id = self.conn_id, "peer closed the connection");
                return Ok(());
            }

            self.write_response().await?;

            let after = self.service.borrow_mut().on_write_complete(self.key)?;
            if after == AfterWrite::Close {
                return Ok(());
            }
        }
    }

    /// Reads until a full request has been parsed and answered; false when the peer
    /// closed the stream first.
    async fn read_request(&self) -> Result<bool, HttpError> {
        loop {
            self.stream.readable().await?;

            let result = {
                let mut service = self.service.borrow_mut();
                let buf = service.read_buffer(self.key)?;
                self.stream.try_read(buf)
            };

            match result {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    trace!(conn_id = self.conn_id, bytes = n, "socket read");
                    let progress = self.service.borrow_mut().on_bytes_read(self.key, n)?;
                    if progress == Progress::Respond {
                        return Ok(true);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn write_response(&self) -> Result<(), HttpError> {
        loop {
            self.stream.writable().await?;

            let result = {
                let service = self.service.borrow();
                let segments = service.segments(self.key);
                if segments.is_empty() {
                    return Ok(());
                }
                self.stream.try_write_vectored(&segments)
            };

            match result {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => {
                    trace!(conn_id = self.conn_id, bytes = n, "socket write");
                    if self.service.borrow_mut().on_bytes_written(self.key, n)? == WriteProgress::Complete {
                        return Ok(());
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
