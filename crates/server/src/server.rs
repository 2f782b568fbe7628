use std::cell::RefCell;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::rc::Rc;

use arena_http::config::ServiceConfig;
use arena_http::connection::HttpConnection;
use arena_http::handler::Handler;
use arena_http::session::Service;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tokio::runtime::Builder;
use tokio::task::{self, LocalSet};
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct ServerBuilder {
    config: ServiceConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { config: ServiceConfig::default() }
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.listen = address.into();
        self
    }

    /// Resolves the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] when the address doesn't resolve.
    pub fn build(self) -> Result<Server, ServerError> {
        let address = self
            .config
            .listen
            .to_socket_addrs()
            .map_err(|source| ServerError::InvalidAddress { address: self.config.listen.clone(), source })?
            .collect::<Vec<_>>();
        if address.is_empty() {
            let source = io::Error::new(io::ErrorKind::AddrNotAvailable, "no address resolved");
            return Err(ServerError::InvalidAddress { address: self.config.listen, source });
        }
        Ok(Server { config: self.config, address })
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid listen address {address}: {source}")]
    InvalidAddress { address: String, source: io::Error },

    #[error("can't listen on {address}: {source}")]
    Bind { address: SocketAddr, source: io::Error },

    #[error("can't start the runtime: {source}")]
    Runtime { source: io::Error },
}

/// A single threaded server: one event loop, one [`Service`] shared by all connections.
#[derive(Debug)]
pub struct Server {
    config: ServiceConfig,
    address: Vec<SocketAddr>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Runs the server on a fresh current-thread runtime until the process ends.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the runtime can't be built or no address can be bound.
    pub fn run<H: Handler + 'static>(self, handler: H) -> Result<(), ServerError> {
        let runtime =
            Builder::new_current_thread().enable_all().build().map_err(|source| ServerError::Runtime { source })?;
        LocalSet::new().block_on(&runtime, self.start(handler))
    }

    /// Binds the listen address and serves connections; must run inside a [`LocalSet`].
    pub async fn start<H: Handler + 'static>(self, handler: H) -> Result<(), ServerError> {
        let listener = self.bind()?;
        serve(listener, self.config, handler).await;
        Ok(())
    }

    fn bind(&self) -> Result<TcpListener, ServerError> {
        let mut last_error = None;
        for &address in &self.address {
            match listen(address, self.config.backlog) {
                Ok(listener) => {
                    info!(%address, backlog = self.config.backlog, "start listening");
                    return Ok(listener);
                }
                Err(source) => {
                    error!(%address, cause = %source, "bind server error");
                    last_error = Some(ServerError::Bind { address, source });
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ServerError::InvalidAddress {
            address: self.config.listen.clone(),
            source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no address resolved"),
        }))
    }
}

fn listen(address: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = if address.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
    socket.set_reuseaddr(true)?;
    socket.bind(address)?;
    socket.listen(backlog)
}

/// Accepts connections from `listener` forever, each served on its own local task.
///
/// Must run inside a [`LocalSet`]; accept errors are logged and skipped.
pub async fn serve<H: Handler + 'static>(listener: TcpListener, config: ServiceConfig, handler: H) {
    let service = Rc::new(RefCell::new(Service::new(config, handler)));

    loop {
        let (tcp_stream, remote_addr) = match listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        if let Err(e) = tcp_stream.set_nodelay(true) {
            warn!(cause = %e, "failed to set TCP_NODELAY");
        }

        let connection = HttpConnection::new(tcp_stream, Rc::clone(&service));
        let conn_id = connection.conn_id();
        info!(conn_id, %remote_addr, "accepted connection");

        task::spawn_local(async move {
            match connection.process().await {
                Ok(()) => info!(conn_id, "finished process, connection shutdown"),
                Err(e) => error!(conn_id, cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::time::timeout;

    use super::*;
    use crate::routes::demo;

    async fn read_response(stream: &mut TcpStream) -> String {
        let mut wire = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            wire.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&wire);
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let length: usize = head
                    .lines()
                    .find_map(|line| line.strip_prefix("Content-Length: "))
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap();
                if body.len() >= length {
                    break;
                }
            }
        }
        String::from_utf8(wire).unwrap()
    }

    #[test]
    fn builder_rejects_bad_address() {
        let result = Server::builder().address("not an address").build();
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn serves_keep_alive_requests_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let local = LocalSet::new();
        local.spawn_local(serve(listener, ServiceConfig::default(), demo()));

        let client = async {
            let mut stream = TcpStream::connect(address).await.unwrap();

            stream.write_all(b"GET /hello/ HTTP/1.1\r\nHost: h\r\n\r\n").await.unwrap();
            let first = read_response(&mut stream).await;
            assert!(first.starts_with("HTTP/1.1 200 OK\r\nContent-Length: 12\r\n"));
            assert!(first.ends_with("Hello World!"));

            stream.write_all(b"GET /missing HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();
            let second = read_response(&mut stream).await;
            assert!(second.starts_with("HTTP/1.1 404 Not Found\r\n"));

            let mut rest = Vec::new();
            stream.read_to_end(&mut rest).await.unwrap();
            assert!(rest.is_empty());
        };

        timeout(Duration::from_secs(10), local.run_until(client)).await.unwrap();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_request_closes_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let local = LocalSet::new();
        local.spawn_local(serve(listener, ServiceConfig::default(), demo()));

        let client = async {
            let mut stream = TcpStream::connect(address).await.unwrap();
            stream.write_all(b"GET /hello HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").await.unwrap();

            let mut rest = Vec::new();
            match stream.read_to_end(&mut rest).await {
                Ok(_) => assert!(rest.is_empty()),
                Err(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            }
        };

        timeout(Duration::from_secs(10), local.run_until(client)).await.unwrap();
    }
}
