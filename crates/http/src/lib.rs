//! A single-threaded HTTP/1.x server core built on paged arenas and object pools.
//!
//! Every connection owns two [`Arena`](arena::Arena)s: request bytes are read straight
//! into the inbound one and the response is built in the outbound one. The parser and
//! the handler only pass around [`View`](arena::View)s, `(offset, length)` pairs into
//! those arenas, and the response goes out as a vectored write of the arena pages. No
//! request or response byte is copied between the socket and the handler.
//!
//! # Example
//!
//! ```no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use arena_http::config::ServiceConfig;
//! use arena_http::connection::HttpConnection;
//! use arena_http::handler::make_handler;
//! use arena_http::protocol::{Request, Response, SendError};
//! use arena_http::session::Service;
//! use tokio::net::TcpListener;
//! use tokio::task::LocalSet;
//! use tracing::{error, info, warn};
//!
//! fn hello(request: &Request<'_>, response: &mut Response<'_>) -> Result<(), SendError> {
//!     info!(path = %request.text(request.path()), "request");
//!     response.set_content_type("text/plain")?;
//!     response.set_body("Hello World!")
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let service = Rc::new(RefCell::new(Service::new(ServiceConfig::default(), make_handler(hello))));
//!     let listener = match TcpListener::bind("127.0.0.1:8888").await {
//!         Ok(listener) => listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     LocalSet::new()
//!         .run_until(async move {
//!             loop {
//!                 let (stream, _remote_addr) = match listener.accept().await {
//!                     Ok(stream_and_addr) => stream_and_addr,
//!                     Err(e) => {
//!                         warn!(cause = %e, "failed to accept");
//!                         continue;
//!                     }
//!                 };
//!                 let connection = HttpConnection::new(stream, service.clone());
//!                 tokio::task::spawn_local(async move {
//!                     if let Err(e) = connection.process().await {
//!                         error!(cause = %e, "connection shutdown");
//!                     }
//!                 });
//!             }
//!         })
//!         .await;
//! }
//! ```
//!
//! # Architecture
//!
//! - [`arena`]: paged, growable byte buffer with stable offsets
//! - [`pool`]: fixed capacity object pool with heap overflow
//! - [`protocol`]: header lists, request and response state, errors
//! - [`codec`]: tokenizer, request parser and response encoder
//! - [`session`]: per-connection context and the I/O free [`Service`](session::Service)
//! - [`connection`]: tokio reactor glue for one TCP connection
//! - [`handler`]: the application boundary
//! - [`config`]: service settings
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only, one request in flight per connection
//! - No chunked transfer encoding, request bodies need a `Content-Length`
//! - No TLS
//! - Default limits: 8KB header section, 64 headers, 1MB body

pub mod arena;
pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod pool;
pub mod protocol;
pub mod session;

mod utils;
pub(crate) use utils::ensure;
