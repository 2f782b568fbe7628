//! Per-connection state and the I/O free request/response cycle.
//!
//! - [`SessionContext`]: the inbound and outbound arenas, the parser and the request and
//!   response heads of one connection, drawn from a pool on accept
//! - [`PoolRegistry`]: the context pool and the two header record pools of a service
//! - [`Service`]: drives parse, dispatch and serialize for every session; the reactor in
//!   [`connection`](crate::connection) only moves bytes between sockets and the service
//!
//! ```
//! use arena_http::config::ServiceConfig;
//! use arena_http::handler::make_handler;
//! use arena_http::protocol::{Request, Response, SendError};
//! use arena_http::session::{AfterWrite, Progress, Service};
//!
//! fn hello(_: &Request<'_>, response: &mut Response<'_>) -> Result<(), SendError> {
//!     response.set_body("hi")
//! }
//!
//! let mut service = Service::new(ServiceConfig::default(), make_handler(hello));
//! let key = service.accept();
//! assert_eq!(service.feed(key, b"GET / HTTP/1.0\r\n\r\n").unwrap(), Progress::Respond);
//!
//! let written: usize = service.segments(key).iter().map(|slice| slice.len()).sum();
//! service.on_bytes_written(key, written).unwrap();
//! assert_eq!(service.on_write_complete(key).unwrap(), AfterWrite::Close);
//! service.close(key);
//! ```

mod context;
mod registry;
mod service;

pub use context::ConnectionState;
pub use context::SessionContext;
pub use registry::PoolRegistry;
pub use service::AfterWrite;
pub use service::Progress;
pub use service::Service;
pub use service::SessionKey;
pub use service::WriteProgress;
