//! Tokio glue between TCP sockets and a [`Service`](crate::session::Service).
//!
//! An [`HttpConnection`] owns one accepted [`TcpStream`](tokio::net::TcpStream) and a
//! session of a service shared by every connection of the same thread. It waits for
//! readiness, lets the socket read straight into the session's inbound arena and writes
//! the response pages with vectored writes. All protocol decisions are left to the
//! service.

mod http_connection;

pub use http_connection::HttpConnection;
