//! Server runtime and demo application for `arena-http`.
//!
//! - [`server`]: [`Server`](server::Server) and its builder, the accept loop on a
//!   single threaded runtime
//! - [`routes`]: the demo handler
//! - [`config`]: TOML file and command line settings
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod logging;
pub mod routes;
pub mod server;

pub use server::Server;
pub use server::ServerBuilder;
pub use server::ServerError;
