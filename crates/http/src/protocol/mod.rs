//! Request and response state shared by the parser, the handler and the writer.
//!
//! Nothing in here owns message bytes. Requests are described by [`View`](crate::arena::View)s
//! into the inbound arena of a session, responses by views into its outbound arena, and
//! header lines are [`HeaderEntry`] records drawn from a [`Pool`](crate::pool::Pool).
//!
//! - [`RequestHead`] / [`Request`]: the parsed request and the read-only handle the
//!   application handler receives
//! - [`ResponseHead`] / [`Response`]: the response state and the write handle filled by
//!   the handler
//! - [`HeaderList`]: pool backed list of header lines
//! - [`HttpError`], [`ParseError`], [`SendError`]: the error types of the pipeline

mod header;
pub use header::HeaderEntry;
pub use header::HeaderIter;
pub use header::HeaderList;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::reason_phrase;
pub use response::Response;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
