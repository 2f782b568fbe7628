//! Request parsing and response serialization on top of the arena.
//!
//! # Architecture
//!
//! - Request side:
//!   - [`Tokenizer`] / [`H1Tokenizer`]: pull based HTTP/1.x grammar scanner reporting byte
//!     ranges of the slice it was given
//!   - [`RequestParser`]: protocol state machine turning those ranges into arena
//!     [`View`](crate::arena::View)s and deriving the request facts on completion
//!
//! - Response side:
//!   - [`ResponseEncoder`]: formats the head block into the outbound arena
//!   - [`ResponseFrame`]: head and body views, turned into `IoSlice` segments for a
//!     vectored write
//!
//! # Example
//!
//! ```
//! use arena_http::arena::Arena;
//! use arena_http::codec::{ParseState, ParserLimits, RequestParser};
//! use arena_http::pool::Pool;
//! use arena_http::protocol::RequestHead;
//!
//! let mut arena = Arena::new(16);
//! let mut headers = Pool::new(8);
//! let mut head = RequestHead::default();
//! let mut parser = RequestParser::new(ParserLimits::default());
//!
//! let first = arena.append(b"GET /hel").unwrap();
//! assert_eq!(parser.feed(&arena, first, &mut head, &mut headers).unwrap(), ParseState::ParsingUrl);
//!
//! let rest = arena.append(b"lo/ HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
//! assert_eq!(parser.feed(&arena, rest, &mut head, &mut headers).unwrap(), ParseState::Complete);
//! ```

mod request_parser;
mod response_encoder;
mod tokenizer;

pub use request_parser::ParseState;
pub use request_parser::RequestParser;
pub use response_encoder::ResponseEncoder;
pub use response_encoder::ResponseFrame;
pub use tokenizer::H1Tokenizer;
pub use tokenizer::ParserLimits;
pub use tokenizer::RequestLine;
pub use tokenizer::Step;
pub use tokenizer::Token;
pub use tokenizer::Tokenizer;
