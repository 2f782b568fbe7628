//! Protocol state machine turning tokenizer output into a [`RequestHead`].
//!
//! The parser walks freshly committed bytes of the inbound arena page by page, hands each
//! page slice to a [`Tokenizer`] and records what it reports as [`View`]s. A token that
//! continues the one seen last (same kind, no other token in between) extends the current
//! view in place; any other token starts a new one. Because views are coordinates rather
//! than pointers, a token split across two socket reads, or across two pages, ends up as
//! one view, exactly as if it had arrived in one piece.
//!
//! On message completion the parser derives the remaining request facts: method and
//! version, the `path`/`param` split of the URL, and the well known headers (`Host`,
//! `Content-Type`, `Content-Length`, `Connection`).

use std::ops::Range;

use http::Version;
use tracing::{enabled, trace, Level};

use crate::arena::{Arena, View};
use crate::codec::{H1Tokenizer, ParserLimits, RequestLine, Token, Tokenizer};
use crate::ensure;
use crate::pool::Pool;
use crate::protocol::{HeaderEntry, ParseError, RequestHead};

/// Longest `Content-Length` value accepted, surrounding whitespace included
const CONTENT_LENGTH_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    #[default]
    Begin,
    ParsingUrl,
    ParsingHeaderField,
    ParsingHeaderValue,
    ParsingBody,
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct RequestParser<T = H1Tokenizer> {
    tokenizer: T,
    state: ParseState,
    line: Option<RequestLine>,
}

impl RequestParser<H1Tokenizer> {
    pub fn new(limits: ParserLimits) -> Self {
        Self::with_tokenizer(H1Tokenizer::new(limits))
    }
}

impl<T: Tokenizer> RequestParser<T> {
    pub fn with_tokenizer(tokenizer: T) -> Self {
        Self { tokenizer, state: ParseState::Begin, line: None }
    }

    #[inline]
    pub fn state(&self) -> ParseState {
        self.state
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// Makes the parser ready for the next request of the connection.
    pub fn reset(&mut self) {
        self.tokenizer.reset();
        self.state = ParseState::Begin;
        self.line = None;
    }

    /// Parses `chunk`, the bytes just committed to `arena`, into `head`.
    ///
    /// Header entries are drawn from `headers`. Returns the state reached after the chunk;
    /// [`ParseState::Complete`] means `head` is fully populated.
    ///
    /// # Errors
    ///
    /// Returns the tokenizer's [`ParseError`] for malformed input, or an invalid
    /// `Content-Length` error when message completion can't read that header.
    pub fn feed(
        &mut self,
        arena: &Arena,
        chunk: View,
        head: &mut RequestHead,
        headers: &mut Pool<HeaderEntry>,
    ) -> Result<ParseState, ParseError> {
        let mut base = arena.clamp(chunk).offset();
        for piece in arena.chunks(chunk) {
            let mut pos = 0;
            loop {
                let step = self.tokenizer.advance(&piece[pos..])?;
                let at = base + pos as u32;
                pos += step.consumed;
                let Some(token) = step.token else { break };
                self.on_token(arena, token, at, head, headers)?;
            }
            base += piece.len() as u32;
        }
        Ok(self.state)
    }

    fn on_token(
        &mut self,
        arena: &Arena,
        token: Token,
        at: u32,
        head: &mut RequestHead,
        headers: &mut Pool<HeaderEntry>,
    ) -> Result<(), ParseError> {
        let view = |range: Range<usize>| View::new(at + range.start as u32, range.len() as u32);

        match token {
            Token::Url(range) => {
                let view = view(range);
                if self.state == ParseState::ParsingUrl {
                    extend(&mut head.url, view);
                } else {
                    head.url = view;
                    self.state = ParseState::ParsingUrl;
                }
            }
            Token::HeaderField(range) => {
                let view = view(range);
                if self.state == ParseState::ParsingHeaderField {
                    if let Some(entry) = head.headers.last_mut(headers) {
                        extend(&mut entry.field, view);
                    }
                } else {
                    head.headers.push_back(headers, view, View::EMPTY);
                    self.state = ParseState::ParsingHeaderField;
                }
            }
            Token::HeaderValue(range) => {
                let view = view(range);
                if let Some(entry) = head.headers.last_mut(headers) {
                    if self.state == ParseState::ParsingHeaderValue {
                        extend_over_gap(&mut entry.value, view);
                    } else {
                        entry.value = view;
                    }
                }
                self.state = ParseState::ParsingHeaderValue;
            }
            Token::HeadersComplete(line) => self.line = Some(line),
            Token::Body(range) => {
                let view = view(range);
                if self.state == ParseState::ParsingBody {
                    extend(&mut head.body, view);
                } else {
                    head.body = view;
                    self.state = ParseState::ParsingBody;
                }
            }
            Token::MessageComplete => {
                self.complete(arena, head, headers)?;
                self.state = ParseState::Complete;
            }
        }
        Ok(())
    }

    fn complete(
        &mut self,
        arena: &Arena,
        head: &mut RequestHead,
        headers: &Pool<HeaderEntry>,
    ) -> Result<(), ParseError> {
        let line = self.line.take().ok_or(ParseError::InvalidMethod)?;
        head.method = line.method;
        head.version = match (line.major, line.minor) {
            (1, 0) => Version::HTTP_10,
            (1, _) => Version::HTTP_11,
            (2, _) => Version::HTTP_2,
            _ => Version::HTTP_10,
        };

        match arena.find_byte(head.url, b'?') {
            Some(at) => {
                let (path, rest) = head.url.split_at(at - head.url.offset());
                head.path = path;
                head.param = rest.slice(1, rest.len());
            }
            None => {
                head.path = head.url;
                head.param = View::EMPTY;
            }
        }

        for entry in head.headers.iter(headers) {
            let (field, value) = (entry.field, entry.value);
            if arena.eq_ignore_ascii_case(field, b"host") {
                head.host.get_or_insert(value);
            } else if arena.eq_ignore_ascii_case(field, b"content-type") {
                head.content_type.get_or_insert(value);
            } else if arena.eq_ignore_ascii_case(field, b"content-length") {
                head.content_length = parse_content_length(arena, value)?;
            } else if arena.eq_ignore_ascii_case(field, b"connection") {
                if arena.eq_ignore_ascii_case(value, b"keep-alive") {
                    head.keep_alive = true;
                } else if arena.eq_ignore_ascii_case(value, b"close") {
                    head.connection_close = true;
                }
            }
        }

        if enabled!(Level::TRACE) {
            trace!(
                method = %head.method,
                version = ?head.version,
                url = %String::from_utf8_lossy(&arena.to_vec(head.url)),
                headers = head.headers.len(),
                body_size = head.body.len(),
                keep_alive = head.is_persistent(),
                "request parsed"
            );
        }
        Ok(())
    }
}

#[inline]
fn extend(view: &mut View, next: View) {
    debug_assert_eq!(view.end(), u64::from(next.offset()), "token continuation must be contiguous");
    view.extend(next.len());
}

/// Extends `view` to the end of `next`, taking in the whitespace the tokenizer held back
/// between two pieces of one header value.
#[inline]
fn extend_over_gap(view: &mut View, next: View) {
    debug_assert!(view.end() <= u64::from(next.offset()), "header value pieces must be in stream order");
    let gap = next.offset() - (view.offset() + view.len());
    view.extend(gap + next.len());
}

/// Reads a decimal `Content-Length` value out of the arena through a stack buffer.
fn parse_content_length(arena: &Arena, value: View) -> Result<u64, ParseError> {
    ensure!(value.len() as usize <= CONTENT_LENGTH_CAP, ParseError::invalid_content_length("value too long"));

    let mut buf = [0u8; CONTENT_LENGTH_CAP];
    let n = arena.read(value, &mut buf);
    let text = std::str::from_utf8(&buf[..n]).map_err(ParseError::invalid_content_length)?;
    text.trim().parse::<u64>().map_err(ParseError::invalid_content_length)
}
