//! Byte level HTTP/1.x request scanner.
//!
//! The tokenizer knows the request grammar but nothing about where bytes are stored. It is
//! fed arbitrary slices and reports, one [`Step`] at a time, which range of the slice it
//! just recognized as part of the URL, a header field, a header value or the body. A token
//! that is split across two slices is reported twice, once per slice, and the caller glues
//! the pieces together. Metadata that is not a byte range (method, version, content
//! length) is reported once with [`Token::HeadersComplete`].
//!
//! # Limits
//!
//! - Header section size and header count are bounded by [`ParserLimits`]
//! - Bodies are framed by `Content-Length` only; any `Transfer-Encoding` is rejected
//! - Once a message is complete only stray CR/LF bytes are accepted, anything else is
//!   a second request on the same connection and fails with [`ParseError::Pipelined`]

use std::cmp;
use std::ops::Range;

use http::Method;
use tracing::trace;

use crate::config::{MAX_BODY_BYTES, MAX_HEADER_BYTES, MAX_HEADER_NUM};
use crate::ensure;
use crate::protocol::ParseError;

/// Longest accepted method token
const METHOD_CAP: usize = 16;

/// Header names longer than this are never one of the names the tokenizer looks at
const NAME_CAP: usize = 32;

const HTTP_PREFIX: &[u8] = b"HTTP/";

/// Size limits enforced while scanning a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    pub max_header_bytes: usize,
    pub max_headers: usize,
    pub max_body_bytes: u64,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self { max_header_bytes: MAX_HEADER_BYTES, max_headers: MAX_HEADER_NUM, max_body_bytes: MAX_BODY_BYTES }
    }
}

/// Request line facts reported once the header section is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub major: u8,
    pub minor: u8,
    pub content_length: u64,
}

/// What the tokenizer recognized. Ranges are relative to the slice passed to `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Url(Range<usize>),
    HeaderField(Range<usize>),
    /// Every header line yields at least one value token, an empty value an empty range.
    ///
    /// Surrounding whitespace is never part of a value token. When a value is split across
    /// slices, whitespace at the end of one slice is only reported implicitly: the next
    /// value token of the same line starts after it, so the value runs from the start of
    /// its first token to the end of its last one in stream order.
    HeaderValue(Range<usize>),
    HeadersComplete(RequestLine),
    Body(Range<usize>),
    MessageComplete,
}

/// Result of one [`Tokenizer::advance`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Bytes of the input that are done with, the next call starts after them
    pub consumed: usize,
    /// `None` means the whole input was consumed and more bytes are needed
    pub token: Option<Token>,
}

impl Step {
    #[inline]
    fn token(consumed: usize, token: Token) -> Self {
        Self { consumed, token: Some(token) }
    }

    #[inline]
    fn exhausted(consumed: usize) -> Self {
        Self { consumed, token: None }
    }
}

/// A pull based request scanner.
pub trait Tokenizer {
    /// Scans `input` up to the next token.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the bytes can't be part of a valid request or a
    /// limit is exceeded. The tokenizer is unusable afterwards until [`reset`](Tokenizer::reset).
    fn advance(&mut self, input: &[u8]) -> Result<Step, ParseError>;

    /// Forgets everything and waits for a new request.
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Method,
    BeforeUrl,
    Url,
    Version(u8),
    Major,
    Dot,
    Minor,
    RequestLineEnd,
    RequestLineLf,
    FieldStart,
    Field,
    ValueStart,
    Value,
    ValueLf,
    HeadersLf,
    Body(u64),
    MessageEnd,
    Done,
}

impl State {
    fn in_head(self) -> bool {
        !matches!(self, State::Body(_) | State::MessageEnd | State::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Other,
    ContentLength,
    TransferEncoding,
}

/// HTTP/1.0 and HTTP/1.1 request tokenizer.
#[derive(Debug, Clone)]
pub struct H1Tokenizer {
    limits: ParserLimits,
    state: State,
    head_bytes: usize,
    header_count: usize,

    method_buf: [u8; METHOD_CAP],
    method_len: usize,
    method: Option<Method>,
    major: u8,
    minor: u8,

    name: [u8; NAME_CAP],
    name_len: usize,
    field: Field,
    value_seen: bool,

    pending_length: Option<u64>,
    length_trailing: bool,
    content_length: Option<u64>,
    transfer_encoding: bool,
}

impl Default for H1Tokenizer {
    fn default() -> Self {
        Self::new(ParserLimits::default())
    }
}

impl H1Tokenizer {
    pub fn new(limits: ParserLimits) -> Self {
        Self {
            limits,
            state: State::Start,
            head_bytes: 0,
            header_count: 0,
            method_buf: [0; METHOD_CAP],
            method_len: 0,
            method: None,
            major: 0,
            minor: 0,
            name: [0; NAME_CAP],
            name_len: 0,
            field: Field::Other,
            value_seen: false,
            pending_length: None,
            length_trailing: false,
            content_length: None,
            transfer_encoding: false,
        }
    }

    pub fn limits(&self) -> ParserLimits {
        self.limits
    }

    /// Whether a complete message has been reported.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    fn step(&mut self, input: &[u8]) -> Result<Step, ParseError> {
        if self.state == State::MessageEnd {
            self.state = State::Done;
            return Ok(Step::token(0, Token::MessageComplete));
        }

        let mut i = 0;
        while i < input.len() {
            let b = input[i];
            match self.state {
                State::Start => {
                    if b == b'\r' || b == b'\n' {
                        i += 1;
                    } else {
                        self.state = State::Method;
                    }
                }
                State::Method => {
                    if b == b' ' {
                        ensure!(self.method_len > 0, ParseError::InvalidMethod);
                        let method = Method::from_bytes(&self.method_buf[..self.method_len])
                            .map_err(|_| ParseError::InvalidMethod)?;
                        self.method = Some(method);
                        self.state = State::BeforeUrl;
                    } else {
                        ensure!(is_token(b) && self.method_len < METHOD_CAP, ParseError::InvalidMethod);
                        self.method_buf[self.method_len] = b;
                        self.method_len += 1;
                    }
                    i += 1;
                }
                State::BeforeUrl => {
                    ensure!(is_url_byte(b), ParseError::InvalidUri);
                    self.state = State::Url;
                }
                State::Url => {
                    let end = scan(input, i, is_url_byte);
                    if end > i {
                        return Ok(Step::token(end, Token::Url(i..end)));
                    }
                    ensure!(b == b' ', ParseError::InvalidUri);
                    self.state = State::Version(0);
                    i += 1;
                }
                State::Version(matched) => {
                    ensure!(b == HTTP_PREFIX[matched as usize], ParseError::InvalidVersion(None));
                    let matched = matched + 1;
                    self.state =
                        if matched as usize == HTTP_PREFIX.len() { State::Major } else { State::Version(matched) };
                    i += 1;
                }
                State::Major => {
                    ensure!(b.is_ascii_digit(), ParseError::InvalidVersion(None));
                    self.major = b - b'0';
                    self.state = State::Dot;
                    i += 1;
                }
                State::Dot => {
                    ensure!(b == b'.', ParseError::InvalidVersion(Some(self.major)));
                    self.state = State::Minor;
                    i += 1;
                }
                State::Minor => {
                    ensure!(b.is_ascii_digit(), ParseError::InvalidVersion(Some(self.major)));
                    self.minor = b - b'0';
                    self.state = State::RequestLineEnd;
                    i += 1;
                }
                State::RequestLineEnd => {
                    self.state = match b {
                        b'\r' => State::RequestLineLf,
                        b'\n' => State::FieldStart,
                        _ => return Err(ParseError::InvalidVersion(Some(self.major))),
                    };
                    i += 1;
                }
                State::RequestLineLf => {
                    ensure!(b == b'\n', ParseError::invalid_header("expected LF after the request line"));
                    self.state = State::FieldStart;
                    i += 1;
                }
                State::FieldStart => match b {
                    b'\r' => {
                        self.state = State::HeadersLf;
                        i += 1;
                    }
                    b'\n' => return self.headers_complete(i + 1),
                    b' ' | b'\t' => return Err(ParseError::invalid_header("obsolete line folding")),
                    _ if is_token(b) => {
                        self.header_count += 1;
                        ensure!(
                            self.header_count <= self.limits.max_headers,
                            ParseError::too_many_headers(self.limits.max_headers)
                        );
                        self.name_len = 0;
                        self.value_seen = false;
                        self.state = State::Field;
                    }
                    _ => return Err(ParseError::invalid_header("invalid header name")),
                },
                State::Field => {
                    let end = scan(input, i, is_token);
                    if end > i {
                        self.remember_name(&input[i..end]);
                        return Ok(Step::token(end, Token::HeaderField(i..end)));
                    }
                    ensure!(b == b':', ParseError::invalid_header("invalid header name"));
                    self.field = self.classify_name();
                    self.state = State::ValueStart;
                    i += 1;
                }
                State::ValueStart => match b {
                    b' ' | b'\t' => i += 1,
                    b'\r' | b'\n' if !self.value_seen => {
                        self.value_seen = true;
                        return Ok(Step::token(i, Token::HeaderValue(i..i)));
                    }
                    _ => self.state = State::Value,
                },
                State::Value => {
                    let end = scan(input, i, is_value_byte);
                    if end > i {
                        if self.field == Field::ContentLength {
                            self.content_length_bytes(&input[i..end])?;
                        }
                        // trailing SP/HTAB are held back until a later byte makes them interior
                        match input[i..end].iter().rposition(|b| !is_ows(*b)) {
                            Some(last) => {
                                self.value_seen = true;
                                return Ok(Step::token(end, Token::HeaderValue(i..i + last + 1)));
                            }
                            None => {
                                i = end;
                                continue;
                            }
                        }
                    }
                    match b {
                        b'\r' => self.state = State::ValueLf,
                        b'\n' => self.end_header_line()?,
                        _ => return Err(ParseError::invalid_header("invalid byte in header value")),
                    }
                    i += 1;
                }
                State::ValueLf => {
                    ensure!(b == b'\n', ParseError::invalid_header("expected LF after a header value"));
                    self.end_header_line()?;
                    i += 1;
                }
                State::HeadersLf => {
                    ensure!(b == b'\n', ParseError::invalid_header("expected LF after the header section"));
                    return self.headers_complete(i + 1);
                }
                State::Body(remaining) => {
                    let n = cmp::min(remaining, (input.len() - i) as u64);
                    let left = remaining - n;
                    self.state = if left == 0 { State::MessageEnd } else { State::Body(left) };
                    let end = i + n as usize;
                    return Ok(Step::token(end, Token::Body(i..end)));
                }
                State::MessageEnd => {
                    self.state = State::Done;
                    return Ok(Step::token(i, Token::MessageComplete));
                }
                State::Done => {
                    ensure!(b == b'\r' || b == b'\n', ParseError::Pipelined);
                    i += 1;
                }
            }
        }

        Ok(Step::exhausted(input.len()))
    }

    fn remember_name(&mut self, bytes: &[u8]) {
        for b in bytes {
            if self.name_len < NAME_CAP {
                self.name[self.name_len] = b.to_ascii_lowercase();
            }
            self.name_len += 1;
        }
    }

    fn classify_name(&self) -> Field {
        if self.name_len > NAME_CAP {
            return Field::Other;
        }
        match &self.name[..self.name_len] {
            b"content-length" => Field::ContentLength,
            b"transfer-encoding" => Field::TransferEncoding,
            _ => Field::Other,
        }
    }

    fn content_length_bytes(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        for &b in bytes {
            if b.is_ascii_digit() && !self.length_trailing {
                let value = self
                    .pending_length
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|value| value.checked_add(u64::from(b - b'0')))
                    .ok_or_else(|| ParseError::invalid_content_length("value overflows"))?;
                self.pending_length = Some(value);
            } else if (b == b' ' || b == b'\t') && self.pending_length.is_some() {
                self.length_trailing = true;
            } else {
                return Err(ParseError::invalid_content_length("not a decimal number"));
            }
        }
        Ok(())
    }

    fn end_header_line(&mut self) -> Result<(), ParseError> {
        match self.field {
            Field::ContentLength => {
                let value =
                    self.pending_length.take().ok_or_else(|| ParseError::invalid_content_length("empty value"))?;
                if let Some(seen) = self.content_length {
                    ensure!(seen == value, ParseError::invalid_content_length("conflicting values"));
                }
                self.content_length = Some(value);
            }
            Field::TransferEncoding => self.transfer_encoding = true,
            Field::Other => {}
        }
        self.length_trailing = false;
        self.field = Field::Other;
        self.state = State::FieldStart;
        Ok(())
    }

    fn headers_complete(&mut self, consumed: usize) -> Result<Step, ParseError> {
        ensure!(!self.transfer_encoding, ParseError::UnsupportedTransferEncoding);

        let content_length = self.content_length.unwrap_or(0);
        ensure!(
            content_length <= self.limits.max_body_bytes,
            ParseError::too_large_body(content_length, self.limits.max_body_bytes)
        );

        let method = self.method.take().ok_or(ParseError::InvalidMethod)?;
        trace!(method = %method, headers = self.header_count, content_length, "header section complete");

        self.state = if content_length == 0 { State::MessageEnd } else { State::Body(content_length) };
        let line = RequestLine { method, major: self.major, minor: self.minor, content_length };
        Ok(Step::token(consumed, Token::HeadersComplete(line)))
    }
}

impl Tokenizer for H1Tokenizer {
    fn advance(&mut self, input: &[u8]) -> Result<Step, ParseError> {
        let in_head = self.state.in_head();
        let step = self.step(input)?;
        if in_head {
            self.head_bytes += step.consumed;
            ensure!(
                self.head_bytes <= self.limits.max_header_bytes,
                ParseError::too_large_header(self.head_bytes, self.limits.max_header_bytes)
            );
        }
        Ok(step)
    }

    fn reset(&mut self) {
        *self = H1Tokenizer::new(self.limits);
    }
}

/// End of the run of bytes starting at `from` that satisfy `accept`.
#[inline]
fn scan(input: &[u8], from: usize, accept: fn(u8) -> bool) -> usize {
    input[from..].iter().position(|b| !accept(*b)).map_or(input.len(), |p| from + p)
}

#[inline]
fn is_token(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[inline]
fn is_url_byte(b: u8) -> bool {
    b > b' ' && b != 0x7f
}

#[inline]
fn is_value_byte(b: u8) -> bool {
    b == b'\t' || (b >= b' ' && b != 0x7f)
}

#[inline]
fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    /// Tokens glued back together, the way a caller accumulates them.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct Collected {
        url: Vec<u8>,
        headers: Vec<(Vec<u8>, Vec<u8>)>,
        line: Option<RequestLine>,
        body: Vec<u8>,
        complete: bool,
    }

    fn collect(tokenizer: &mut H1Tokenizer, input: &[u8], chunk: usize) -> Result<Collected, ParseError> {
        let mut out = Collected::default();
        let mut values: Vec<Option<Range<usize>>> = Vec::new();
        let mut last_field = false;
        let mut offset = 0;

        for piece in input.chunks(chunk.max(1)).chain(std::iter::once(&[][..])) {
            let mut pos = 0;
            loop {
                let step = tokenizer.advance(&piece[pos..])?;
                let base = pos;
                pos += step.consumed;
                let Some(token) = step.token else { break };
                match token {
                    Token::Url(r) => out.url.extend_from_slice(&piece[base + r.start..base + r.end]),
                    Token::HeaderField(r) => {
                        if !last_field {
                            out.headers.push((Vec::new(), Vec::new()));
                            values.push(None);
                        }
                        last_field = true;
                        out.headers.last_mut().unwrap().0.extend_from_slice(&piece[base + r.start..base + r.end]);
                    }
                    Token::HeaderValue(r) => {
                        last_field = false;
                        let (start, end) = (offset + base + r.start, offset + base + r.end);
                        let span = values.last_mut().unwrap();
                        *span = Some(span.as_ref().map_or(start, |s| s.start)..end);
                    }
                    Token::HeadersComplete(line) => out.line = Some(line),
                    Token::Body(r) => out.body.extend_from_slice(&piece[base + r.start..base + r.end]),
                    Token::MessageComplete => out.complete = true,
                }
            }
            offset += piece.len();
        }

        for ((_, value), span) in out.headers.iter_mut().zip(values) {
            *value = input[span.unwrap()].to_vec();
        }
        Ok(out)
    }

    fn crlf(text: &str) -> Vec<u8> {
        text.replace('\n', "\r\n").into_bytes()
    }

    #[test]
    fn same_tokens_for_every_split() {
        let request = crlf(indoc! {r##"
        POST /submit?id=7 HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Content-Type: application/json
        X-Empty:
        Content-Length: 13

        {"key":"v1"}
        "##});

        let whole = collect(&mut H1Tokenizer::default(), &request, request.len()).unwrap();
        assert_eq!(whole.url, b"/submit?id=7");
        assert_eq!(whole.headers.len(), 5);
        assert_eq!(whole.headers[3], (b"X-Empty".to_vec(), Vec::new()));
        assert_eq!(whole.body, b"{\"key\":\"v1\"}\r");
        assert!(whole.complete);

        let line = whole.line.as_ref().unwrap();
        assert_eq!(line.method, Method::POST);
        assert_eq!((line.major, line.minor), (1, 1));
        assert_eq!(line.content_length, 13);

        for chunk in 1..request.len() {
            let split = collect(&mut H1Tokenizer::default(), &request, chunk).unwrap();
            assert_eq!(split, whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn agrees_with_httparse() {
        let request = crlf(indoc! {r##"
        GET /index.html?a=1&b=%20 HTTP/1.1
        Host: example.com
        Accept: text/html,application/xhtml+xml
        Cookie: a=b; c=d
        Connection: keep-alive

        "##});

        let mut headers = [httparse::EMPTY_HEADER; 16];
        let mut oracle = httparse::Request::new(&mut headers);
        let status = oracle.parse(&request).unwrap();
        assert!(status.is_complete());

        let ours = collect(&mut H1Tokenizer::default(), &request, 7).unwrap();
        assert_eq!(ours.url, oracle.path.unwrap().as_bytes());
        assert_eq!(ours.line.as_ref().unwrap().method.as_str(), oracle.method.unwrap());
        assert_eq!(ours.line.as_ref().unwrap().minor, oracle.version.unwrap());
        assert_eq!(ours.headers.len(), oracle.headers.len());
        for ((name, value), expected) in ours.headers.iter().zip(oracle.headers.iter()) {
            assert_eq!(name, expected.name.as_bytes());
            assert_eq!(value, expected.value);
        }
        assert!(ours.complete);
    }

    #[test]
    fn padded_values_agree_with_httparse_for_every_split() {
        let request = b"GET / HTTP/1.0\r\n\
            Connection: keep-alive \r\n\
            Content-Type: text/plain \t \r\n\
            Host:\th\t\r\n\
            Accept:  a \t b  \r\n\
            X-Blank: \t \r\n\r\n";

        let mut headers = [httparse::EMPTY_HEADER; 16];
        let mut oracle = httparse::Request::new(&mut headers);
        assert!(oracle.parse(request).unwrap().is_complete());
        let expected: Vec<(Vec<u8>, Vec<u8>)> =
            oracle.headers.iter().map(|h| (h.name.as_bytes().to_vec(), h.value.to_vec())).collect();
        assert_eq!(expected[3].1, b"a \t b");
        assert_eq!(expected[4].1, b"");

        for chunk in 1..=request.len() {
            let ours = collect(&mut H1Tokenizer::default(), request, chunk).unwrap();
            assert_eq!(ours.headers, expected, "chunk size {chunk}");
            assert!(ours.complete);
        }
    }

    #[test]
    fn value_tokens_leave_out_trailing_whitespace() {
        let mut tokenizer = H1Tokenizer::default();
        let input = b"GET / HTTP/1.1\r\nHost: a b  ";
        let mut pos = 0;
        let mut values = Vec::new();
        loop {
            let step = tokenizer.advance(&input[pos..]).unwrap();
            let base = pos;
            pos += step.consumed;
            match step.token {
                Some(Token::HeaderValue(r)) => values.push(base + r.start..base + r.end),
                Some(_) => {}
                None => break,
            }
        }
        assert_eq!(pos, input.len());
        assert_eq!(values, vec![22..25]);

        let step = tokenizer.advance(b" c\r\n").unwrap();
        assert_eq!(step.token, Some(Token::HeaderValue(1..2)));
    }

    #[test]
    fn bare_lf_and_leading_empty_lines() {
        let request = b"\r\n\nGET / HTTP/1.0\nHost: h\n\n";
        let out = collect(&mut H1Tokenizer::default(), request, 3).unwrap();
        assert_eq!(out.url, b"/");
        assert_eq!(out.headers, vec![(b"Host".to_vec(), b"h".to_vec())]);
        assert_eq!(out.line.unwrap().minor, 0);
        assert!(out.complete);
    }

    #[test]
    fn rejects_malformed_request_lines() {
        let cases: [(&[u8], fn(&ParseError) -> bool); 5] = [
            (b"G(T / HTTP/1.1\r\n\r\n", |e| matches!(e, ParseError::InvalidMethod)),
            (b"GET  HTTP/1.1\r\n\r\n", |e| matches!(e, ParseError::InvalidUri)),
            (b"GET / HTTX/1.1\r\n\r\n", |e| matches!(e, ParseError::InvalidVersion(None))),
            (b"GET / HTTP/1-1\r\n\r\n", |e| matches!(e, ParseError::InvalidVersion(Some(1)))),
            (b"GET / HTTP/1.1\r\n continued\r\n\r\n", |e| matches!(e, ParseError::InvalidHeader { .. })),
        ];

        for (request, expected) in cases {
            let err = collect(&mut H1Tokenizer::default(), request, request.len()).unwrap_err();
            assert!(expected(&err), "{} gave {err:?}", String::from_utf8_lossy(request));
        }
    }

    #[test]
    fn content_length_validation() {
        let bad = b"POST / HTTP/1.1\r\nContent-Length: 1x\r\n\r\n";
        assert!(matches!(collect(&mut H1Tokenizer::default(), bad, 64), Err(ParseError::InvalidContentLength { .. })));

        let conflicting = b"POST / HTTP/1.1\r\nContent-Length: 1\r\ncontent-length: 2\r\n\r\nab";
        assert!(matches!(
            collect(&mut H1Tokenizer::default(), conflicting, 64),
            Err(ParseError::InvalidContentLength { .. })
        ));

        let padded = b"POST / HTTP/1.1\r\nContent-Length:  2 \r\n\r\nab";
        let out = collect(&mut H1Tokenizer::default(), padded, 64).unwrap();
        assert_eq!(out.body, b"ab");

        let limits = ParserLimits { max_body_bytes: 4, ..ParserLimits::default() };
        let large = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nabcde";
        assert!(matches!(collect(&mut H1Tokenizer::new(limits), large, 64), Err(ParseError::TooLargeBody { .. })));
    }

    #[test]
    fn transfer_encoding_is_rejected() {
        let request = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n";
        let err = collect(&mut H1Tokenizer::default(), request, 64).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedTransferEncoding));
    }

    #[test]
    fn header_limits() {
        let limits = ParserLimits { max_headers: 2, ..ParserLimits::default() };
        let request = b"GET / HTTP/1.1\r\na: 1\r\nb: 2\r\nc: 3\r\n\r\n";
        let err = collect(&mut H1Tokenizer::new(limits), request, 64).unwrap_err();
        assert!(matches!(err, ParseError::TooManyHeaders { max_num: 2 }));

        let limits = ParserLimits { max_header_bytes: 32, ..ParserLimits::default() };
        let request = b"GET /a/very/long/path/that/does/not/fit HTTP/1.1\r\n\r\n";
        let err = collect(&mut H1Tokenizer::new(limits), request, 5).unwrap_err();
        assert!(matches!(err, ParseError::TooLargeHeader { max_size: 32, .. }));
    }

    #[test]
    fn second_request_is_pipelining() {
        let request = b"GET /a HTTP/1.1\r\n\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
        let err = collect(&mut H1Tokenizer::default(), request, 64).unwrap_err();
        assert!(matches!(err, ParseError::Pipelined));

        let mut tokenizer = H1Tokenizer::default();
        let out = collect(&mut tokenizer, b"GET /a HTTP/1.1\r\n\r\n\r\n", 64).unwrap();
        assert!(out.complete);
        assert!(tokenizer.is_done());

        tokenizer.reset();
        let out = collect(&mut tokenizer, b"GET /b HTTP/1.1\r\n\r\n", 64).unwrap();
        assert_eq!(out.url, b"/b");
    }
}
