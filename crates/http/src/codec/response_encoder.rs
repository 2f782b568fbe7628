//! Serialization of a [`ResponseHead`] into scatter/gather write segments.
//!
//! The head block (status line, `Content-Length`, `Connection`, `Content-Type`, the
//! handler's header lines and the blank line) is formatted into the outbound arena,
//! starting on a fresh page. The body is not touched: it already sits in the same arena
//! where the handler wrote it, and the segments handed to the socket point straight at
//! those pages.

use std::fmt;
use std::fmt::Write;
use std::io::IoSlice;

use crate::arena::{Arena, ArenaError, View};
use crate::pool::Pool;
use crate::protocol::{reason_phrase, HeaderEntry, ResponseHead, SendError};

const CRLF: &[u8] = b"\r\n";

/// A serialized response: the head block and the body, both views into the outbound arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseFrame {
    head: View,
    body: View,
}

impl ResponseFrame {
    #[inline]
    pub fn head(&self) -> View {
        self.head
    }

    #[inline]
    pub fn body(&self) -> View {
        self.body
    }

    /// Bytes to put on the wire.
    #[inline]
    pub fn len(&self) -> u64 {
        u64::from(self.head.len()) + u64::from(self.body.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Page slices of the head block followed by the body, skipping the first `written` bytes.
    ///
    /// Every slice borrows arena memory directly; nothing is copied.
    pub fn segments<'a>(&self, arena: &'a Arena, written: u64) -> Vec<IoSlice<'a>> {
        let mut skip = written;
        let mut segments = Vec::new();
        for view in [self.head, self.body] {
            for chunk in arena.chunks(view) {
                let len = chunk.len() as u64;
                if skip >= len {
                    skip -= len;
                    continue;
                }
                segments.push(IoSlice::new(&chunk[skip as usize..]));
                skip = 0;
            }
        }
        segments
    }
}

/// Formats response heads into the outbound arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Appends the head block for `head` to `arena` and returns the frame to write.
    ///
    /// `send_body` is false for responses to `HEAD` requests: `Content-Length` still
    /// announces the body, but the body bytes are left out of the frame.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Arena`] when the arena can't grow.
    pub fn encode(
        &self,
        head: &ResponseHead,
        arena: &mut Arena,
        headers: &Pool<HeaderEntry>,
        send_body: bool,
    ) -> Result<ResponseFrame, SendError> {
        let start = arena.align_len()?;

        let mut writer = FastWrite::new(arena);
        let status = head.status();
        let result = write!(
            writer,
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n",
            status,
            reason_phrase(status),
            head.body().len()
        );
        writer.finish(result)?;

        if head.keep_alive() {
            arena.append(b"Connection: keep-alive\r\n")?;
        }

        if let Some(content_type) = head.content_type {
            arena.append(b"Content-Type: ")?;
            arena.append_from(content_type)?;
            arena.append(CRLF)?;
        }

        for entry in head.headers.iter(headers) {
            arena.append_from(entry.field)?;
            arena.append(b": ")?;
            arena.append_from(entry.value)?;
            arena.append(CRLF)?;
        }
        arena.append(CRLF)?;

        let head_block = View::new(start, arena.len() - start);
        let body = if send_body { head.body() } else { View::EMPTY };
        Ok(ResponseFrame { head: head_block, body })
    }
}

/// `fmt::Write` adapter appending formatted text to an arena.
///
/// `fmt::Error` carries no detail, so the arena error is kept aside and handed back by
/// [`finish`](FastWrite::finish).
struct FastWrite<'a> {
    arena: &'a mut Arena,
    error: Option<ArenaError>,
}

impl<'a> FastWrite<'a> {
    fn new(arena: &'a mut Arena) -> Self {
        Self { arena, error: None }
    }

    fn finish(self, result: fmt::Result) -> Result<(), SendError> {
        match (result, self.error) {
            (_, Some(e)) => Err(e.into()),
            (Ok(()), None) => Ok(()),
            (Err(_), None) => Err(SendError::invalid_body("can't format the status line")),
        }
    }
}

impl Write for FastWrite<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.arena.append(s.as_bytes()) {
            Ok(_) => Ok(()),
            Err(e) => {
                self.error = Some(e);
                Err(fmt::Error)
            }
        }
    }
}
