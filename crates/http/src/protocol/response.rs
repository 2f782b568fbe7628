use http::header::HeaderName;

use crate::arena::{Arena, View};
use crate::ensure;
use crate::pool::Pool;
use crate::protocol::{HeaderEntry, HeaderList, SendError};

/// Response state of one session, filled by the application handler.
///
/// Text parts live in the session's outbound arena.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub(crate) status: u16,
    pub(crate) keep_alive: bool,
    pub(crate) content_type: Option<View>,
    pub(crate) headers: HeaderList,
    pub(crate) body: View,
    /// Start offset of a body opened by `body_begin` and not yet closed.
    pub(crate) open_body: Option<u32>,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self {
            status: 200,
            keep_alive: false,
            content_type: None,
            headers: HeaderList::default(),
            body: View::EMPTY,
            open_body: None,
        }
    }
}

impl ResponseHead {
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    #[inline]
    pub fn body(&self) -> View {
        self.body
    }
}

/// Write access to the response of the request being dispatched.
///
/// Everything written is copied once into the outbound arena. The body is one contiguous
/// range there, written either with [`set_body`](Response::set_body) or with
/// [`body_begin`](Response::body_begin), any number of [`body_append`](Response::body_append)
/// calls and [`body_end`](Response::body_end).
#[derive(Debug)]
pub struct Response<'a> {
    head: &'a mut ResponseHead,
    arena: &'a mut Arena,
    headers: &'a mut Pool<HeaderEntry>,
}

impl<'a> Response<'a> {
    pub(crate) fn new(head: &'a mut ResponseHead, arena: &'a mut Arena, headers: &'a mut Pool<HeaderEntry>) -> Self {
        Self { head, arena, headers }
    }

    /// Sets the status code; codes without a known reason phrase are sent as `Unknown`.
    pub fn set_status(&mut self, status: impl Into<u16>) {
        self.head.status = status.into();
    }

    #[inline]
    pub fn status(&self) -> u16 {
        self.head.status
    }

    /// Overrides whether the connection is kept open after this response.
    ///
    /// Defaults to what the request asked for.
    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.head.keep_alive = keep_alive;
    }

    pub fn set_content_type(&mut self, content_type: &str) -> Result<(), SendError> {
        self.ensure_body_closed()?;
        self.head.content_type = Some(self.arena.append(content_type.as_bytes())?);
        Ok(())
    }

    /// Adds a `field: value` line, both halves copied byte for byte into the outbound arena.
    pub fn add_header(&mut self, field: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<(), SendError> {
        self.ensure_body_closed()?;
        let field = self.arena.append(field.as_ref())?;
        let value = self.arena.append(value.as_ref())?;
        self.head.headers.push_back(self.headers, field, value);
        Ok(())
    }

    /// Same as [`add_header`](Response::add_header) for a typed header name.
    pub fn insert_header(&mut self, name: &HeaderName, value: impl AsRef<[u8]>) -> Result<(), SendError> {
        self.add_header(name.as_str(), value)
    }

    /// Writes the whole body in one call, replacing any body written before.
    pub fn set_body(&mut self, body: impl AsRef<[u8]>) -> Result<(), SendError> {
        self.body_begin()?;
        self.body_append(body)?;
        self.body_end();
        Ok(())
    }

    /// Opens a body at the current end of the outbound arena.
    pub fn body_begin(&mut self) -> Result<(), SendError> {
        ensure!(self.head.open_body.is_none(), SendError::invalid_body("body is already open"));
        self.head.open_body = Some(self.arena.len());
        Ok(())
    }

    /// Appends to the open body, opening one first when needed.
    pub fn body_append(&mut self, bytes: impl AsRef<[u8]>) -> Result<(), SendError> {
        if self.head.open_body.is_none() {
            self.body_begin()?;
        }
        self.arena.append(bytes.as_ref())?;
        Ok(())
    }

    /// Closes the open body, it then covers everything appended since `body_begin`.
    pub fn body_end(&mut self) {
        if let Some(start) = self.head.open_body.take() {
            self.head.body = View::new(start, self.arena.len() - start);
        }
    }

    /// Drops everything written so far and turns the response into an empty one with `status`.
    pub(crate) fn reset_to(&mut self, status: u16) {
        self.head.headers.flush(self.headers);
        self.arena.clear();
        let keep_alive = self.head.keep_alive;
        *self.head = ResponseHead { status, keep_alive, ..ResponseHead::default() };
    }

    fn ensure_body_closed(&self) -> Result<(), SendError> {
        ensure!(
            self.head.open_body.is_none(),
            SendError::invalid_body("headers must be written before the body is opened")
        );
        Ok(())
    }
}

/// Reason phrase sent in the status line for `status`.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[test]
    fn known_and_unknown_reasons() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(405), "Method Not Allowed");
        assert_eq!(reason_phrase(418), "Unknown");
        assert_eq!(reason_phrase(0), "Unknown");
    }

    #[test]
    fn body_accumulates_in_one_range() {
        let mut head = ResponseHead::default();
        let mut arena = Arena::new(4);
        let mut pool = Pool::new(8);
        let mut response = Response::new(&mut head, &mut arena, &mut pool);

        response.set_status(StatusCode::CREATED);
        response.set_content_type("text/plain").unwrap();
        response.body_begin().unwrap();
        response.body_append("Hello").unwrap();
        response.body_append(" World!").unwrap();
        assert!(response.add_header("X-Late", "1").is_err());
        response.body_end();

        assert_eq!(head.status(), 201);
        assert!(arena.equal(head.body(), b"Hello World!"));
        assert!(arena.equal(head.content_type.unwrap(), b"text/plain"));
    }

    #[test]
    fn reset_discards_written_parts() {
        let mut head = ResponseHead { keep_alive: true, ..ResponseHead::default() };
        let mut arena = Arena::new(4);
        let mut pool = Pool::new(8);
        let mut response = Response::new(&mut head, &mut arena, &mut pool);

        response.add_header("Cookie", "Kiven").unwrap();
        response.set_body("partial").unwrap();
        response.reset_to(500);

        assert_eq!(head.status(), 500);
        assert!(head.keep_alive());
        assert!(head.headers.is_empty());
        assert!(head.body().is_empty());
        assert!(arena.is_empty());
        assert_eq!(pool.free_count(), 64);
    }
}
