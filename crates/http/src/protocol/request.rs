use bytes::Bytes;
use http::{Method, Version};

use crate::arena::{Arena, View};
use crate::pool::Pool;
use crate::protocol::{HeaderEntry, HeaderList};

/// Parsed request state of one session.
///
/// Every textual part is a [`View`] into the session's inbound arena, nothing is copied
/// out while parsing. The fields are filled by the request parser and reset after the
/// response has been written.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub(crate) method: Method,
    pub(crate) version: Version,
    pub(crate) keep_alive: bool,
    pub(crate) connection_close: bool,
    pub(crate) url: View,
    pub(crate) path: View,
    pub(crate) param: View,
    pub(crate) body: View,
    pub(crate) host: Option<View>,
    pub(crate) content_type: Option<View>,
    pub(crate) content_length: u64,
    pub(crate) headers: HeaderList,
}

impl Default for RequestHead {
    fn default() -> Self {
        Self {
            method: Method::GET,
            version: Version::HTTP_10,
            keep_alive: false,
            connection_close: false,
            url: View::EMPTY,
            path: View::EMPTY,
            param: View::EMPTY,
            body: View::EMPTY,
            host: None,
            content_type: None,
            content_length: 0,
            headers: HeaderList::default(),
        }
    }
}

impl RequestHead {
    /// Whether the connection should stay open after the response.
    ///
    /// True when the client sent `Connection: keep-alive`, or spoke HTTP/1.1 without
    /// asking for `Connection: close`.
    pub fn is_persistent(&self) -> bool {
        self.keep_alive || (self.version == Version::HTTP_11 && !self.connection_close)
    }
}

/// Read-only access to a completed request, handed to the application handler.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    head: &'a RequestHead,
    arena: &'a Arena,
    headers: &'a Pool<HeaderEntry>,
}

impl<'a> Request<'a> {
    pub(crate) fn new(head: &'a RequestHead, arena: &'a Arena, headers: &'a Pool<HeaderEntry>) -> Self {
        Self { head, arena, headers }
    }

    #[inline]
    pub fn method(&self) -> &'a Method {
        &self.head.method
    }

    #[inline]
    pub fn method_str(&self) -> &'a str {
        self.head.method.as_str()
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.head.version
    }

    /// The client sent `Connection: keep-alive`.
    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.head.keep_alive
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.head.is_persistent()
    }

    /// Full request target, path and query.
    #[inline]
    pub fn url(&self) -> View {
        self.head.url
    }

    /// Request target up to, not including, the first `?`.
    #[inline]
    pub fn path(&self) -> View {
        self.head.path
    }

    /// Request target after the first `?`, empty when there is none.
    #[inline]
    pub fn param(&self) -> View {
        self.head.param
    }

    #[inline]
    pub fn body(&self) -> View {
        self.head.body
    }

    #[inline]
    pub fn host(&self) -> Option<View> {
        self.head.host
    }

    #[inline]
    pub fn content_type(&self) -> Option<View> {
        self.head.content_type
    }

    #[inline]
    pub fn content_length(&self) -> u64 {
        self.head.content_length
    }

    /// The arena every view of this request points into.
    #[inline]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Value of the first header named `name`, compared without regard to ASCII case.
    pub fn header(&self, name: &str) -> Option<View> {
        self.head.headers.find(self.headers, self.arena, name.as_bytes()).map(|entry| entry.value)
    }

    /// All headers as `(field, value)` views, in the order they were received.
    pub fn headers(&self) -> impl Iterator<Item = (View, View)> + 'a {
        self.head.headers.iter(self.headers).map(|entry| (entry.field, entry.value))
    }

    #[inline]
    pub fn header_count(&self) -> usize {
        self.head.headers.len()
    }

    /// Compares the request path with `literal`.
    ///
    /// A trailing `/` on `literal` is optional, and the literal matches when the path equals
    /// it or continues with `/` or `?`. So `/x` matches `/x`, `/x/`, `/x?q=1` and `/x/y`,
    /// but not `/x1`.
    pub fn path_matches(&self, literal: &str) -> bool {
        path_matches(self.arena, self.head.path, literal.as_bytes())
    }

    pub fn to_vec(&self, view: View) -> Vec<u8> {
        self.arena.to_vec(view)
    }

    pub fn to_bytes(&self, view: View) -> Bytes {
        self.arena.to_bytes(view)
    }

    /// Lossy UTF-8 rendering of `view`, meant for logs and diagnostics.
    pub fn text(&self, view: View) -> String {
        String::from_utf8_lossy(&self.arena.to_vec(view)).into_owned()
    }
}

fn path_matches(arena: &Arena, path: View, literal: &[u8]) -> bool {
    let literal = literal.strip_suffix(b"/").unwrap_or(literal);
    let Ok(len) = u32::try_from(literal.len()) else {
        return false;
    };
    if len > path.len() {
        return false;
    }

    let (head, rest) = path.split_at(len);
    if !arena.equal(head, literal) {
        return false;
    }
    rest.is_empty() || matches!(arena.byte(rest.offset()), Some(b'/' | b'?'))
}
