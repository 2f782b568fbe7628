use std::ops::Range;

/// A non-owning `(offset, length)` reference into an [`Arena`](super::Arena).
///
/// A view never owns bytes and does not know which arena it came from. It stays
/// meaningful only as long as `offset + len <= arena.len()` holds for the arena it is
/// used with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct View {
    offset: u32,
    len: u32,
}

impl View {
    pub const EMPTY: View = View { offset: 0, len: 0 };

    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    #[inline]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset, computed in `u64` so it can't wrap.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.offset as u64 + self.len as u64
    }

    /// Grows the view by `additional` bytes in place.
    ///
    /// Used when the tokenizer reports more bytes of the token currently being built.
    #[inline]
    pub fn extend(&mut self, additional: u32) {
        self.len += additional;
    }

    /// Splits the view at `mid`, relative to its start. `mid` is clamped to the length.
    #[inline]
    pub fn split_at(self, mid: u32) -> (View, View) {
        let mid = mid.min(self.len);
        (View::new(self.offset, mid), View::new(self.offset + mid, self.len - mid))
    }

    /// Returns the sub view `[start, start + len)`, relative to this view and clamped to it.
    #[inline]
    pub fn slice(self, start: u32, len: u32) -> View {
        let start = start.min(self.len);
        View::new(self.offset + start, len.min(self.len - start))
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset as usize..self.offset as usize + self.len as usize
    }
}

impl From<View> for Range<usize> {
    fn from(view: View) -> Self {
        view.range()
    }
}
