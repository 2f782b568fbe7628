use std::cmp;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::ControlFlow;

use bytes::{BufMut, Bytes, BytesMut};

use super::{eq_ignore_case, ArenaError, View};
use crate::ensure;

/// Page size used by session arenas unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 2048;

/// Upper bound for a single page, keeps `next_power_of_two` from overflowing
const MAX_PAGE_SIZE: u32 = 1 << 30;

/// Size of the scratch buffer used when bytes are re-appended from inside the arena
const COPY_CHUNK: usize = 256;

/// A growable, append-oriented byte store made of fixed-size pages.
///
/// The page size is a power of two, so locating offset `o` is `o >> shift` for the page
/// index and `o & mask` inside the page. Growth pushes whole pages at the tail and never
/// reallocates an existing page: once a byte below [`len`](Arena::len) has been written
/// its address stays the same until the page is released by shrinking, [`clear`](Arena::clear)
/// or drop. Pages are always released tail first.
pub struct Arena {
    len: u32,
    shift: u32,
    pages: Vec<Box<[u8]>>,
}

impl Arena {
    /// Creates an empty arena; `page_size` is rounded up to the next power of two.
    ///
    /// No page is allocated until the first write.
    pub fn new(page_size: u32) -> Self {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).next_power_of_two();
        Self::with_shift(page_size.trailing_zeros())
    }

    fn with_shift(shift: u32) -> Self {
        Self { len: 0, shift, pages: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        1 << self.shift
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total bytes held by allocated pages, always a multiple of the page size.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.pages.len() << self.shift
    }

    #[inline]
    fn mask(&self) -> u32 {
        self.page_size() - 1
    }

    #[inline]
    fn locate(&self, offset: u32) -> (usize, usize) {
        ((offset >> self.shift) as usize, (offset & self.mask()) as usize)
    }

    /// Number of pages needed to hold `bytes` bytes.
    #[inline]
    fn pages_for(&self, bytes: u64) -> usize {
        ((bytes + u64::from(self.mask())) >> self.shift) as usize
    }

    /// Contiguous bytes left in the page holding `offset`.
    #[inline]
    pub fn surplus(&self, offset: u32) -> u32 {
        self.page_size() - (offset & self.mask())
    }

    /// Appends one zeroed page at the tail.
    fn expand(&mut self) -> Result<(), ArenaError> {
        let size = self.page_size() as usize;
        self.pages.try_reserve(1).map_err(|e| ArenaError::out_of_memory(size, e))?;

        let mut page = Vec::new();
        page.try_reserve_exact(size).map_err(|e| ArenaError::out_of_memory(size, e))?;
        page.resize(size, 0);

        self.pages.push(page.into_boxed_slice());
        Ok(())
    }

    /// Makes sure every byte below `end` is backed by a page.
    fn reserve_end(&mut self, end: u64) -> Result<(), ArenaError> {
        ensure!(end <= u64::from(u32::MAX), ArenaError::capacity_overflow(end));
        while (self.capacity() as u64) < end {
            self.expand()?;
        }
        Ok(())
    }

    /// Drops pages from the tail, last allocated first, until `keep` remain.
    fn release_tail(&mut self, keep: usize) {
        while self.pages.len() > keep {
            self.pages.pop();
        }
    }

    /// Grows or shrinks the arena so that `len() == new_len`.
    ///
    /// Growing allocates the missing pages. Shrinking releases every tail page that no
    /// longer holds a byte below `new_len`.
    pub fn set_length(&mut self, new_len: u32) -> Result<(), ArenaError> {
        if new_len as usize > self.capacity() {
            self.reserve_end(u64::from(new_len))?;
        } else {
            self.release_tail(self.pages_for(u64::from(new_len)));
        }
        self.len = new_len;
        Ok(())
    }

    /// Grows or shrinks the allocated pages to the smallest page multiple holding
    /// `new_capacity` bytes, truncating the length if it no longer fits.
    pub fn set_capacity(&mut self, new_capacity: usize) -> Result<(), ArenaError> {
        if new_capacity > self.capacity() {
            self.reserve_end(new_capacity as u64)?;
        } else {
            self.release_tail(self.pages_for(new_capacity as u64));
            if self.len as usize > self.capacity() {
                self.len = self.capacity() as u32;
            }
        }
        Ok(())
    }

    /// Moves the length forward to the next page boundary and makes sure that page exists.
    ///
    /// Returns the new length, which is the offset the next append will land on.
    pub fn align_len(&mut self) -> Result<u32, ArenaError> {
        let mask = u64::from(self.mask());
        let aligned = (u64::from(self.len) + mask) & !mask;
        self.reserve_end(aligned + 1)?;
        self.len = aligned as u32;
        Ok(self.len)
    }

    /// Writes `src` starting at `offset`, allocating pages as needed.
    ///
    /// The length grows to cover the written range; bytes already stored elsewhere are
    /// left where they are.
    pub fn write_at(&mut self, offset: u32, src: &[u8]) -> Result<View, ArenaError> {
        let end = u64::from(offset) + src.len() as u64;
        self.reserve_end(end)?;

        let page_size = self.page_size() as usize;
        let mut pos = offset;
        let mut rest = src;
        while !rest.is_empty() {
            let (page, within) = self.locate(pos);
            let n = cmp::min(page_size - within, rest.len());
            self.pages[page][within..within + n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            pos += n as u32;
        }

        self.len = cmp::max(self.len, end as u32);
        Ok(View::new(offset, src.len() as u32))
    }

    /// Copies `src` to the tail and returns the view covering it.
    ///
    /// Views returned earlier stay valid, nothing already stored is moved.
    #[inline]
    pub fn append(&mut self, src: &[u8]) -> Result<View, ArenaError> {
        self.write_at(self.len, src)
    }

    /// Re-appends bytes already stored in this arena, returning the view of the copy.
    pub fn append_from(&mut self, src: View) -> Result<View, ArenaError> {
        let src = self.clamp(src);
        let start = self.len;
        let mut scratch = [0u8; COPY_CHUNK];
        let mut copied = 0;
        while copied < src.len() {
            let n = self.read(src.slice(copied, COPY_CHUNK as u32), &mut scratch);
            if n == 0 {
                break;
            }
            self.append(&scratch[..n])?;
            copied += n as u32;
        }
        Ok(View::new(start, copied))
    }

    /// Returns the writable remainder of the tail page, growing by one page first when
    /// the arena is exactly full.
    ///
    /// This is the buffer handed to the socket for the next read. After the read, call
    /// [`commit`](Arena::commit) with the number of bytes received.
    pub fn last_page_for_write(&mut self) -> Result<&mut [u8], ArenaError> {
        if self.len as usize == self.capacity() {
            self.reserve_end(u64::from(self.len) + 1)?;
        }
        let (page, within) = self.locate(self.len);
        Ok(&mut self.pages[page][within..])
    }

    /// Accounts for `n` bytes written directly into [`last_page_for_write`](Arena::last_page_for_write).
    pub fn commit(&mut self, n: u32) -> Result<View, ArenaError> {
        let end = u64::from(self.len) + u64::from(n);
        ensure!(end <= self.capacity() as u64 && end <= u64::from(u32::MAX), ArenaError::capacity_overflow(end));
        let view = View::new(self.len, n);
        self.len = end as u32;
        Ok(view)
    }

    /// Returns the contiguous bytes from `offset` to the end of its page, bounded by the length.
    pub fn get(&self, offset: u32) -> Option<&[u8]> {
        if offset >= self.len {
            return None;
        }
        let (page, within) = self.locate(offset);
        let n = cmp::min(self.surplus(offset), self.len - offset) as usize;
        Some(&self.pages[page][within..within + n])
    }

    #[inline]
    pub fn byte(&self, offset: u32) -> Option<u8> {
        self.get(offset).map(|chunk| chunk[0])
    }

    /// Restricts `view` to the stored length.
    pub fn clamp(&self, view: View) -> View {
        let start = cmp::min(view.offset(), self.len);
        let end = cmp::min(view.end(), u64::from(self.len)) as u32;
        View::new(start, end - start)
    }

    /// Iterates the bytes of `view` as one slice per page crossed.
    pub fn chunks(&self, view: View) -> Chunks<'_> {
        let view = self.clamp(view);
        Chunks { arena: self, start: view.offset(), end: view.end() as u32 }
    }

    /// Streams `view` page by page into `visit`, stopping as soon as it breaks.
    pub fn for_each<B, F>(&self, view: View, visit: F) -> ControlFlow<B>
    where
        F: FnMut(&[u8]) -> ControlFlow<B>,
    {
        self.chunks(view).try_for_each(visit)
    }

    /// Copies as much of `view` as fits into `dst`, returning the number of bytes copied.
    pub fn read(&self, view: View, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        for chunk in self.chunks(view) {
            let n = cmp::min(chunk.len(), dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&chunk[..n]);
            copied += n;
            if copied == dst.len() {
                break;
            }
        }
        copied
    }

    /// Absolute offset of the first `byte` inside `view`.
    pub fn find_byte(&self, view: View, byte: u8) -> Option<u32> {
        let mut pos = self.clamp(view).offset();
        self.for_each(view, |chunk| match chunk.iter().position(|b| *b == byte) {
            Some(i) => ControlFlow::Break(pos + i as u32),
            None => {
                pos += chunk.len() as u32;
                ControlFlow::Continue(())
            }
        })
        .break_value()
    }

    /// Absolute offset of the last `byte` inside `view`.
    pub fn rfind_byte(&self, view: View, byte: u8) -> Option<u32> {
        let mut end = self.clamp(view).end() as u32;
        self.chunks(view)
            .rev()
            .try_for_each(|chunk| {
                let start = end - chunk.len() as u32;
                match chunk.iter().rposition(|b| *b == byte) {
                    Some(i) => ControlFlow::Break(start + i as u32),
                    None => {
                        end = start;
                        ControlFlow::Continue(())
                    }
                }
            })
            .break_value()
    }

    /// Byte-wise equality of `view` and `expected`, without copying the view out.
    pub fn equal(&self, view: View, expected: &[u8]) -> bool {
        self.compare_with(view, expected, |stored, expected| stored == expected)
    }

    /// Like [`equal`](Arena::equal) but ASCII letters compare case-insensitively.
    pub fn eq_ignore_ascii_case(&self, view: View, expected: &[u8]) -> bool {
        self.compare_with(view, expected, eq_ignore_case)
    }

    fn compare_with(&self, view: View, expected: &[u8], eq: impl Fn(&[u8], &[u8]) -> bool) -> bool {
        if view.len() as usize != expected.len() || view.end() > u64::from(self.len) {
            return false;
        }

        let mut rest = expected;
        self.for_each(view, |chunk| {
            let (head, tail) = rest.split_at(chunk.len());
            rest = tail;
            if eq(chunk, head) { ControlFlow::Continue(()) } else { ControlFlow::Break(()) }
        })
        .is_continue()
    }

    pub fn to_vec(&self, view: View) -> Vec<u8> {
        let mut vec = Vec::with_capacity(self.clamp(view).len() as usize);
        self.chunks(view).for_each(|chunk| vec.extend_from_slice(chunk));
        vec
    }

    pub fn to_bytes(&self, view: View) -> Bytes {
        let mut bytes = BytesMut::with_capacity(self.clamp(view).len() as usize);
        self.chunks(view).for_each(|chunk| bytes.put_slice(chunk));
        bytes.freeze()
    }

    /// Releases every page, tail first, together with the page index.
    ///
    /// The arena keeps its page size and can be written again afterwards.
    pub fn clear(&mut self) {
        self.release_tail(0);
        self.pages = Vec::new();
        self.len = 0;
    }

    /// Deep copy that reports allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Arena, ArenaError> {
        let mut arena = Arena::with_shift(self.shift);
        for chunk in self.chunks(View::new(0, self.len)) {
            arena.append(chunk)?;
        }
        Ok(arena)
    }
}

/// Cloning copies the pages holding live bytes into fresh pages, it never shares them.
impl Clone for Arena {
    fn clone(&self) -> Self {
        let used = self.pages_for(u64::from(self.len));
        Self { len: self.len, shift: self.shift, pages: self.pages[..used].to_vec() }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.release_tail(0);
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("page_size", &self.page_size())
            .finish()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Page-sized slices of an arena range, see [`Arena::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    arena: &'a Arena,
    start: u32,
    end: u32,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.start >= self.end {
            return None;
        }
        let (page, within) = self.arena.locate(self.start);
        let n = cmp::min(self.arena.surplus(self.start), self.end - self.start);
        self.start += n;
        Some(&self.arena.pages[page][within..within + n as usize])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.start >= self.end {
            return (0, Some(0));
        }
        let pages = self.arena.pages_for(u64::from(self.end)) - (self.start >> self.arena.shift) as usize;
        (pages, Some(pages))
    }
}

impl<'a> DoubleEndedIterator for Chunks<'a> {
    fn next_back(&mut self) -> Option<&'a [u8]> {
        if self.start >= self.end {
            return None;
        }
        let last = self.end - 1;
        let (page, within) = self.arena.locate(last);
        let page_start = last - within as u32;
        let begin = cmp::max(page_start, self.start);
        self.end = begin;
        Some(&self.arena.pages[page][(begin - page_start) as usize..=within])
    }
}

impl FusedIterator for Chunks<'_> {}
