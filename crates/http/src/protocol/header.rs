use crate::arena::{Arena, View};
use crate::pool::{Pool, PoolKey};

/// One `field: value` pair, both halves stored as views into the arena of the message
/// the entry belongs to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEntry {
    pub field: View,
    pub value: View,
    next: Option<PoolKey>,
}

/// Singly linked list of [`HeaderEntry`] records living in a [`Pool`].
///
/// The list itself only stores keys; every operation takes the pool the entries were
/// drawn from. A list must be [`flush`](HeaderList::flush)ed back into that pool before
/// it is dropped or reused, otherwise its records stay taken until the pool is dropped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeaderList {
    head: Option<PoolKey>,
    tail: Option<PoolKey>,
    len: u32,
}

impl HeaderList {
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Takes a record from `pool` and links it at the tail.
    pub fn push_back(&mut self, pool: &mut Pool<HeaderEntry>, field: View, value: View) -> PoolKey {
        let key = pool.get();
        pool[key] = HeaderEntry { field, value, next: None };

        match self.tail {
            Some(tail) => pool[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.len += 1;
        key
    }

    /// The entry most recently pushed, the one the parser is still filling.
    pub fn last_mut<'p>(&self, pool: &'p mut Pool<HeaderEntry>) -> Option<&'p mut HeaderEntry> {
        pool.slot_mut(self.tail?)
    }

    pub fn iter<'p>(&self, pool: &'p Pool<HeaderEntry>) -> HeaderIter<'p> {
        HeaderIter { pool, next: self.head, remaining: self.len }
    }

    /// First entry whose field equals `name`, ignoring ASCII case.
    pub fn find<'p>(&self, pool: &'p Pool<HeaderEntry>, arena: &Arena, name: &[u8]) -> Option<&'p HeaderEntry> {
        self.iter(pool).find(|entry| arena.eq_ignore_ascii_case(entry.field, name))
    }

    /// Returns every record to `pool` and leaves the list empty.
    pub fn flush(&mut self, pool: &mut Pool<HeaderEntry>) {
        let mut next = self.head;
        while let Some(key) = next {
            next = pool.slot(key).and_then(|entry| entry.next);
            pool.put(key);
        }
        *self = HeaderList::default();
    }
}

/// Iterator over the entries of a [`HeaderList`], in insertion order.
#[derive(Debug, Clone)]
pub struct HeaderIter<'p> {
    pool: &'p Pool<HeaderEntry>,
    next: Option<PoolKey>,
    remaining: u32,
}

impl<'p> Iterator for HeaderIter<'p> {
    type Item = &'p HeaderEntry;

    fn next(&mut self) -> Option<&'p HeaderEntry> {
        let entry = self.pool.slot(self.next?)?;
        self.next = entry.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}
