use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{trace, warn};

use super::{PoolKey, Slot};

const WORD_BITS: usize = u64::BITS as usize;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

/// Bitmap backed pool of `T` records with heap fallback.
///
/// Released records are reset to `T::default()`, so whatever they owned is dropped at
/// release time and a record taken from the pool always starts out empty.
pub struct Pool<T> {
    id: u32,
    slots: Box<[T]>,
    /// One bit per slot, `1` means free.
    free: Box<[u64]>,
    /// Every word below `last` is known to be fully taken.
    last: usize,
    overflow: Vec<Option<Box<T>>>,
    vacant: Vec<u32>,
}

impl<T: Default> Pool<T> {
    /// Creates a pool whose storage holds `capacity` records, rounded up to a multiple of 64.
    pub fn new(capacity: usize) -> Self {
        let words = capacity.div_ceil(WORD_BITS);
        let slots = (0..words * WORD_BITS).map(|_| T::default()).collect();

        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            slots,
            free: vec![u64::MAX; words].into_boxed_slice(),
            last: 0,
            overflow: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Takes a free record, falling back to a heap allocation when the storage is full.
    pub fn get(&mut self) -> PoolKey {
        if let Some(key) = self.try_get() {
            return key;
        }

        let index = match self.vacant.pop() {
            Some(index) => {
                self.overflow[index as usize] = Some(Box::default());
                index
            }
            None => {
                self.overflow.push(Some(Box::default()));
                (self.overflow.len() - 1) as u32
            }
        };
        trace!(pool = self.id, index, "pool exhausted, record allocated on the heap");
        PoolKey::new(self.id, Slot::Overflow(index))
    }

    /// Takes a free record from the preallocated storage only.
    pub fn try_get(&mut self) -> Option<PoolKey> {
        for word in self.last..self.free.len() {
            let bits = self.free[word];
            if bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                self.free[word] &= !(1 << bit);
                self.last = word;
                return Some(PoolKey::new(self.id, Slot::Pooled((word * WORD_BITS + bit) as u32)));
            }
        }
        self.last = self.free.len();
        None
    }

    /// Returns a record to the pool, dropping what it holds.
    ///
    /// The key must come from [`get`](Pool::get) on this very pool and must not have
    /// been released already. Debug builds assert this; release builds log and ignore
    /// such keys.
    pub fn put(&mut self, key: PoolKey) {
        debug_assert!(self.owns(key), "released {key:?} into pool {} which does not hold it", self.id);
        if !self.owns(key) {
            warn!(pool = self.id, ?key, "ignored release of a record this pool does not hold");
            return;
        }

        match key.slot() {
            Slot::Pooled(index) => {
                let index = index as usize;
                let word = index / WORD_BITS;
                self.slots[index] = T::default();
                self.free[word] |= 1 << (index % WORD_BITS);
                if word < self.last {
                    self.last = word;
                }
            }
            Slot::Overflow(index) => {
                self.overflow[index as usize] = None;
                self.vacant.push(index);
            }
        }
    }
}

impl<T> Pool<T> {
    /// Whether `key` currently names a live record of this pool.
    pub fn owns(&self, key: PoolKey) -> bool {
        if key.pool_id() != self.id {
            return false;
        }
        match key.slot() {
            Slot::Pooled(index) => {
                let index = index as usize;
                index < self.slots.len() && self.free[index / WORD_BITS] & (1 << (index % WORD_BITS)) == 0
            }
            Slot::Overflow(index) => matches!(self.overflow.get(index as usize), Some(Some(_))),
        }
    }

    pub fn slot(&self, key: PoolKey) -> Option<&T> {
        if !self.owns(key) {
            return None;
        }
        match key.slot() {
            Slot::Pooled(index) => self.slots.get(index as usize),
            Slot::Overflow(index) => self.overflow.get(index as usize)?.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        if !self.owns(key) {
            return None;
        }
        match key.slot() {
            Slot::Pooled(index) => self.slots.get_mut(index as usize),
            Slot::Overflow(index) => self.overflow.get_mut(index as usize)?.as_deref_mut(),
        }
    }

    /// Number of preallocated slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of preallocated slots currently free.
    pub fn free_count(&self) -> usize {
        self.free.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Number of live heap-allocated records.
    #[inline]
    pub fn overflow_len(&self) -> usize {
        self.overflow.len() - self.vacant.len()
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl<T> Index<PoolKey> for Pool<T> {
    type Output = T;

    fn index(&self, key: PoolKey) -> &T {
        match self.slot(key) {
            Some(record) => record,
            None => panic!("{key:?} is not a live record of pool {}", self.id),
        }
    }
}

impl<T> IndexMut<PoolKey> for Pool<T> {
    fn index_mut(&mut self, key: PoolKey) -> &mut T {
        let id = self.id;
        match self.slot_mut(key) {
            Some(record) => record,
            None => panic!("{key:?} is not a live record of pool {id}"),
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("free", &self.free_count())
            .field("overflow", &self.overflow_len())
            .finish()
    }
}
