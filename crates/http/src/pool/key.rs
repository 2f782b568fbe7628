/// Where a pooled record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Index into the preallocated storage.
    Pooled(u32),
    /// Index into the overflow list, used once the storage was exhausted.
    Overflow(u32),
}

/// Handle to a record obtained from [`Pool::get`](super::Pool::get).
///
/// The key remembers which pool produced it, releasing it into another pool is caught
/// by a debug assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pool: u32,
    slot: Slot,
}

impl PoolKey {
    pub(crate) const fn new(pool: u32, slot: Slot) -> Self {
        Self { pool, slot }
    }

    #[inline]
    pub const fn pool_id(&self) -> u32 {
        self.pool
    }

    #[inline]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    #[inline]
    pub const fn is_overflow(&self) -> bool {
        matches!(self.slot, Slot::Overflow(_))
    }
}
