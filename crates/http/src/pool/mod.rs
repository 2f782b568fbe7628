//! Fixed-capacity record pool with a bitmap free list.
//!
//! A [`Pool`] preallocates `capacity` records of one type and hands out [`PoolKey`]s
//! for them. Free slots are tracked with one bit each (`1` = free) in `u64` words, and
//! the scan for a free bit starts at the word where the previous search succeeded, so
//! steady allocate/release traffic stays O(1) amortized.
//!
//! When every slot is taken the pool does not fail: the record is boxed on the heap and
//! tracked on an overflow list until it is released. The key says which of the two
//! places a record lives in, so releasing it never needs address arithmetic.
//!
//! Pools are single-threaded; each service owns its own instances.

mod key;
mod object_pool;

#[cfg(test)]
mod proptests;

pub use key::PoolKey;
pub use key::Slot;
pub use object_pool::Pool;
