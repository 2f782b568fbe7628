use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("can't allocate arena page of {requested} bytes: {source}")]
    OutOfMemory {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("arena length would exceed the addressable limit, requested end offset {requested}")]
    CapacityOverflow { requested: u64 },
}

impl ArenaError {
    pub fn out_of_memory(requested: usize, source: TryReserveError) -> Self {
        Self::OutOfMemory { requested, source }
    }

    pub fn capacity_overflow(requested: u64) -> Self {
        Self::CapacityOverflow { requested }
    }
}
