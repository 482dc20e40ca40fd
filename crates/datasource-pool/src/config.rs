//! Pool configuration parameters.

use crate::error::PoolError;

/// Configuration for the node pool.
///
/// The pool allocates every slot up front and never grows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Total number of slots, including the header sentinel (slot 0) and
    /// Root (slot 1).
    ///
    /// Default: 2048. Must lie in `MIN_CAPACITY..=MAX_CAPACITY`.
    pub capacity: usize,
}

impl PoolConfig {
    /// Default slot count.
    pub const DEFAULT_CAPACITY: usize = 2048;

    /// Header + Root + at least one allocatable slot.
    pub const MIN_CAPACITY: usize = 3;

    /// Identities are 16-bit, so slot `0xFFFF` is the last addressable one.
    pub const MAX_CAPACITY: usize = u16::MAX as usize + 1;

    /// A config with the given slot count.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Check the capacity bounds.
    pub fn validate(&self) -> Result<(), PoolError> {
        if !(Self::MIN_CAPACITY..=Self::MAX_CAPACITY).contains(&self.capacity) {
            return Err(PoolError::InvalidCapacity {
                requested: self.capacity,
                min: Self::MIN_CAPACITY,
                max: Self::MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}
