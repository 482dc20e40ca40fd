//! Pool-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during pool operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is in use.
    PoolFull {
        /// Total slot count of the pool.
        capacity: usize,
    },
    /// The configured capacity is outside the supported range.
    InvalidCapacity {
        /// The configured slot count.
        requested: usize,
        /// Smallest accepted slot count.
        min: usize,
        /// Largest accepted slot count.
        max: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolFull { capacity } => {
                write!(
                    f,
                    "no more room to allocate a datasource: all {capacity} slots in use"
                )
            }
            Self::InvalidCapacity {
                requested,
                min,
                max,
            } => {
                write!(
                    f,
                    "pool capacity {requested} out of range, expected {min}..={max}"
                )
            }
        }
    }
}

impl Error for PoolError {}
