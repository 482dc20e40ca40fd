//! Monitor configuration errors.

use std::error::Error;
use std::fmt;

/// Errors raised when building a [`ChangeMonitor`](crate::ChangeMonitor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorError {
    /// The debug log must hold at least one entry.
    ZeroLogCapacity,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLogCapacity => write!(f, "monitor log capacity must be at least 1"),
        }
    }
}

impl Error for MonitorError {}
