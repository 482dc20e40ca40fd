//! Error types for value cell access.

use std::error::Error;
use std::fmt;

use crate::value::ValueKind;

/// Errors from [`ValueCell`](crate::ValueCell) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueError {
    /// The cell already holds a value of another kind.
    ///
    /// A cell is locked to the first kind written into it until cleared.
    TypeMismatch {
        /// The kind the caller asked for.
        expected: ValueKind,
        /// The kind currently stored.
        found: ValueKind,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "value kind mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl Error for ValueError {}
