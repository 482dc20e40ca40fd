//! Change events delivered to subscribers.

use std::fmt;

use crate::id::Handle;

/// Why a subscriber is being notified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChangeEventKind {
    /// The subscriber was just attached and should pull the current value.
    #[default]
    InitialBind,
    /// The node's value changed.
    ValueSet,
}

/// A notification about one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    /// What happened.
    pub kind: ChangeEventKind,
    /// The node it happened to.
    pub handle: Handle,
}

impl ChangeEvent {
    /// Build an event.
    pub fn new(handle: Handle, kind: ChangeEventKind) -> Self {
        Self { kind, handle }
    }

    /// Shorthand for a [`ChangeEventKind::ValueSet`] event.
    pub fn value_set(handle: Handle) -> Self {
        Self::new(handle, ChangeEventKind::ValueSet)
    }

    /// Shorthand for a [`ChangeEventKind::InitialBind`] event.
    pub fn initial_bind(handle: Handle) -> Self {
        Self::new(handle, ChangeEventKind::InitialBind)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.kind, self.handle)
    }
}
