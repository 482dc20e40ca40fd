//! Tree element stored in the pool.

use datasource_core::{
    CellValue, Generation, Handle, NodeFlags, NodeId, Value, ValueCell, ValueKind,
};

use crate::names::Symbol;

/// A node of the datasource tree.
///
/// Links are identities into the owning pool; [`NodeId::INVALID`] means "none".
/// Children form a doubly linked list headed by `first_child`, newest first.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub(crate) name: Symbol,
    pub(crate) generation: Generation,
    pub(crate) id: NodeId,
    pub(crate) parent: NodeId,
    pub(crate) first_child: NodeId,
    pub(crate) next_sibling: NodeId,
    pub(crate) prev_sibling: NodeId,
    pub(crate) flags: NodeFlags,
    pub(crate) value: ValueCell,
}

impl Node {
    /// The out-of-band Sink node.
    pub(crate) fn sink() -> Self {
        Self {
            flags: NodeFlags::IS_SINK,
            ..Self::default()
        }
    }

    /// Reset the slot for a fresh allocation, keeping its generation.
    pub(crate) fn reset(&mut self, id: NodeId) {
        let generation = self.generation;
        *self = Self {
            id,
            generation,
            ..Self::default()
        };
    }

    /// Handle to this node under its current generation.
    ///
    /// The Sink's handle is [`Handle::INVALID`].
    pub fn handle(&self) -> Handle {
        Handle::new(self.generation, self.id)
    }

    /// Slot identity, [`NodeId::INVALID`] for free slots and the Sink.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current slot generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Interned name. Resolve it through the pool's name table.
    pub fn name_symbol(&self) -> Symbol {
        self.name
    }

    /// Parent identity, [`NodeId::INVALID`] for Root.
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Head of the child list.
    pub fn first_child(&self) -> NodeId {
        self.first_child
    }

    /// Next sibling in the parent's child list.
    pub fn next_sibling(&self) -> NodeId {
        self.next_sibling
    }

    /// Previous sibling in the parent's child list.
    pub fn prev_sibling(&self) -> NodeId {
        self.prev_sibling
    }

    /// Flag set.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether this is the Sink.
    pub fn is_sink(&self) -> bool {
        self.flags.contains(NodeFlags::IS_SINK)
    }

    /// Whether the node was turned into an array.
    pub fn is_array(&self) -> bool {
        self.flags.contains(NodeFlags::IS_ARRAY)
    }

    /// Whether the node has at least one child.
    pub fn has_children(&self) -> bool {
        self.first_child.is_valid()
    }

    /// The value slot.
    pub fn value(&self) -> &Value {
        self.value.value()
    }

    /// Kind of the stored value.
    pub fn value_kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Read the value as `T`. The Sink always reads as the default.
    pub fn get<T: CellValue>(&self) -> T {
        if self.is_sink() {
            return T::default();
        }
        self.value.get()
    }

    /// Borrow the value as `T` if that is the stored kind.
    pub fn try_get<T: CellValue>(&self) -> Option<&T> {
        if self.is_sink() {
            return None;
        }
        self.value.try_get()
    }
}
