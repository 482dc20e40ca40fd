//! Node identities, generations and the packed [`Handle`].

use std::fmt;

/// Number of bits the generation is shifted by inside a packed handle.
pub const GENERATION_SHIFT: u32 = 16;

/// Mask selecting the identity bits of a packed handle.
pub const ID_MASK: u32 = 0x0000_FFFF;

/// Largest identity a node can carry.
pub const MAX_NODE_ID: u16 = u16::MAX;

/// Slot index of a node inside the pool.
///
/// Identity `0` is reserved: it is both the "invalid" marker of a free slot
/// and the header sentinel that precedes [`NodeId::ROOT`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u16);

impl NodeId {
    /// Marker of a free slot, and the identity carried by the Sink.
    pub const INVALID: NodeId = NodeId(0);

    /// The permanently allocated Root node.
    pub const ROOT: NodeId = NodeId(1);

    /// Whether this identity can address a node at all.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Slot index in the pool's backing store.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for NodeId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Reuse counter of a pool slot.
///
/// Bumped every time the slot's node is destroyed; a [`Handle`] captured
/// under an older generation no longer resolves. Wraps on overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u16);

impl Generation {
    /// The generation following this one, wrapping at `u16::MAX`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weak, copyable reference to a node: `(generation << 16) | identity`.
///
/// A handle never keeps its node alive. Every resolution compares the
/// generation stored in the handle with the slot's current generation, so a
/// handle to a destroyed node resolves to nothing even after the slot has
/// been recycled. Equality and hashing operate on the packed value.
///
/// The default handle is [`Handle::INVALID`] (packed `0`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct Handle(u32);

impl Handle {
    /// The canonical invalid handle. Also the handle of the Sink.
    pub const INVALID: Handle = Handle(0);

    /// Pack a generation and an identity.
    pub const fn new(generation: Generation, id: NodeId) -> Self {
        Self(((generation.0 as u32) << GENERATION_SHIFT) | id.0 as u32)
    }

    /// Rebuild a handle from its packed representation.
    pub const fn from_packed(packed: u32) -> Self {
        Self(packed)
    }

    /// The packed representation.
    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Identity half of the handle.
    pub const fn id(self) -> NodeId {
        NodeId((self.0 & ID_MASK) as u16)
    }

    /// Generation half of the handle.
    pub const fn generation(self) -> Generation {
        Generation((self.0 >> GENERATION_SHIFT) as u16)
    }

    /// Whether the identity bits are non-zero.
    ///
    /// This is a bit check only. A valid-looking handle may still be stale;
    /// only resolving it through the pool tells.
    pub const fn is_valid(self) -> bool {
        self.0 & ID_MASK != 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(gen={}, id={})", self.generation(), self.id())
    }
}
