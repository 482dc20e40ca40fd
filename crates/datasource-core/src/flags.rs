//! Per-node flag set.

use bitflags::bitflags;

bitflags! {
    /// Behavioural flags carried by every node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node absorbs every operation: path lookups return it, value
        /// writes are dropped and reads return defaults.
        const IS_SINK = 1 << 0;
        /// The node's value holds a child count and its children are named
        /// `Item#<index>`.
        const IS_ARRAY = 1 << 1;
    }
}
