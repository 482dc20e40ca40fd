//! Fixed-capacity node arena for the datasource tree.
//!
//! # Architecture
//!
//! ```text
//! DatasourcePool
//! ├── Vec<Node> (capacity slots, allocated once)
//! │   ├── [0] header sentinel, never addressable
//! │   ├── [1] Root, permanently allocated
//! │   └── [2..] recycled through the `first_free` cursor
//! ├── Node (Sink): out-of-band singleton, returned instead of "nothing"
//! ├── NameTable: interned path segments, shared by create and find
//! └── journal: PoolEvent[] drained by the composition root
//! ```
//!
//! Nodes link to each other by [`NodeId`](datasource_core::NodeId), never by
//! reference: parent, first child, and a doubly linked sibling list. Callers
//! outside the pool hold [`Handle`](datasource_core::Handle)s, which carry the
//! slot generation and stop resolving once the node is destroyed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod config;
pub mod error;
pub mod names;
pub mod node;
mod path;
pub mod pool;

pub use array::{ArrayView, ArrayViewMut, ITEM_BASE_NAME};
pub use config::PoolConfig;
pub use error::PoolError;
pub use names::{NameTable, Symbol};
pub use node::Node;
pub use pool::{Children, DatasourcePool, PoolEvent};
