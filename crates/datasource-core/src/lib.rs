//! Core types for the datasource tree.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the pool, the change monitor and the facade:
//! node identities, generation-checked handles, node flags, the typed
//! value cell and change events.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod flags;
pub mod id;
pub mod value;

pub use error::ValueError;
pub use event::{ChangeEvent, ChangeEventKind};
pub use flags::NodeFlags;
pub use id::{Generation, Handle, NodeId};
pub use value::{
    CellValue, GameplayTag, Name, ResourceRef, StructBlob, Text, Value, ValueCell, ValueKind,
};
