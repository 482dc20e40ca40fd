//! Datasource: a hierarchical, path-addressable, observable value store.
//!
//! Named nodes form a tree, each holding an optional typed value. Callers
//! address nodes through generation-checked [`Handle`](types::Handle)s and
//! observe value changes by binding callbacks, which are delivered in
//! batches once per update tick.
//!
//! # Quick start
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use datasource::prelude::*;
//!
//! let mut store = Store::default();
//! let health = store.find_or_create(Handle::INVALID, "Player.Stats.Health");
//!
//! let shown = Rc::new(Cell::new(0.0f32));
//! let label = Rc::clone(&shown);
//! store.bind(
//!     health,
//!     Rc::new(move |store: &mut Store, event: &ChangeEvent| {
//!         label.set(store.get::<f32>(event.handle));
//!     }),
//! );
//!
//! store.set(health, 100.0f32);
//! assert_eq!(store.process_events(), 1);
//! assert_eq!(shown.get(), 100.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `datasource-core` | Handles, identities, value cell, change events |
//! | [`pool`] | `datasource-pool` | Node arena, path resolver, array views |
//! | [`monitor`] | `datasource-monitor` | Subscriber registry and batched dispatch |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`datasource-core`).
///
/// Identities, [`types::Handle`], [`types::ValueCell`] and the payload
/// types it stores, [`types::ChangeEvent`].
pub use datasource_core as types;

/// Node arena, path resolver and array views (`datasource-pool`).
///
/// Use [`pool::DatasourcePool`] directly when no change notification is
/// needed.
pub use datasource_pool as pool;

/// Subscriber registry and batched dispatch (`datasource-monitor`).
pub use datasource_monitor as monitor;

mod array;
pub mod config;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use store::{Callback, Store, Subscriber};

/// Common imports for typical datasource usage.
///
/// ```rust
/// use datasource::prelude::*;
/// ```
pub mod prelude {
    // Facade
    pub use crate::config::{ConfigError, StoreConfig};
    pub use crate::store::{Callback, Store};

    // Core types
    pub use datasource_core::{
        CellValue, ChangeEvent, ChangeEventKind, GameplayTag, Handle, Name, ResourceRef,
        StructBlob, Text, ValueKind,
    };

    // Configuration
    pub use datasource_monitor::MonitorConfig;
    pub use datasource_pool::PoolConfig;
}
