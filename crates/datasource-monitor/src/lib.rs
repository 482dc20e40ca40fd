//! Change notification for the datasource tree.
//!
//! [`ChangeMonitor`] keeps the subscribers of every handle and a queue of
//! pending [`ChangeEvent`](datasource_core::ChangeEvent)s. Events are
//! delivered in batches: a dispatch swaps the queue out before the first
//! callback runs, so anything queued by a callback lands in the next batch.
//!
//! The monitor is generic over the callback type so that its owner can hand
//! itself to callbacks. It never calls a callback while holding a borrow of
//! its own storage: dispatch is split into [`begin_dispatch`], per-handle
//! [`snapshot`]s and [`end_dispatch`], and the owner drives the calls.
//!
//! [`begin_dispatch`]: ChangeMonitor::begin_dispatch
//! [`snapshot`]: ChangeMonitor::snapshot
//! [`end_dispatch`]: ChangeMonitor::end_dispatch

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod monitor;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use monitor::{ChangeMonitor, DispatchState, LogEntry, LogKind, QueueOutcome};
