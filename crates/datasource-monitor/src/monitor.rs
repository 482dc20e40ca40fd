//! Subscriber registry, deduplicating event queue and dispatch state.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;

use datasource_core::{ChangeEvent, ChangeEventKind, Handle};
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorError;

/// Whether a batch is being delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchState {
    /// No dispatch in progress.
    #[default]
    Idle,
    /// Callbacks are being invoked; new events go to the next batch.
    Dispatching,
}

/// What [`ChangeMonitor::queue_event`] did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Added to the pending queue.
    Queued,
    /// An equal event was already pending.
    AlreadyQueued,
    /// Immediate mode is on and the monitor is idle: the caller should
    /// deliver the event right away.
    DispatchNow,
    /// The handle is invalid; nothing can be subscribed to it.
    Ignored,
}

/// Kind of a debug log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// A node was created.
    Created,
    /// A node was destroyed.
    Destroyed,
}

/// One structural change, kept for introspection tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// The node, under the generation it had at the time.
    pub handle: Handle,
    /// What happened to it.
    pub kind: LogKind,
}

/// Subscriber registry plus a batched, deduplicating event queue.
///
/// `F` is the callback type, usually a `dyn Fn(..)`. Callbacks are shared
/// as `Rc<F>`; two callbacks are the same subscriber when they point at the
/// same allocation.
///
/// Dispatch protocol:
///
/// 1. [`begin_dispatch`](Self::begin_dispatch) moves the pending queue out
///    and enters [`DispatchState::Dispatching`].
/// 2. For each event, [`snapshot`](Self::snapshot) copies the subscriber
///    list, and the owner invokes the copies. The monitor may be mutated
///    freely in between.
/// 3. [`end_dispatch`](Self::end_dispatch) returns to idle and drops the
///    subscriber lists emptied during the batch.
///
/// [`process_events`](Self::process_events) runs the whole protocol when the
/// callbacks do not need access to the monitor.
pub struct ChangeMonitor<F: ?Sized> {
    immediate: bool,
    log_capacity: usize,
    subscribers: IndexMap<Handle, Vec<Rc<F>>>,
    queue: IndexSet<ChangeEvent>,
    state: DispatchState,
    /// Handles whose list emptied mid-dispatch.
    pending_cleanup: Vec<Handle>,
    logs: VecDeque<LogEntry>,
}

impl<F: ?Sized> ChangeMonitor<F> {
    /// Create an empty monitor.
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: &MonitorConfig) -> Self {
        Self {
            immediate: config.process_events_immediate,
            log_capacity: config.log_capacity,
            subscribers: IndexMap::new(),
            queue: IndexSet::new(),
            state: DispatchState::Idle,
            pending_cleanup: Vec::new(),
            logs: VecDeque::new(),
        }
    }

    // ── Subscribers ────────────────────────────────────────────────

    /// Subscribe `callback` to `handle`.
    ///
    /// Returns `false` if that exact callback is already subscribed, or if
    /// the handle is invalid.
    pub fn bind(&mut self, handle: Handle, callback: Rc<F>) -> bool {
        if !handle.is_valid() {
            warn!("refusing to bind a callback to the invalid handle");
            return false;
        }
        let list = self.subscribers.entry(handle).or_default();
        if list.iter().any(|cb| Rc::ptr_eq(cb, &callback)) {
            return false;
        }
        list.push(callback);
        trace!(%handle, subscribers = list.len(), "bound subscriber");
        true
    }

    /// Unsubscribe `callback` from `handle`. Returns whether it was bound.
    ///
    /// Safe to call from within a callback; the removal is visible to the
    /// next snapshot.
    pub fn unbind(&mut self, handle: Handle, callback: &Rc<F>) -> bool {
        let Some(list) = self.subscribers.get_mut(&handle) else {
            return false;
        };
        let Some(pos) = list.iter().position(|cb| Rc::ptr_eq(cb, callback)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.drop_list(handle);
        }
        trace!(%handle, "unbound subscriber");
        true
    }

    /// Drop every subscriber of `handle`, typically because its node died.
    pub fn forget(&mut self, handle: Handle) {
        let Some(list) = self.subscribers.get_mut(&handle) else {
            return;
        };
        list.clear();
        self.drop_list(handle);
    }

    fn drop_list(&mut self, handle: Handle) {
        match self.state {
            DispatchState::Idle => {
                self.subscribers.shift_remove(&handle);
            }
            DispatchState::Dispatching => self.pending_cleanup.push(handle),
        }
    }

    /// Copy of the subscribers of `handle`, in subscription order.
    pub fn snapshot(&self, handle: Handle) -> SmallVec<[Rc<F>; 4]> {
        self.subscribers
            .get(&handle)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of subscribers of `handle`.
    pub fn subscriber_count(&self, handle: Handle) -> usize {
        self.subscribers.get(&handle).map_or(0, Vec::len)
    }

    /// Handles with a subscriber list, in first-bind order. Lists emptied
    /// during a dispatch linger until it ends.
    pub fn bound_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.subscribers.keys().copied()
    }

    // ── Queue ──────────────────────────────────────────────────────

    /// Queue an event for `handle`.
    ///
    /// An event equal to one already pending is dropped. In immediate mode
    /// an idle monitor returns [`QueueOutcome::DispatchNow`] instead of
    /// queuing; the caller delivers the event itself.
    pub fn queue_event(&mut self, handle: Handle, kind: ChangeEventKind) -> QueueOutcome {
        if !handle.is_valid() {
            return QueueOutcome::Ignored;
        }
        if self.immediate && self.state == DispatchState::Idle {
            return QueueOutcome::DispatchNow;
        }
        if self.queue.insert(ChangeEvent::new(handle, kind)) {
            QueueOutcome::Queued
        } else {
            QueueOutcome::AlreadyQueued
        }
    }

    /// Events waiting for the next dispatch, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &ChangeEvent> + '_ {
        self.queue.iter()
    }

    /// Number of events waiting for the next dispatch.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    // ── Dispatch ───────────────────────────────────────────────────

    /// Start a batch: take every pending event and enter
    /// [`DispatchState::Dispatching`].
    ///
    /// Returns `None`, leaving the queue alone, if a dispatch is already
    /// running.
    pub fn begin_dispatch(&mut self) -> Option<Vec<ChangeEvent>> {
        if self.state == DispatchState::Dispatching {
            warn!("process_events called while already dispatching, ignoring");
            return None;
        }
        self.state = DispatchState::Dispatching;
        let batch: Vec<ChangeEvent> = mem::take(&mut self.queue).into_iter().collect();
        trace!(events = batch.len(), "dispatching change events");
        Some(batch)
    }

    /// Enter [`DispatchState::Dispatching`] to deliver a single event
    /// outside of a batch. Returns `false` if a dispatch is already running.
    pub fn begin_immediate(&mut self) -> bool {
        if self.state == DispatchState::Dispatching {
            return false;
        }
        self.state = DispatchState::Dispatching;
        true
    }

    /// Finish a dispatch and drop the subscriber lists emptied during it.
    pub fn end_dispatch(&mut self) {
        self.state = DispatchState::Idle;
        for handle in mem::take(&mut self.pending_cleanup) {
            if self.subscribers.get(&handle).is_some_and(Vec::is_empty) {
                self.subscribers.shift_remove(&handle);
            }
        }
    }

    /// Deliver every pending event through `invoke`, returning the number of
    /// callback invocations.
    pub fn process_events(&mut self, mut invoke: impl FnMut(&F, &ChangeEvent)) -> usize {
        let Some(batch) = self.begin_dispatch() else {
            return 0;
        };
        let mut delivered = 0;
        for event in &batch {
            for callback in self.snapshot(event.handle) {
                invoke(&*callback, event);
                delivered += 1;
            }
        }
        self.end_dispatch();
        delivered
    }

    /// Current dispatch state.
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Whether events are delivered as soon as they are queued.
    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    /// Toggle immediate delivery.
    pub fn set_immediate(&mut self, immediate: bool) {
        self.immediate = immediate;
    }

    // ── Debug log ──────────────────────────────────────────────────

    /// Record a structural change, evicting the oldest entry when full.
    pub fn record(&mut self, handle: Handle, kind: LogKind) {
        if self.logs.len() == self.log_capacity {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry { handle, kind });
    }

    /// Recorded structural changes, oldest first.
    pub fn logs(&self) -> &VecDeque<LogEntry> {
        &self.logs
    }

    /// Take the recorded structural changes.
    pub fn take_logs(&mut self) -> Vec<LogEntry> {
        self.logs.drain(..).collect()
    }

    /// Drop pending events, subscribers and logs.
    ///
    /// A dispatch in progress keeps running on its own batch.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.subscribers.clear();
        self.pending_cleanup.clear();
        self.logs.clear();
    }
}

impl<F: ?Sized> Default for ChangeMonitor<F> {
    fn default() -> Self {
        Self::from_valid_config(&MonitorConfig::default())
    }
}

impl<F: ?Sized> fmt::Debug for ChangeMonitor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeMonitor")
            .field("state", &self.state)
            .field("immediate", &self.immediate)
            .field("bound_handles", &self.subscribers.len())
            .field("pending", &self.queue.len())
            .field("logs", &self.logs.len())
            .finish()
    }
}
