//! The composition root: one pool, one monitor, handle-based API.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use datasource_core::{CellValue, ChangeEvent, ChangeEventKind, Handle, NodeId, ValueKind};
use datasource_monitor::{ChangeMonitor, LogEntry, LogKind, QueueOutcome};
use datasource_pool::{DatasourcePool, Node, PoolEvent};
use tracing::{trace, warn};

use crate::config::{ConfigError, StoreConfig};

/// Signature of a change subscriber.
pub type Subscriber = dyn Fn(&mut Store, &ChangeEvent);

/// A shared change subscriber.
///
/// Subscribers receive the store itself and may read, write, create,
/// destroy, bind and unbind while being notified. Two callbacks are the
/// same subscriber when they point at the same allocation.
pub type Callback = Rc<Subscriber>;

/// A datasource tree with change notification.
///
/// Every operation takes [`Handle`]s, which stay safe to hold across any
/// mutation: a handle to a destroyed node resolves to the Sink, which reads
/// as defaults and ignores writes.
///
/// Value writes are observed through [`bind`](Self::bind). Notifications are
/// batched: they accumulate until [`process_events`](Self::process_events)
/// runs, which is meant to be called once per update tick.
pub struct Store {
    pool: DatasourcePool,
    monitor: ChangeMonitor<Subscriber>,
}

impl Store {
    /// Build a store from a validated configuration.
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pool: DatasourcePool::new(&config.pool)?,
            monitor: ChangeMonitor::new(&config.monitor)?,
        })
    }

    /// Read access to the node pool.
    pub fn pool(&self) -> &DatasourcePool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut DatasourcePool {
        &mut self.pool
    }

    /// Read access to the change monitor.
    pub fn monitor(&self) -> &ChangeMonitor<Subscriber> {
        &self.monitor
    }

    /// Drop every node but Root, every subscriber and every pending event.
    ///
    /// All previously issued handles stop resolving, Root's included.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.monitor.clear();
    }

    // ── Paths ──────────────────────────────────────────────────────

    /// Handle to Root.
    pub fn root(&self) -> Handle {
        self.pool.root().handle()
    }

    /// Node a parent handle designates: Root for [`Handle::INVALID`], the
    /// Sink for a stale handle.
    fn start_of(&self, parent: Handle) -> NodeId {
        if parent == Handle::INVALID {
            NodeId::ROOT
        } else {
            self.pool.live_id(parent)
        }
    }

    /// Resolve a dotted path under `parent`, creating missing nodes.
    ///
    /// Returns [`Handle::INVALID`] when `parent` is stale or the pool is
    /// exhausted.
    pub fn find_or_create(&mut self, parent: Handle, path: &str) -> Handle {
        let start = self.start_of(parent);
        let id = self.pool.find_or_create(Some(start), path);
        let handle = self.pool.node(id).handle();
        self.flush();
        handle
    }

    /// Resolve a dotted path under `parent` without creating anything.
    pub fn find(&self, parent: Handle, path: &str) -> Option<Handle> {
        let start = self.start_of(parent);
        self.pool
            .find(Some(start), path)
            .map(|id| self.pool.node(id).handle())
    }

    /// Find or create the child of `parent` named exactly `name`.
    pub fn find_or_create_child(&mut self, parent: Handle, name: &str) -> Handle {
        let start = self.start_of(parent);
        let id = self.pool.find_or_create_child(Some(start), name);
        let handle = self.pool.node(id).handle();
        self.flush();
        handle
    }

    /// Find the child of `parent` named exactly `name`.
    pub fn find_child(&self, parent: Handle, name: &str) -> Option<Handle> {
        let start = self.start_of(parent);
        self.pool
            .find_child(Some(start), name)
            .map(|id| self.pool.node(id).handle())
    }

    // ── Topology ───────────────────────────────────────────────────

    /// Whether `handle` still refers to a live node.
    pub fn is_alive(&self, handle: Handle) -> bool {
        self.pool.resolve(handle).is_some()
    }

    /// The node `handle` refers to, or the Sink.
    pub fn node(&self, handle: Handle) -> &Node {
        self.pool.node_or_sink(handle)
    }

    /// Destroy a node and its subtree. Subscribers of every destroyed node
    /// are dropped.
    pub fn destroy(&mut self, handle: Handle) {
        let id = self.pool.live_id(handle);
        self.pool.destroy(id);
        self.flush();
    }

    /// Destroy every child of a node.
    pub fn destroy_children(&mut self, handle: Handle) {
        let id = self.pool.live_id(handle);
        self.pool.destroy_children(id);
        self.flush();
    }

    /// Children of a node, newest first.
    pub fn children(&self, handle: Handle) -> impl Iterator<Item = Handle> + '_ {
        self.pool
            .children(self.pool.live_id(handle))
            .map(|id| self.pool.node(id).handle())
    }

    /// Parent of a node; [`Handle::INVALID`] for Root and the Sink.
    pub fn parent(&self, handle: Handle) -> Handle {
        let parent = self.node(handle).parent();
        self.pool.node(parent).handle()
    }

    /// Name of a node; empty for the Sink.
    pub fn name_of(&self, handle: Handle) -> &str {
        self.pool.name_of(self.pool.live_id(handle))
    }

    /// Dotted path from Root to a node, Root excluded.
    pub fn path_of(&self, handle: Handle) -> String {
        self.pool.path_of(self.pool.live_id(handle))
    }

    /// Render the subtree under `handle` as indented `name = value` lines.
    pub fn dump_tree(&self, handle: Handle) -> String {
        let mut out = String::new();
        // Writing into a String never fails.
        let _ = self.pool.write_tree(&mut out, self.pool.live_id(handle));
        out
    }

    // ── Values ─────────────────────────────────────────────────────

    /// Write a value. Returns whether it changed; a change queues a
    /// [`ChangeEventKind::ValueSet`] for the node.
    pub fn set<T: CellValue>(&mut self, handle: Handle, value: T) -> bool {
        let id = self.pool.live_id(handle);
        let changed = self.pool.set_value(id, value);
        self.flush();
        changed
    }

    /// Read a value as `T`, or the default of `T` when the node holds
    /// another kind or is gone.
    pub fn get<T: CellValue>(&self, handle: Handle) -> T {
        self.node(handle).get()
    }

    /// Read a value as `T` if that is the stored kind.
    pub fn try_get<T: CellValue>(&self, handle: Handle) -> Option<T> {
        self.node(handle).try_get().cloned()
    }

    /// Kind of the stored value.
    pub fn value_kind(&self, handle: Handle) -> ValueKind {
        self.node(handle).value_kind()
    }

    /// Empty a node's value, unlocking its kind. Returns whether it held one.
    pub fn clear_value(&mut self, handle: Handle) -> bool {
        let id = self.pool.live_id(handle);
        let cleared = self.pool.clear_value(id);
        self.flush();
        cleared
    }

    // ── Events ─────────────────────────────────────────────────────

    /// Subscribe `callback` to changes of `handle`.
    ///
    /// Returns `false` if the callback is already bound there or the handle
    /// does not refer to a live node.
    pub fn bind(&mut self, handle: Handle, callback: Callback) -> bool {
        if !self.is_alive(handle) {
            warn!(%handle, "refusing to bind to a dead datasource");
            return false;
        }
        self.monitor.bind(handle, callback)
    }

    /// [`bind`](Self::bind), then deliver an
    /// [`InitialBind`](ChangeEventKind::InitialBind) event to `callback`
    /// alone so it can pull the current value.
    pub fn bind_with_initial(&mut self, handle: Handle, callback: Callback) -> bool {
        if !self.bind(handle, Rc::clone(&callback)) {
            return false;
        }
        callback(self, &ChangeEvent::initial_bind(handle));
        self.flush();
        true
    }

    /// Unsubscribe `callback` from `handle`. Returns whether it was bound.
    pub fn unbind(&mut self, handle: Handle, callback: &Callback) -> bool {
        self.monitor.unbind(handle, callback)
    }

    /// Queue an event for `handle`'s subscribers.
    ///
    /// Equal events queued in the same cycle collapse into one. In immediate
    /// mode the event is delivered at once unless a dispatch is running.
    pub fn queue_event(&mut self, handle: Handle, kind: ChangeEventKind) {
        if self.monitor.queue_event(handle, kind) == QueueOutcome::DispatchNow {
            let event = ChangeEvent::new(handle, kind);
            if self.monitor.begin_immediate() {
                self.deliver(&event);
                self.monitor.end_dispatch();
            }
        }
    }

    /// Deliver every queued event.
    ///
    /// The queue is swapped out before the first callback runs: events
    /// raised by callbacks are delivered by the next call. Subscribers of a
    /// handle are invoked in subscription order, handles in queue order.
    /// Returns the number of callback invocations; a nested call from a
    /// callback is refused and returns 0.
    pub fn process_events(&mut self) -> usize {
        self.flush();
        let Some(batch) = self.monitor.begin_dispatch() else {
            return 0;
        };
        let delivered: usize = batch.iter().map(|event| self.deliver(event)).sum();
        self.monitor.end_dispatch();
        trace!(events = batch.len(), delivered, "processed change events");
        delivered
    }

    /// Toggle immediate delivery.
    pub fn set_immediate(&mut self, immediate: bool) {
        self.monitor.set_immediate(immediate);
    }

    /// Structural changes recorded for introspection, oldest first.
    pub fn logs(&self) -> &VecDeque<LogEntry> {
        self.monitor.logs()
    }

    /// Take the recorded structural changes.
    pub fn take_logs(&mut self) -> Vec<LogEntry> {
        self.monitor.take_logs()
    }

    fn deliver(&mut self, event: &ChangeEvent) -> usize {
        let subscribers = self.monitor.snapshot(event.handle);
        for callback in &subscribers {
            callback(self, event);
            self.flush();
        }
        subscribers.len()
    }

    /// Route the pool's journal into the monitor, oldest entry first.
    ///
    /// Entries are taken one at a time: a callback run by an immediate
    /// delivery flushes from here too, and picks up the older entries before
    /// its own, so the log and the queue follow mutation order.
    pub(crate) fn flush(&mut self) {
        while let Some(event) = self.pool.next_event() {
            match event {
                PoolEvent::Created(handle) => self.monitor.record(handle, LogKind::Created),
                PoolEvent::Destroyed(handle) => {
                    self.monitor.record(handle, LogKind::Destroyed);
                    self.monitor.forget(handle);
                }
                PoolEvent::ValueChanged(handle) => {
                    self.queue_event(handle, ChangeEventKind::ValueSet);
                }
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self {
            pool: DatasourcePool::default(),
            monitor: ChangeMonitor::default(),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("pool", &self.pool)
            .field("monitor", &self.monitor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording(seen: &Rc<RefCell<Vec<ChangeEvent>>>) -> Callback {
        let seen = Rc::clone(seen);
        Rc::new(move |_: &mut Store, e: &ChangeEvent| seen.borrow_mut().push(*e))
    }

    #[test]
    fn invalid_parent_means_root_and_stale_parent_means_sink() {
        let mut store = Store::default();
        let a = store.find_or_create(Handle::INVALID, "A");
        assert_eq!(store.find(store.root(), "A"), Some(a));

        store.destroy(a);
        assert_eq!(store.find_or_create(a, "B"), Handle::INVALID);
        assert_eq!(store.find(a, "B"), Some(Handle::INVALID));
    }

    #[test]
    fn value_changes_are_queued_once() {
        let mut store = Store::default();
        let hp = store.find_or_create(Handle::INVALID, "Hp");
        assert!(store.set(hp, 1i32));
        assert!(store.set(hp, 2i32));
        assert!(!store.set(hp, 2i32));
        assert_eq!(store.monitor().pending_len(), 1);
    }

    #[test]
    fn stale_handles_read_defaults_and_ignore_writes() {
        let mut store = Store::default();
        let hp = store.find_or_create(Handle::INVALID, "Hp");
        store.set(hp, 7i32);
        store.destroy(hp);
        assert_eq!(store.get::<i32>(hp), 0);
        assert!(!store.set(hp, 8i32));
        assert_eq!(store.try_get::<i32>(hp), None);
        assert_eq!(store.name_of(hp), "");
        assert_eq!(store.value_kind(hp), ValueKind::Void);
    }

    #[test]
    fn bind_refuses_dead_handles() {
        let mut store = Store::default();
        let seen = Rc::default();
        let a = store.find_or_create(Handle::INVALID, "A");
        store.destroy(a);
        assert!(!store.bind(a, recording(&seen)));
        assert!(!store.bind(Handle::INVALID, recording(&seen)));
    }

    #[test]
    fn destroy_drops_subscribers_and_logs() {
        let mut store = Store::default();
        let seen = Rc::default();
        let leaf = store.find_or_create(Handle::INVALID, "A.B");
        store.bind(leaf, recording(&seen));
        store.take_logs();

        store.destroy(store.parent(leaf));
        assert_eq!(store.monitor().subscriber_count(leaf), 0);
        let kinds: Vec<_> = store.take_logs().into_iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LogKind::Destroyed, LogKind::Destroyed]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = Store::default();
        let seen = Rc::default();
        let root = store.root();
        let a = store.find_or_create(Handle::INVALID, "A");
        store.bind(a, recording(&seen));
        store.set(a, 1i32);

        store.clear();
        assert!(!store.is_alive(a));
        assert!(!store.is_alive(root));
        assert!(store.is_alive(store.root()));
        assert_eq!(store.process_events(), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn dump_tree_renders_subtree() {
        let mut store = Store::default();
        let hp = store.find_or_create(Handle::INVALID, "Player.Hp");
        store.set(hp, 5i32);
        let player = store.find(Handle::INVALID, "Player").unwrap();
        assert_eq!(store.dump_tree(player), "Player\n  Hp = 5\n");
        assert_eq!(store.path_of(hp), "Player.Hp");
    }

    #[test]
    fn immediate_callbacks_see_the_journal_in_mutation_order() {
        let mut store = Store::default();
        let a = store.find_or_create(Handle::INVALID, "A");
        store.set_immediate(true);
        store.bind(
            a,
            Rc::new(|store: &mut Store, _: &ChangeEvent| {
                let _ = store.find_or_create(Handle::INVALID, "Early");
            }),
        );
        store.take_logs();

        // Two mutations journaled before a single flush.
        let id = store.pool().live_id(a);
        store.pool_mut().set_value(id, 1i32);
        let late = store.pool_mut().find_or_create(None, "Late");
        let late = store.pool().node(late).handle();
        store.flush();

        let early = store.find(Handle::INVALID, "Early").unwrap();
        let created: Vec<_> = store.take_logs().into_iter().map(|l| l.handle).collect();
        assert_eq!(created, vec![late, early]);
    }

    #[test]
    fn new_validates_config() {
        assert!(Store::new(StoreConfig::with_capacity(2)).is_err());
        let store = Store::new(StoreConfig::with_capacity(16)).unwrap();
        assert_eq!(store.pool().capacity(), 16);
    }
}
