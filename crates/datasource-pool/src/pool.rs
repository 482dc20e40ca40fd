//! The node arena: allocation, recycling, topology and value writes.
//!
//! [`DatasourcePool`] owns every [`Node`]. Slots are allocated once at
//! construction and recycled through a `first_free` cursor that always points
//! at the lowest free slot (or past the end when full), which keeps the
//! in-use prefix dense.
//!
//! [`NodeId::INVALID`] doubles as the identity of the Sink: lookups that fail
//! to produce a live node return it, and [`DatasourcePool::node`] maps it (and
//! any dead identity) to the Sink node, whose writes are dropped and whose
//! reads return defaults.

use std::collections::{vec_deque, VecDeque};
use std::fmt;

use datasource_core::{CellValue, Handle, NodeFlags, NodeId};
use tracing::{debug, trace, warn};

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::names::{NameTable, Symbol};
use crate::node::Node;

/// Name given to the Root node.
pub const ROOT_NAME: &str = "Root";

/// A change recorded by the pool, waiting to be routed by its owner.
///
/// The pool knows nothing about subscribers. Its owner drains these after
/// each mutation: `Created`/`Destroyed` feed the monitor's debug log,
/// `ValueChanged` becomes a queued `ValueSet` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolEvent {
    /// A node was allocated and attached under a parent.
    Created(Handle),
    /// A node was destroyed; the handle is the one it had while alive.
    Destroyed(Handle),
    /// A node's value changed.
    ValueChanged(Handle),
}

/// Fixed-capacity owning store of nodes.
pub struct DatasourcePool {
    /// Slot 0 is the header sentinel, slot 1 is Root.
    nodes: Vec<Node>,
    /// Lowest slot that may be free. Equals `nodes.len()` when full.
    first_free: usize,
    /// Live nodes, Root included.
    live: usize,
    names: NameTable,
    sink: Node,
    journal: VecDeque<PoolEvent>,
}

impl DatasourcePool {
    /// Create a pool holding only Root.
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self::with_valid_capacity(config.capacity))
    }

    fn with_valid_capacity(capacity: usize) -> Self {
        let mut pool = Self {
            nodes: vec![Node::default(); capacity],
            first_free: 0,
            live: 0,
            names: NameTable::new(),
            sink: Node::sink(),
            journal: VecDeque::new(),
        };
        pool.init_root();
        pool
    }

    fn init_root(&mut self) {
        let name = self.names.intern(ROOT_NAME);
        let root = &mut self.nodes[NodeId::ROOT.index()];
        root.reset(NodeId::ROOT);
        root.name = name;
        self.first_free = NodeId::ROOT.index() + 1;
        self.live = 1;
    }

    /// Drop every node but Root and bump every live slot's generation, so
    /// that no previously issued handle resolves again, Root's included.
    ///
    /// Pending journal entries are discarded.
    pub fn clear(&mut self) {
        debug!(live = self.live, "clearing datasource pool");
        for node in self.nodes.iter_mut().filter(|n| n.id.is_valid()) {
            *node = Node {
                generation: node.generation.next(),
                ..Node::default()
            };
        }
        self.journal.clear();
        self.init_root();
    }

    // ── Allocation ─────────────────────────────────────────────────

    /// Claim the lowest free slot.
    ///
    /// The slot is reset but keeps its generation. It is not attached to
    /// anything and not journaled; [`attach_child`](Self::attach_child)
    /// links it into the tree and records its creation.
    pub(crate) fn allocate(&mut self) -> Result<NodeId, PoolError> {
        if self.first_free >= self.nodes.len() {
            return Err(PoolError::PoolFull {
                capacity: self.nodes.len(),
            });
        }

        let index = self.first_free;
        // Capacity is validated to at most u16::MAX + 1 slots.
        let id = NodeId(index as u16);
        self.nodes[index].reset(id);
        self.live += 1;

        self.first_free += 1;
        while self.first_free < self.nodes.len() && self.nodes[self.first_free].id.is_valid() {
            self.first_free += 1;
        }

        trace!(%id, first_free = self.first_free, "allocated datasource");
        Ok(id)
    }

    /// Allocate a node named `name` and splice it at the head of `parent`'s
    /// child list.
    pub(crate) fn attach_child(
        &mut self,
        parent: NodeId,
        name: Symbol,
    ) -> Result<NodeId, PoolError> {
        let id = self.allocate()?;
        let old_first = self.nodes[parent.index()].first_child;
        if old_first.is_valid() {
            self.nodes[old_first.index()].prev_sibling = id;
        }

        let node = &mut self.nodes[id.index()];
        node.name = name;
        node.parent = parent;
        node.next_sibling = old_first;
        let handle = node.handle();

        self.nodes[parent.index()].first_child = id;
        self.journal.push_back(PoolEvent::Created(handle));
        Ok(id)
    }

    // ── Destruction ────────────────────────────────────────────────

    /// Destroy a node and its whole subtree, children first.
    ///
    /// The node is unlinked from its siblings, its slot's generation is
    /// bumped and the slot becomes the preferred allocation target if it is
    /// the lowest free one. Dead identities and the Sink are ignored. Root is
    /// never destroyed; use [`clear`](Self::clear) or
    /// [`destroy_children`](Self::destroy_children) instead.
    pub fn destroy(&mut self, id: NodeId) {
        if id == NodeId::ROOT {
            warn!("refusing to destroy the Root datasource");
            return;
        }
        if self.get(id).is_none() {
            return;
        }
        self.destroy_subtree(id);
    }

    /// Destroy every child of `id`, keeping `id` itself.
    pub fn destroy_children(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let mut child = node.first_child;
        while child.is_valid() {
            let next = self.nodes[child.index()].next_sibling;
            self.destroy_subtree(child);
            child = next;
        }
    }

    /// Post-order walk over an explicit stack, so tree depth is bounded by
    /// capacity rather than by the thread's stack.
    fn destroy_subtree(&mut self, id: NodeId) {
        let mut stack = vec![(id, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                self.release(id);
                continue;
            }
            stack.push((id, true));
            let first = stack.len();
            stack.extend(self.children(id).map(|child| (child, false)));
            stack[first..].reverse();
        }
    }

    /// Unlink a childless node from its siblings and free its slot.
    fn release(&mut self, id: NodeId) {
        self.first_free = self.first_free.min(id.index());

        let node = &mut self.nodes[id.index()];
        let handle = node.handle();
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        *node = Node {
            generation: node.generation.next(),
            ..Node::default()
        };
        self.live -= 1;
        self.journal.push_back(PoolEvent::Destroyed(handle));
        trace!(%handle, "destroyed datasource");

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else if parent.is_valid() {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// The live node at `id`, if any.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get(id.index()).filter(|n| n.id == id)
    }

    /// Mutable access to the live node at `id`, if any.
    ///
    /// Topology links are not exposed mutably; only the value and flags can
    /// be changed through the pool's own methods.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get_mut(id.index()).filter(|n| n.id == id)
    }

    /// The live node `handle` refers to, if its generation still matches.
    pub fn resolve(&self, handle: Handle) -> Option<&Node> {
        self.get(handle.id())
            .filter(|n| n.generation == handle.generation())
    }

    /// Identity of the node `handle` refers to, or [`NodeId::INVALID`] (the
    /// Sink) when it is stale.
    pub fn live_id(&self, handle: Handle) -> NodeId {
        self.resolve(handle).map_or(NodeId::INVALID, Node::id)
    }

    /// The live node at `id`, or the Sink.
    pub fn node(&self, id: NodeId) -> &Node {
        self.get(id).unwrap_or(&self.sink)
    }

    /// The node `handle` refers to, or the Sink.
    pub fn node_or_sink(&self, handle: Handle) -> &Node {
        self.resolve(handle).unwrap_or(&self.sink)
    }

    /// The Root node.
    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// The Sink node.
    pub fn sink(&self) -> &Node {
        &self.sink
    }

    /// Iterate over the children of `id`, newest first.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            pool: self,
            next: self.get(id).map_or(NodeId::INVALID, |n| n.first_child),
        }
    }

    /// Number of children of `id`.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// First child of `parent` named `name`.
    pub(crate) fn child_named(&self, parent: NodeId, name: Symbol) -> Option<NodeId> {
        self.children(parent)
            .find(|&child| self.nodes[child.index()].name == name)
    }

    /// Name of a node. Empty for the Sink and dead identities.
    pub fn name_of(&self, id: NodeId) -> &str {
        match self.get(id) {
            Some(node) => self.names.resolve(node.name),
            None => "",
        }
    }

    /// Rename a live node. Sibling uniqueness is the caller's concern.
    pub(crate) fn rename(&mut self, id: NodeId, name: &str) {
        let symbol = self.names.intern(name);
        if let Some(node) = self.get_mut(id) {
            node.name = symbol;
        }
    }

    /// Dotted path from Root to `id`, Root excluded.
    ///
    /// Root yields `""`; the Sink and dead identities also yield `""`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(node) = self.get(current) {
            if current == NodeId::ROOT {
                break;
            }
            segments.push(self.names.resolve(node.name));
            current = node.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// The interned names.
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub(crate) fn names_mut(&mut self) -> &mut NameTable {
        &mut self.names
    }

    // ── Values ─────────────────────────────────────────────────────

    /// Write a value into a live node.
    ///
    /// Returns whether the value changed; a change is journaled as
    /// [`PoolEvent::ValueChanged`]. Writes to the Sink, to dead identities,
    /// of an equal value, or of a kind the cell is not locked to, return
    /// `false`. The last case is logged.
    pub fn set_value<T: CellValue>(&mut self, id: NodeId, value: T) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        match node.value.set(value) {
            Ok(true) => {
                let handle = node.handle();
                self.journal.push_back(PoolEvent::ValueChanged(handle));
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(node = %id, %err, "tried to assign a value of incompatible kind");
                false
            }
        }
    }

    /// Read a node's value as `T`; the Sink and dead identities read as the
    /// default.
    pub fn get_value<T: CellValue>(&self, id: NodeId) -> T {
        self.node(id).get()
    }

    /// Empty a node's value cell, unlocking its kind.
    pub fn clear_value(&mut self, id: NodeId) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        if !node.value.clear() {
            return false;
        }
        let handle = node.handle();
        self.journal.push_back(PoolEvent::ValueChanged(handle));
        true
    }

    pub(crate) fn insert_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(node) = self.get_mut(id) {
            node.flags.insert(flags);
        }
    }

    // ── Journal ────────────────────────────────────────────────────

    /// Take every change recorded since the last drain, oldest first.
    pub fn drain_events(&mut self) -> vec_deque::Drain<'_, PoolEvent> {
        self.journal.drain(..)
    }

    /// Take the oldest recorded change.
    pub fn next_event(&mut self) -> Option<PoolEvent> {
        self.journal.pop_front()
    }

    /// Changes recorded since the last drain, oldest first.
    pub fn pending_events(&self) -> &VecDeque<PoolEvent> {
        &self.journal
    }

    // ── Introspection ──────────────────────────────────────────────

    /// Live nodes, Root included.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Lowest possibly free slot; equals [`capacity`](Self::capacity) when
    /// the pool is full.
    pub fn first_free(&self) -> usize {
        self.first_free
    }

    /// Render the subtree under `id` as indented `name = value` lines.
    pub fn write_tree(&self, out: &mut impl fmt::Write, id: NodeId) -> fmt::Result {
        let mut stack = vec![(id, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let name = self.names.resolve(node.name);
            write!(out, "{:indent$}{name}", "", indent = depth * 2)?;
            if node.is_array() {
                out.write_str("[]")?;
            }
            if !node.value.is_empty() {
                write!(out, " = {}", node.value())?;
            }
            out.write_char('\n')?;

            let first = stack.len();
            stack.extend(self.children(id).map(|child| (child, depth + 1)));
            stack[first..].reverse();
        }
        Ok(())
    }
}

impl Default for DatasourcePool {
    fn default() -> Self {
        Self::with_valid_capacity(PoolConfig::DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for DatasourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasourcePool")
            .field("capacity", &self.nodes.len())
            .field("live", &self.live)
            .field("first_free", &self.first_free)
            .field("pending_events", &self.journal.len())
            .finish()
    }
}

/// Iterator over a node's children, following `next_sibling` links.
pub struct Children<'p> {
    pool: &'p DatasourcePool,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.pool.get(current)?;
        self.next = node.next_sibling;
        Some(current)
    }
}
