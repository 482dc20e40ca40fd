//! Array views over nodes.
//!
//! An array node stores its element count as an `i32` value and names its
//! elements `Item#0`, `Item#1`, ... The views here are thin borrows of the
//! pool that keep the count and the naming in step.

use datasource_core::{NodeFlags, NodeId, ValueKind};
use tracing::warn;

use crate::pool::DatasourcePool;

/// Base name of array elements.
pub const ITEM_BASE_NAME: &str = "Item";

/// Name of the element at `index`.
pub fn item_name(index: i32) -> String {
    format!("{ITEM_BASE_NAME}#{index}")
}

/// Index encoded in an element name, if it follows the `Item#<n>` convention.
pub fn parse_item_index(name: &str) -> Option<i32> {
    name.strip_prefix(ITEM_BASE_NAME)?
        .strip_prefix('#')?
        .parse()
        .ok()
}

fn count_of(pool: &DatasourcePool, id: NodeId) -> i32 {
    pool.node(id).try_get::<i32>().copied().unwrap_or(0)
}

/// Whether the count cell can take an `i32`: empty or already an `Int`.
fn holds_count(pool: &DatasourcePool, id: NodeId) -> bool {
    let kind = pool.node(id).value_kind();
    if matches!(kind, ValueKind::Int | ValueKind::Void) {
        return true;
    }
    warn!(array = %id, %kind, "array count overwritten by another kind, refusing to append");
    false
}

fn child_at(pool: &DatasourcePool, id: NodeId, index: i32) -> NodeId {
    let num = count_of(pool, id);
    if index < 0 || index >= num {
        warn!(array = %id, index, num, "array index out of range, returning the sink");
        return NodeId::INVALID;
    }
    pool.find_child(Some(id), &item_name(index))
        .unwrap_or(NodeId::INVALID)
}

/// Read-only view of an array node.
#[derive(Clone, Copy)]
pub struct ArrayView<'p> {
    pool: &'p DatasourcePool,
    id: NodeId,
}

impl<'p> ArrayView<'p> {
    /// The array node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Element count.
    pub fn num(&self) -> i32 {
        count_of(self.pool, self.id)
    }

    /// Element at `index`, or the Sink when out of range.
    pub fn get_child_at(&self, index: i32) -> NodeId {
        child_at(self.pool, self.id, index)
    }

    /// Elements in index order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + 'p {
        let (pool, id) = (self.pool, self.id);
        (0..count_of(pool, id)).map(move |i| child_at(pool, id, i))
    }
}

/// Mutable view of an array node.
pub struct ArrayViewMut<'p> {
    pool: &'p mut DatasourcePool,
    id: NodeId,
}

impl ArrayViewMut<'_> {
    /// The array node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> ArrayView<'_> {
        ArrayView {
            pool: self.pool,
            id: self.id,
        }
    }

    /// Element count.
    pub fn num(&self) -> i32 {
        count_of(self.pool, self.id)
    }

    /// Element at `index`, or the Sink when out of range.
    pub fn get_child_at(&self, index: i32) -> NodeId {
        child_at(self.pool, self.id, index)
    }

    /// Add an element at the end.
    ///
    /// Returns `None`, leaving the count untouched, when the pool is full or
    /// the node's value was replaced by another kind.
    pub fn append(&mut self) -> Option<NodeId> {
        if !holds_count(self.pool, self.id) {
            return None;
        }
        let count = self.num();
        let child = self
            .pool
            .find_or_create_child(Some(self.id), &item_name(count));
        if !child.is_valid() {
            return None;
        }
        self.pool.set_value(self.id, count + 1).then_some(child)
    }

    /// Add an element at index 0, shifting every existing element up by one.
    ///
    /// O(n) in the number of children. Returns `None`, leaving the array
    /// untouched, when the pool is full or the node's value was replaced by
    /// another kind.
    pub fn append_front(&mut self) -> Option<NodeId> {
        if !holds_count(self.pool, self.id) {
            return None;
        }
        let count = self.num();
        let child = self
            .pool
            .find_or_create_child(Some(self.id), &item_name(count));
        if !child.is_valid() {
            return None;
        }

        let shifted: Vec<(NodeId, i32)> = self
            .pool
            .children(self.id)
            .filter(|&c| c != child)
            .filter_map(|c| parse_item_index(self.pool.name_of(c)).map(|i| (c, i)))
            .filter(|&(_, i)| i < count)
            .collect();
        for (c, i) in shifted {
            self.pool.rename(c, &item_name(i + 1));
        }
        self.pool.rename(child, &item_name(0));

        self.pool.set_value(self.id, count + 1).then_some(child)
    }

    /// Reset the count to zero, destroying the elements if asked.
    ///
    /// Kept elements stay attached under their old names and are reused by
    /// later appends. A value of another kind is dropped, restoring the count.
    pub fn empty(&mut self, destroy_children: bool) {
        if destroy_children {
            self.pool.destroy_children(self.id);
        }
        if self.pool.node(self.id).value_kind() != ValueKind::Int {
            self.pool.clear_value(self.id);
        }
        self.pool.set_value(self.id, 0i32);
    }
}

impl DatasourcePool {
    /// Turn a node into an array with a count of zero.
    ///
    /// A value of another kind is dropped first. Returns `None` for the Sink
    /// and dead identities.
    pub fn make_array(&mut self, id: NodeId, destroy_children: bool) -> Option<ArrayViewMut<'_>> {
        let node = self.get(id)?;
        let holds_int = node.value_kind() == ValueKind::Int;

        if destroy_children {
            self.destroy_children(id);
        }
        self.insert_flags(id, NodeFlags::IS_ARRAY);
        if !holds_int {
            self.clear_value(id);
        }
        self.set_value(id, 0i32);
        Some(ArrayViewMut { pool: self, id })
    }

    /// Whether `id` is a live array node.
    pub fn is_array(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.is_array())
    }

    /// Read-only view of an array node.
    pub fn array(&self, id: NodeId) -> Option<ArrayView<'_>> {
        self.is_array(id).then_some(ArrayView { pool: self, id })
    }

    /// Mutable view of an array node.
    pub fn array_mut(&mut self, id: NodeId) -> Option<ArrayViewMut<'_>> {
        if !self.is_array(id) {
            return None;
        }
        Some(ArrayViewMut { pool: self, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::pool::PoolEvent;

    fn pool() -> DatasourcePool {
        DatasourcePool::new(&PoolConfig::with_capacity(64)).unwrap()
    }

    #[test]
    fn item_names_round_trip() {
        assert_eq!(item_name(3), "Item#3");
        assert_eq!(parse_item_index("Item#12"), Some(12));
        assert_eq!(parse_item_index("Item12"), None);
        assert_eq!(parse_item_index("Other#1"), None);
    }

    #[test]
    fn append_keeps_indices_contiguous() {
        let mut pool = pool();
        let list = pool.find_or_create(None, "Inventory");
        let mut array = pool.make_array(list, false).unwrap();
        let items: Vec<_> = (0..5).map(|_| array.append().unwrap()).collect();
        assert_eq!(array.num(), 5);
        for (i, &item) in items.iter().enumerate() {
            assert_eq!(array.get_child_at(i as i32), item);
        }
        for (i, &item) in items.iter().enumerate() {
            assert_eq!(pool.name_of(item), item_name(i as i32));
        }
    }

    #[test]
    fn append_front_renumbers() {
        let mut pool = pool();
        let list = pool.find_or_create(None, "Feed");
        let mut array = pool.make_array(list, false).unwrap();
        let first = array.append().unwrap();
        let second = array.append().unwrap();
        let front = array.append_front().unwrap();

        assert_eq!(array.num(), 3);
        assert_eq!(array.get_child_at(0), front);
        assert_eq!(array.get_child_at(1), first);
        assert_eq!(array.get_child_at(2), second);
        assert_eq!(
            array.as_view().elements().collect::<Vec<_>>(),
            vec![front, first, second]
        );
    }

    #[test]
    fn out_of_range_yields_sink() {
        let mut pool = pool();
        let list = pool.find_or_create(None, "L");
        let mut array = pool.make_array(list, false).unwrap();
        array.append();
        assert_eq!(array.get_child_at(1), NodeId::INVALID);
        assert_eq!(array.get_child_at(-1), NodeId::INVALID);
    }

    #[test]
    fn num_is_zero_for_plain_nodes() {
        let mut pool = pool();
        let plain = pool.find_or_create(None, "Plain");
        pool.set_value(plain, String::from("x"));
        assert!(pool.array(plain).is_none());
        assert!(!pool.is_array(plain));
        assert_eq!(count_of(&pool, plain), 0);
    }

    #[test]
    fn make_array_replaces_foreign_value_with_one_event() {
        let mut pool = pool();
        let node = pool.find_or_create(None, "N");
        pool.set_value(node, String::from("x"));
        pool.drain_events().for_each(drop);

        let array = pool.make_array(node, false).unwrap();
        assert_eq!(array.num(), 0);
        let changes = pool
            .drain_events()
            .filter(|e| matches!(e, PoolEvent::ValueChanged(_)))
            .count();
        // Clearing and the zero count are two journal entries for one node;
        // the monitor collapses them into one queued ValueSet.
        assert_eq!(changes, 2);
    }

    #[test]
    fn empty_with_and_without_destroy() {
        let mut pool = pool();
        let list = pool.find_or_create(None, "L");
        let mut array = pool.make_array(list, false).unwrap();
        let kept = array.append().unwrap();
        array.append();

        array.empty(false);
        assert_eq!(array.num(), 0);
        assert_eq!(array.append(), Some(kept), "kept element is reused");

        array.empty(true);
        assert_eq!(array.num(), 0);
        assert_eq!(pool.child_count(list), 0);
        assert!(pool.get(kept).is_none());
    }

    #[test]
    fn make_array_can_destroy_existing_children() {
        let mut pool = pool();
        let stale = pool.find_or_create(None, "L.Old");
        let list = pool.find(None, "L").unwrap();
        pool.make_array(list, true).unwrap();
        assert!(pool.get(stale).is_none());
        assert!(pool.is_array(list));
    }

    #[test]
    fn full_pool_leaves_count_untouched() {
        let mut pool = DatasourcePool::new(&PoolConfig::with_capacity(4)).unwrap();
        let list = pool.find_or_create(None, "L");
        let mut array = pool.make_array(list, false).unwrap();
        assert!(array.append().is_some());
        assert_eq!(array.append(), None);
        assert_eq!(array.append_front(), None);
        assert_eq!(array.num(), 1);
    }

    #[test]
    fn append_refuses_a_foreign_count_until_emptied() {
        let mut pool = pool();
        let list = pool.find_or_create(None, "L");
        let first = pool.make_array(list, false).unwrap().append().unwrap();
        pool.clear_value(list);
        pool.set_value(list, String::from("oops"));

        let mut array = pool.array_mut(list).unwrap();
        assert_eq!(array.append(), None);
        assert_eq!(array.append_front(), None);
        assert_eq!(array.num(), 0);

        array.empty(false);
        assert_eq!(array.append(), Some(first));
        assert_eq!(array.append().map(|c| c == first), Some(false));
        assert_eq!(array.num(), 2);
    }

    #[test]
    fn append_on_a_cleared_count_starts_from_zero() {
        let mut pool = pool();
        let list = pool.find_or_create(None, "L");
        let first = pool.make_array(list, false).unwrap().append().unwrap();
        pool.clear_value(list);

        let mut array = pool.array_mut(list).unwrap();
        assert_eq!(array.append(), Some(first));
        assert_eq!(array.num(), 1);
    }

    #[test]
    fn sink_cannot_become_an_array() {
        let mut pool = pool();
        assert!(pool.make_array(NodeId::INVALID, false).is_none());
        assert!(pool.array_mut(NodeId::INVALID).is_none());
    }
}
