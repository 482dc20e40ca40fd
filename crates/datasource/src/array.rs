//! Handle-based access to array nodes.

use datasource_core::Handle;

use crate::store::Store;

impl Store {
    /// Turn a node into an empty array, optionally destroying its children.
    /// Returns `false` for the Sink and stale handles.
    pub fn make_array(&mut self, handle: Handle, destroy_children: bool) -> bool {
        let id = self.pool().live_id(handle);
        let made = self.pool_mut().make_array(id, destroy_children).is_some();
        self.flush();
        made
    }

    /// Whether `handle` refers to a live array node.
    pub fn is_array(&self, handle: Handle) -> bool {
        self.pool().is_array(self.pool().live_id(handle))
    }

    /// Element count; 0 for anything that is not an array.
    pub fn array_num(&self, handle: Handle) -> i32 {
        let pool = self.pool();
        pool.array(pool.live_id(handle)).map_or(0, |array| array.num())
    }

    /// Element at `index`, or [`Handle::INVALID`] when out of range.
    pub fn array_child_at(&self, handle: Handle, index: i32) -> Handle {
        let pool = self.pool();
        let Some(array) = pool.array(pool.live_id(handle)) else {
            return Handle::INVALID;
        };
        pool.node(array.get_child_at(index)).handle()
    }

    /// Add an element at the end. `None` when `handle` is not an array or
    /// the pool is full.
    pub fn array_append(&mut self, handle: Handle) -> Option<Handle> {
        self.append_with(handle, false)
    }

    /// Add an element at index 0, shifting the others up.
    pub fn array_append_front(&mut self, handle: Handle) -> Option<Handle> {
        self.append_with(handle, true)
    }

    fn append_with(&mut self, handle: Handle, front: bool) -> Option<Handle> {
        let id = self.pool().live_id(handle);
        let child = self.pool_mut().array_mut(id).and_then(|mut array| {
            if front {
                array.append_front()
            } else {
                array.append()
            }
        });
        let child = child.map(|c| self.pool().node(c).handle());
        self.flush();
        child
    }

    /// Reset the count to zero, destroying the elements if asked.
    pub fn array_empty(&mut self, handle: Handle, destroy_children: bool) {
        let id = self.pool().live_id(handle);
        if let Some(mut array) = self.pool_mut().array_mut(id) {
            array.empty(destroy_children);
        }
        self.flush();
    }

    /// Element handles in index order, for list adapters.
    ///
    /// The result is padded with [`Handle::INVALID`] up to `pad_up_to`
    /// entries, then up to the next multiple of `keep_multiple_of` when that
    /// is non-zero. Anything that is not an array yields an empty list.
    pub fn array_to_handles(
        &self,
        handle: Handle,
        pad_up_to: usize,
        keep_multiple_of: usize,
    ) -> Vec<Handle> {
        let pool = self.pool();
        let Some(array) = pool.array(pool.live_id(handle)) else {
            return Vec::new();
        };
        let mut handles: Vec<Handle> = array
            .elements()
            .map(|id| pool.node(id).handle())
            .collect();

        if handles.len() < pad_up_to {
            handles.resize(pad_up_to, Handle::INVALID);
        }
        if keep_multiple_of > 0 {
            let len = handles.len().next_multiple_of(keep_multiple_of);
            handles.resize(len, Handle::INVALID);
        }
        handles
    }
}

#[cfg(test)]
mod tests {
    use crate::store::Store;
    use datasource_core::Handle;

    #[test]
    fn append_and_index() {
        let mut store = Store::default();
        let list = store.find_or_create(Handle::INVALID, "Inventory");
        assert!(store.make_array(list, false));
        let a = store.array_append(list).unwrap();
        let b = store.array_append(list).unwrap();
        let front = store.array_append_front(list).unwrap();

        assert_eq!(store.array_num(list), 3);
        assert_eq!(store.array_child_at(list, 0), front);
        assert_eq!(store.array_child_at(list, 1), a);
        assert_eq!(store.array_child_at(list, 2), b);
        assert_eq!(store.array_child_at(list, 3), Handle::INVALID);
        assert_eq!(store.name_of(b), "Item#2");
    }

    #[test]
    fn non_arrays_are_inert() {
        let mut store = Store::default();
        let plain = store.find_or_create(Handle::INVALID, "Plain");
        assert!(!store.is_array(plain));
        assert_eq!(store.array_num(plain), 0);
        assert_eq!(store.array_append(plain), None);
        assert!(store.array_to_handles(plain, 4, 2).is_empty());
        assert!(!store.make_array(Handle::INVALID, false));
    }

    #[test]
    fn to_handles_pads() {
        let mut store = Store::default();
        let list = store.find_or_create(Handle::INVALID, "L");
        store.make_array(list, false);
        let items: Vec<_> = (0..3).filter_map(|_| store.array_append(list)).collect();

        assert_eq!(store.array_to_handles(list, 0, 0), items);

        let padded = store.array_to_handles(list, 5, 0);
        assert_eq!(padded.len(), 5);
        assert_eq!(&padded[..3], &items[..]);
        assert!(padded[3..].iter().all(|h| *h == Handle::INVALID));

        assert_eq!(store.array_to_handles(list, 0, 4).len(), 4);
        assert_eq!(store.array_to_handles(list, 5, 4).len(), 8);
        assert_eq!(store.array_to_handles(list, 0, 3).len(), 3);
    }

    #[test]
    fn empty_with_destroy_kills_elements() {
        let mut store = Store::default();
        let list = store.find_or_create(Handle::INVALID, "L");
        store.make_array(list, false);
        let item = store.array_append(list).unwrap();
        store.array_empty(list, true);
        assert_eq!(store.array_num(list), 0);
        assert!(!store.is_alive(item));
    }
}
