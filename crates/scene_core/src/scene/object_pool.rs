//! Generic dense object pool
//!
//! One pool per object kind. Records live gap-free in insertion order so the
//! renderer can iterate them linearly; an [`ObjectMap`] translates stable
//! handles to their current slot.
//!
//! Removal shifts every later record down by one slot and re-points each
//! shifted id at its new slot. Removal is O(n), but the relative order of the
//! survivors is preserved (light order is shader-visible) and every other
//! live handle keeps resolving to its own record.

use super::error::{SceneError, SceneResult};
use super::handle::{Handle, PoolRecord};
use super::object_map::ObjectMap;

/// Growable dense array of records plus its id map
#[derive(Debug, Clone)]
pub struct ObjectPool<T: PoolRecord> {
    /// Live records, gap-free
    records: Vec<T>,
    /// Id of the record in the same dense slot
    ids: Vec<u32>,
    /// Id → slot translation
    map: ObjectMap,
    /// Allocated slot count; doubles when full
    capacity: usize,
}

impl<T: PoolRecord> ObjectPool<T> {
    /// Create an empty pool with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            map: ObjectMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Copy `record` into the next free slot and return its handle
    pub fn add(&mut self, record: T) -> Handle<T> {
        if self.records.len() == self.capacity {
            self.grow();
        }

        let dense_index = self.records.len();
        let id = self.map.allocate(dense_index);
        self.records.push(record);
        self.ids.push(id);
        Handle::from_id(id)
    }

    /// Remove the record behind `handle`, closing the gap in place
    pub fn remove(&mut self, handle: Handle<T>) -> SceneResult<T> {
        let slot = self.slot(handle)?;

        let record = self.records.remove(slot);
        self.ids.remove(slot);
        for (dense_index, &id) in self.ids.iter().enumerate().skip(slot) {
            self.map.set_index(id, dense_index);
        }
        self.map.release(handle.id());

        Ok(record)
    }

    /// Borrow the record behind `handle`
    pub fn get(&self, handle: Handle<T>) -> SceneResult<&T> {
        let slot = self.slot(handle)?;
        Ok(&self.records[slot])
    }

    /// Mutably borrow the record behind `handle`
    pub fn get_mut(&mut self, handle: Handle<T>) -> SceneResult<&mut T> {
        let slot = self.slot(handle)?;
        Ok(&mut self.records[slot])
    }

    /// Whether `handle` currently resolves to a record
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.map.index_of(handle.id()).is_some()
    }

    /// Current dense slot of `handle`
    pub fn index_of(&self, handle: Handle<T>) -> SceneResult<usize> {
        self.slot(handle)
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocated slot count
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live records in dense order
    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    /// Live records in dense order, for in-place edits that keep handles valid
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.records
    }

    /// Handle and record pairs in dense order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.ids
            .iter()
            .zip(self.records.iter())
            .map(|(&id, record)| (Handle::from_id(id), record))
    }

    /// Handles of live records in dense order
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.ids.iter().map(|&id| Handle::from_id(id))
    }

    /// Ids that the next adds will reuse, next one last
    pub fn available_ids(&self) -> &[u32] {
        self.map.available_ids()
    }

    fn slot(&self, handle: Handle<T>) -> SceneResult<usize> {
        self.map
            .index_of(handle.id())
            .filter(|&slot| slot < self.records.len())
            .ok_or(SceneError::HandleInvalid {
                kind: T::KIND,
                id: handle.id(),
            })
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity * 2;
        log::trace!("Growing {} pool: {} -> {}", T::KIND, self.capacity, new_capacity);

        self.records.reserve_exact(new_capacity - self.records.len());
        self.ids.reserve_exact(new_capacity - self.ids.len());
        self.map.grow(new_capacity);
        self.capacity = new_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::handle::ObjectKind;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag(&'static str);

    impl PoolRecord for Tag {
        const KIND: ObjectKind = ObjectKind::Light;
    }

    fn pool_of(names: &[&'static str]) -> (ObjectPool<Tag>, Vec<Handle<Tag>>) {
        let mut pool = ObjectPool::with_capacity(2);
        let handles = names.iter().map(|&n| pool.add(Tag(n))).collect();
        (pool, handles)
    }

    #[test]
    fn test_add_and_get() {
        let (pool, handles) = pool_of(&["a", "b"]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(handles[0]).unwrap(), &Tag("a"));
        assert_eq!(pool.get(handles[1]).unwrap(), &Tag("b"));
    }

    #[test]
    fn test_growth_doubles_capacity() {
        let (pool, handles) = pool_of(&["a", "b", "c", "d", "e"]);
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.get(handles[4]).unwrap(), &Tag("e"));
    }

    #[test]
    fn test_remove_preserves_order_and_fixes_indices() {
        let (mut pool, handles) = pool_of(&["a", "b", "c", "d", "e"]);

        let removed = pool.remove(handles[1]).unwrap();
        assert_eq!(removed, Tag("b"));

        let order: Vec<_> = pool.as_slice().iter().map(|t| t.0).collect();
        assert_eq!(order, ["a", "c", "d", "e"]);

        for (handle, name) in [(handles[0], "a"), (handles[2], "c"), (handles[3], "d"), (handles[4], "e")] {
            assert_eq!(pool.get(handle).unwrap(), &Tag(name));
        }
        assert_eq!(pool.index_of(handles[4]).unwrap(), 3);
    }

    #[test]
    fn test_removed_handle_is_invalid() {
        let (mut pool, handles) = pool_of(&["a", "b"]);
        pool.remove(handles[0]).unwrap();

        assert!(!pool.contains(handles[0]));
        assert!(matches!(
            pool.get(handles[0]),
            Err(SceneError::HandleInvalid { kind: ObjectKind::Light, id: 0 })
        ));
        assert!(pool.remove(handles[0]).is_err());
    }

    #[test]
    fn test_never_allocated_handle_is_invalid() {
        let (pool, _) = pool_of(&["a"]);
        assert!(pool.get(Handle::from_id(1)).is_err());
        assert!(pool.get(Handle::from_id(4096)).is_err());
    }

    #[test]
    fn test_freed_ids_reused_before_new_ones() {
        let (mut pool, handles) = pool_of(&["a", "b", "c", "d"]);
        pool.remove(handles[1]).unwrap();
        pool.remove(handles[2]).unwrap();

        let x = pool.add(Tag("x"));
        let y = pool.add(Tag("y"));
        let z = pool.add(Tag("z"));
        assert_eq!(x.id(), 2);
        assert_eq!(y.id(), 1);
        assert_eq!(z.id(), 4);

        let order: Vec<_> = pool.iter().map(|(h, t)| (h.id(), t.0)).collect();
        assert_eq!(order, [(0, "a"), (3, "d"), (2, "x"), (1, "y"), (4, "z")]);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let (mut pool, handles) = pool_of(&["a", "b"]);
        *pool.get_mut(handles[1]).unwrap() = Tag("B");
        assert_eq!(pool.as_slice()[1], Tag("B"));
    }
}
