//! Id to dense-slot translation
//!
//! The object map owns id lifetime for one pool. Freed ids are recycled
//! through a LIFO stack; only when the stack is empty is a new id minted, and
//! then it equals the dense index of the inserted record. The id table grows
//! on demand when an id falls past its end.

/// Id → dense slot table plus a free-id recycling stack
#[derive(Debug, Clone)]
pub struct ObjectMap {
    /// Slot of each id, `None` while the id is free or was never minted
    indices: Vec<Option<usize>>,
    /// Previously freed ids, reused last-in first-out
    available_ids: Vec<u32>,
}

impl ObjectMap {
    /// Create a map able to address `capacity` ids without growing
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: vec![None; capacity],
            available_ids: Vec::new(),
        }
    }

    /// Number of addressable ids
    pub fn capacity(&self) -> usize {
        self.indices.len()
    }

    /// Grow the table to `capacity` entries
    pub fn grow(&mut self, capacity: usize) {
        if capacity > self.indices.len() {
            self.indices.resize(capacity, None);
        }
    }

    /// Obtain an id for an object stored at `dense_index`
    ///
    /// Reuses the most recently freed id if there is one; otherwise the dense
    /// index itself becomes the id.
    pub fn allocate(&mut self, dense_index: usize) -> u32 {
        let id = self.available_ids.pop().unwrap_or_else(|| {
            u32::try_from(dense_index).unwrap_or_else(|_| panic!("object id space exhausted at {dense_index}"))
        });

        let slot = id as usize;
        if slot >= self.indices.len() {
            self.grow((slot + 1).next_power_of_two());
        }
        self.indices[slot] = Some(dense_index);
        id
    }

    /// Return `id` to the free stack; does not move any data
    pub fn release(&mut self, id: u32) {
        if let Some(entry) = self.indices.get_mut(id as usize) {
            // A free id must appear on the stack at most once.
            if entry.take().is_some() {
                self.available_ids.push(id);
            }
        }
    }

    /// Dense slot currently holding `id`
    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.indices.get(id as usize).copied().flatten()
    }

    /// Point `id` at a new dense slot after its record was relocated
    pub fn set_index(&mut self, id: u32, dense_index: usize) {
        if let Some(entry) = self.indices.get_mut(id as usize) {
            *entry = Some(dense_index);
        }
    }

    /// Ids waiting for reuse, next one last
    pub fn available_ids(&self) -> &[u32] {
        &self.available_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_follow_dense_index() {
        let mut map = ObjectMap::with_capacity(4);
        assert_eq!(map.allocate(0), 0);
        assert_eq!(map.allocate(1), 1);
        assert_eq!(map.allocate(2), 2);
        assert_eq!(map.index_of(1), Some(1));
        assert_eq!(map.index_of(3), None);
    }

    #[test]
    fn test_released_ids_are_reused_lifo() {
        let mut map = ObjectMap::with_capacity(4);
        for i in 0..4 {
            map.allocate(i);
        }
        map.release(1);
        map.release(3);
        assert_eq!(map.index_of(1), None);
        assert_eq!(map.available_ids(), &[1, 3]);

        assert_eq!(map.allocate(2), 3);
        assert_eq!(map.allocate(3), 1);
        assert_eq!(map.index_of(3), Some(2));
        assert_eq!(map.index_of(1), Some(3));
        assert!(map.available_ids().is_empty());
    }

    #[test]
    fn test_allocate_past_capacity_grows() {
        let mut map = ObjectMap::with_capacity(2);
        for i in 0..5 {
            map.allocate(i);
        }
        assert!(map.capacity() >= 5);
        assert_eq!(map.index_of(4), Some(4));
    }

    #[test]
    fn test_out_of_range_lookups_are_none() {
        let mut map = ObjectMap::with_capacity(2);
        map.allocate(0);
        map.release(0);
        map.release(0);
        assert_eq!(map.available_ids(), &[0]);
        assert_eq!(map.allocate(0), 0);

        assert_eq!(map.index_of(100), None);
        map.release(100);
        assert!(map.available_ids().is_empty());
        map.set_index(100, 0);
        assert_eq!(map.index_of(100), None);
    }
}
