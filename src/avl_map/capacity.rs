use super::AvlMap;
use crate::comparator::NaturalOrder;
use crate::raw::RawAvlTree;

impl<K, V> AvlMap<K, V> {
    /// Creates an empty map with room for at least `capacity` entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlMap;
    ///
    /// let map: AvlMap<i32, &str> = AvlMap::with_capacity(16);
    /// assert!(map.is_empty());
    /// assert!(map.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, NaturalOrder)
    }
}

impl<K, V, C> AvlMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`, with room for at least `capacity` entries.
    #[must_use]
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        AvlMap {
            raw: RawAvlTree::with_capacity(capacity),
            cmp,
        }
    }

    /// Returns the number of entries the map can hold without reallocating.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
