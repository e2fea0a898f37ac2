use super::AvlTree;
use crate::comparator::NaturalOrder;
use crate::raw::RawAvlTree;

impl<T> AvlTree<T> {
    /// Creates an empty tree with room for at least `capacity` nodes.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let tree: AvlTree<i32> = AvlTree::with_capacity(16);
    /// assert!(tree.is_empty());
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

impl<T, C> AvlTree<T, C> {
    /// Creates an empty tree ordered by `cmp`, with room for at least `capacity` nodes.
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        AvlTree {
            raw: RawAvlTree::with_capacity(capacity),
            cmp,
        }
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    ///
    /// Slots freed by removals are reused before the arena grows.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let tree: AvlTree<i32> = AvlTree::with_capacity(32);
    /// assert!(tree.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
