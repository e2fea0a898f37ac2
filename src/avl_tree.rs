use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{Bound, RangeBounds};

use crate::audit::{AuditError, audit};
use crate::comparator::{Comparator, NaturalOrder};
use crate::node_ref::{NodeId, NodeRef};
use crate::raw::{Dir, RawAvlTree};

mod capacity;

use crate::cursor::validate_range_bounds;
pub use crate::cursor::{Cursor, Iter, Range};

/// An ordered set backed by an [AVL tree].
///
/// Values are kept in the order defined by the comparator `C`, which defaults to the values' own
/// [`Ord`] implementation ([`NaturalOrder`]); any `Fn(&T, &T) -> Ordering` closure can be used
/// instead through [`AvlTree::with_comparator`].
///
/// Insertion, removal, exact lookup and predecessor/successor lookup take O(log n) comparisons:
/// the tree keeps, at every node, the heights of the two subtrees within one of each other.
/// Nodes live in an arena and are addressed by stable [`NodeId`]s, which [`insert`] returns.
///
/// It is a logic error for a value to be modified in such a way that its ordering relative to any
/// other value, as determined by the comparator, changes while it is in the tree. The behavior
/// resulting from such a logic error is not specified, but will be encapsulated to the `AvlTree`
/// that observed the logic error and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use avl_arena::AvlTree;
///
/// let mut tree = AvlTree::new();
/// for key in [40, 20, 60, 10, 30, 45, 70, 42] {
///     tree.insert(key);
/// }
/// assert_eq!(tree.len(), 8);
///
/// // Duplicates are ignored and hand back the node already holding the value.
/// let id = tree.find_id(&42).unwrap();
/// assert_eq!(tree.insert(42), id);
/// assert_eq!(tree.len(), 8);
///
/// // Predecessor, match and successor in one descent.
/// assert_eq!(tree.interval(&43), (Some(&42), None, Some(&45)));
///
/// assert_eq!(tree.erase(&40), Some(40));
/// assert_eq!(tree.erase(&40), None);
/// assert!(tree.audit().is_ok());
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
/// [`insert`]: AvlTree::insert
pub struct AvlTree<T, C = NaturalOrder> {
    raw: RawAvlTree<T>,
    cmp: C,
}

impl<T> AvlTree<T> {
    /// Makes a new, empty `AvlTree` ordered by `T`'s [`Ord`] implementation.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert("a");
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T, C> AvlTree<T, C> {
    /// Makes a new, empty `AvlTree` ordered by `cmp`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let mut tree = AvlTree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    /// tree.extend([1, 3, 2]);
    /// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
    /// ```
    #[must_use]
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            raw: RawAvlTree::new(),
            cmp,
        }
    }

    /// Returns the comparator the tree was built with.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the number of values in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes all values.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the number of levels in the tree; 0 when empty.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns a read-only view of the root node, for walking the tree's structure.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_, T>> {
        NodeRef::root_of(&self.raw)
    }

    /// Returns the value held by the node `id`, if that node is still in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// let id = tree.insert(7);
    /// assert_eq!(tree.get(id), Some(&7));
    /// tree.erase(&7);
    /// assert_eq!(tree.get(id), None);
    /// ```
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.raw.try_node(id.0).map(|node| node.value())
    }

    /// Returns the smallest value.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.raw.extreme(Dir::Left).map(|handle| self.raw.node(handle).value())
    }

    /// Returns the largest value.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.raw.extreme(Dir::Right).map(|handle| self.raw.node(handle).value())
    }

    /// Removes and returns the smallest value.
    ///
    /// Returns `None`, without touching the tree, if it is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let mut tree = AvlTree::from([2, 1]);
    /// assert_eq!(tree.pop_first(), Some(1));
    /// assert_eq!(tree.pop_first(), Some(2));
    /// assert_eq!(tree.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<T> {
        self.raw.remove_extreme(Dir::Left)
    }

    /// Removes and returns the largest value.
    pub fn pop_last(&mut self) -> Option<T> {
        self.raw.remove_extreme(Dir::Right)
    }

    /// Gets an iterator that visits the values in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let tree = AvlTree::from([3, 1, 2]);
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next_back(), Some(&3));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.raw)
    }

    /// Returns a cursor positioned on the smallest value.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::new(&self.raw, self.raw.seek_extreme(Dir::Left))
    }

    /// Returns a cursor positioned on the largest value.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        Cursor::new(&self.raw, self.raw.seek_extreme(Dir::Right))
    }
}

impl<T, C: Comparator<T>> AvlTree<T, C> {
    /// Adds a value to the tree and returns the id of the node holding it.
    ///
    /// If an equal value is already present the tree is left unchanged, `value` is dropped, and
    /// the existing node's id is returned.
    ///
    /// # Complexity
    ///
    /// O(log n), with at most one rotation.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// let first = tree.insert(5);
    /// let again = tree.insert(5);
    /// assert_eq!(first, again);
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> NodeId {
        match self.raw.search_insert(|node| self.cmp.compare(&value, node)) {
            Ok(existing) => NodeId(existing),
            Err(point) => {
                let handle = self.raw.insert_at(point, value);
                self.raw.debug_check_order(handle, |a, b| self.cmp.compare(a, b));
                NodeId(handle)
            }
        }
    }

    /// Returns the stored value equal to `value`.
    #[must_use]
    pub fn find(&self, value: &T) -> Option<&T> {
        self.raw.search(|node| self.cmp.compare(value, node)).map(|handle| self.raw.node(handle).value())
    }

    /// Returns the id of the node holding a value equal to `value`.
    #[must_use]
    pub fn find_id(&self, value: &T) -> Option<NodeId> {
        self.raw.search(|node| self.cmp.compare(value, node)).map(NodeId)
    }

    /// Returns `true` if the tree holds a value equal to `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.find_id(value).is_some()
    }

    /// Removes the value equal to `value` and returns it.
    ///
    /// Returns `None`, without touching the tree, if there is no such value. When the removed node
    /// has two children its in-order successor's node takes its place, keeping its id.
    ///
    /// # Complexity
    ///
    /// O(log n), with rotations possibly at every level.
    pub fn erase(&mut self, value: &T) -> Option<T> {
        let cmp = &self.cmp;
        self.raw.remove_with(|node| cmp.compare(value, node))
    }

    /// Returns a cursor on the value equal to `value`.
    ///
    /// If there is none, the cursor stops on the last node the search visited, which is either
    /// the greatest smaller value or the least greater value. An empty tree yields a cursor with no
    /// position.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let tree: AvlTree<_> = "MNOLKQOPHIA".chars().collect();
    /// let mut cursor = tree.cursor(&'K');
    /// let mut rest = String::new();
    /// while let Some(&c) = cursor.get() {
    ///     rest.push(c);
    ///     cursor.move_next();
    /// }
    /// assert_eq!(rest, "KLMNOPQ");
    /// ```
    pub fn cursor(&self, value: &T) -> Cursor<'_, T> {
        Cursor::new(&self.raw, self.raw.seek(|node| self.cmp.compare(value, node)))
    }

    /// Returns `(lower, exact, upper)` for `value` in a single descent.
    ///
    /// `lower` is the greatest stored value below `value` and `upper` the least one above it;
    /// when `value` itself is stored all three are that value.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let tree = AvlTree::from([10, 20, 30]);
    /// assert_eq!(tree.interval(&25), (Some(&20), None, Some(&30)));
    /// assert_eq!(tree.interval(&20), (Some(&20), Some(&20), Some(&20)));
    /// assert_eq!(tree.interval(&5), (None, None, Some(&10)));
    /// ```
    #[must_use]
    pub fn interval(&self, value: &T) -> (Option<&T>, Option<&T>, Option<&T>) {
        let bounds = self.raw.interval(|node| self.cmp.compare(value, node));
        let value_of = |handle: Option<_>| handle.map(|handle| self.raw.node(handle).value());
        (value_of(bounds.lower), value_of(bounds.exact), value_of(bounds.upper))
    }

    /// Constructs a double-ended iterator over the values within `range`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the range's start is after its end, or if start and end are equal and both
    /// excluded.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlTree;
    ///
    /// let tree: AvlTree<i32> = (1..=10).collect();
    /// assert_eq!(tree.range(3..6).copied().collect::<Vec<_>>(), [3, 4, 5]);
    /// assert_eq!(tree.range(8..).rev().copied().collect::<Vec<_>>(), [10, 9, 8]);
    /// ```
    pub fn range<R: RangeBounds<T>>(&self, range: R) -> Range<'_, T> {
        validate_range_bounds(&range, |a, b| self.cmp.compare(a, b), "AvlTree");

        let front = match range.start_bound() {
            Bound::Included(start) => self.raw.seek_boundary(|v| self.cmp.compare(v, start).is_lt(), Dir::Right),
            Bound::Excluded(start) => self.raw.seek_boundary(|v| self.cmp.compare(v, start).is_le(), Dir::Right),
            Bound::Unbounded => self.raw.seek_extreme(Dir::Left),
        };
        let back = match range.end_bound() {
            Bound::Included(end) => self.raw.seek_boundary(|v| self.cmp.compare(v, end).is_gt(), Dir::Left),
            Bound::Excluded(end) => self.raw.seek_boundary(|v| self.cmp.compare(v, end).is_ge(), Dir::Left),
            Bound::Unbounded => self.raw.seek_extreme(Dir::Right),
        };

        let (Some(&first), Some(&last)) = (front.last(), back.last()) else {
            return Range::empty(&self.raw);
        };
        if self.cmp.compare(self.raw.node(first).value(), self.raw.node(last).value()) == Ordering::Greater {
            return Range::empty(&self.raw);
        }
        Range::new(Cursor::new(&self.raw, front), Cursor::new(&self.raw, back))
    }

    /// Walks the whole tree and checks its invariants: every stored balance factor matches the
    /// measured subtree heights and stays within `-1..=1`, values are strictly ordered, and
    /// [`len`](Self::len) matches the number of reachable nodes.
    ///
    /// Returns the tree's height.
    ///
    /// # Errors
    ///
    /// Returns the first defect found. This only happens if the comparator is not a total order.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn audit(&self) -> Result<usize, AuditError> {
        audit(&self.raw, |a, b| self.cmp.compare(a, b))
    }
}

impl<T: Clone, C: Clone> Clone for AvlTree<T, C> {
    fn clone(&self) -> Self {
        AvlTree {
            raw: self.raw.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<T: Hash, C> Hash for AvlTree<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for value in self {
            value.hash(state);
        }
    }
}

impl<T: PartialEq, C> PartialEq for AvlTree<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for AvlTree<T, C> {}

impl<T: fmt::Debug, C> fmt::Debug for AvlTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C: Default> Default for AvlTree<T, C> {
    fn default() -> Self {
        AvlTree::with_comparator(C::default())
    }
}

impl<T, C: Comparator<T> + Default> FromIterator<T> for AvlTree<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = AvlTree::default();
        tree.extend(iter);
        tree
    }
}

impl<T, C: Comparator<T>> Extend<T> for AvlTree<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for AvlTree<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T, C> IntoIterator for &'a AvlTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn new_tree_is_empty() {
        let tree: AvlTree<i32> = AvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.root().is_none());
        assert_eq!(tree.first(), None);
        assert!(!tree.cursor_first().is_valid());
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.range(..).next(), None);
    }

    #[test]
    fn clear_resets_everything() {
        let mut tree: AvlTree<i32> = (0..50).collect();
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.audit(), Ok(0));
        tree.insert(3);
        assert_eq!(tree.first(), Some(&3));
    }

    #[test]
    fn range_positions_on_missing_bounds() {
        let tree: AvlTree<i32> = (0..20).map(|x| x * 5).collect();
        let got: Vec<_> = tree.range(12..=31).copied().collect();
        assert_eq!(got, [15, 20, 25, 30]);

        let got: Vec<_> = tree.range((Bound::Excluded(15), Bound::Excluded(30))).copied().collect();
        assert_eq!(got, [20, 25]);

        assert_eq!(tree.range(11..14).next(), None);
        assert_eq!(tree.range(200..).next(), None);
        assert_eq!(tree.range(..0).next(), None);
        assert_eq!(tree.range(95..=95).collect::<Vec<_>>(), [&95]);
    }

    #[test]
    fn range_meets_in_the_middle() {
        let tree: AvlTree<i32> = (0..6).collect();
        let mut range = tree.range(1..5);
        assert_eq!(range.next(), Some(&1));
        assert_eq!(range.next_back(), Some(&4));
        assert_eq!(range.next_back(), Some(&3));
        assert_eq!(range.next(), Some(&2));
        assert_eq!(range.next(), None);
        assert_eq!(range.next_back(), None);
    }

    #[test]
    #[should_panic(expected = "range start is greater than range end in AvlTree")]
    fn inverted_range_panics() {
        let tree: AvlTree<i32> = (0..6).collect();
        let _ = tree.range(4..2);
    }

    #[test]
    fn custom_comparator_orders_everything() {
        let mut tree = AvlTree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
        tree.extend(0..10);
        assert_eq!(tree.first(), Some(&9));
        assert_eq!(tree.last(), Some(&0));
        assert_eq!(tree.interval(&4), (Some(&4), Some(&4), Some(&4)));
        assert_eq!(tree.range(7..=3).copied().collect::<Vec<_>>(), [7, 6, 5, 4, 3]);
        assert_eq!(tree.audit(), Ok(tree.height()));
    }

    #[test]
    fn equality_ignores_shape() {
        let ascending: AvlTree<i32> = (0..32).collect();
        let descending: AvlTree<i32> = (0..32).rev().collect();
        assert_eq!(ascending, descending);

        let mut other = descending.clone();
        other.erase(&7);
        assert_ne!(ascending, other);
    }
}
