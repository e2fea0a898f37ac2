use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use core::ops::{Bound, Index, RangeBounds};

use crate::audit::{AuditError, audit};
use crate::comparator::{Comparator, NaturalOrder};
use crate::cursor;
use crate::node_ref::{NodeId, NodeRef};
use crate::raw::{Dir, RawAvlTree};

mod capacity;

/// An ordered map backed by an [AVL tree].
///
/// Entries are kept in the order the comparator `C` defines over the keys; by default that is the
/// keys' own [`Ord`] implementation ([`NaturalOrder`]). Each entry lives in one arena node whose
/// [`NodeId`] stays the same for as long as the key is present, including when its value is
/// replaced.
///
/// It is a logic error for a key to be modified in such a way that its ordering relative to any
/// other key, as determined by the comparator, changes while it is in the map. The behavior
/// resulting from such a logic error is not specified, but will be encapsulated to the `AvlMap`
/// that observed the logic error and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use avl_arena::AvlMap;
///
/// let mut scores = AvlMap::new();
/// scores.insert("Carol", 92);
/// scores.insert("Alice", 100);
/// scores.insert("Bob", 85);
///
/// assert_eq!(scores.get(&"Bob"), Some(&85));
/// assert_eq!(scores.insert("Bob", 88), Some(85));
/// assert_eq!(scores.first_key_value(), Some((&"Alice", &100)));
///
/// // Neighbours of a key that is not in the map.
/// let (below, exact, above) = scores.interval(&"Bz");
/// assert_eq!(below, Some((&"Bob", &88)));
/// assert_eq!(exact, None);
/// assert_eq!(above, Some((&"Carol", &92)));
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlMap<K, V, C = NaturalOrder> {
    raw: RawAvlTree<(K, V)>,
    cmp: C,
}

type Entry<'a, K, V> = Option<(&'a K, &'a V)>;

fn pair<K, V>((key, value): &(K, V)) -> (&K, &V) {
    (key, value)
}

impl<K, V> AvlMap<K, V> {
    /// Makes a new, empty `AvlMap` ordered by `K`'s [`Ord`] implementation.
    ///
    /// Does not allocate anything on its own.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> AvlMap<K, V, C> {
    /// Makes a new, empty `AvlMap` whose keys are ordered by `cmp`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlMap;
    ///
    /// let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
    /// let mut map = AvlMap::with_comparator(by_len);
    /// map.insert("three", 3);
    /// map.insert("one", 1);
    /// // "two" has the same length as "one", so it replaces its value.
    /// assert_eq!(map.insert("two", 2), Some(1));
    /// assert_eq!(map.get(&"six"), Some(&2));
    /// ```
    #[must_use]
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            raw: RawAvlTree::new(),
            cmp,
        }
    }

    /// Returns the comparator the map was built with.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the number of levels in the underlying tree; 0 when empty.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns a read-only view of the root node. Node values are `(key, value)` pairs.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_, (K, V)>> {
        NodeRef::root_of(&self.raw)
    }

    /// Returns the entry held by node `id`, if that node is still in the map.
    #[must_use]
    pub fn get_by_id(&self, id: NodeId) -> Option<(&K, &V)> {
        self.raw.try_node(id.0).map(|node| pair(node.value()))
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.extreme(Dir::Left).map(|handle| pair(self.raw.node(handle).value()))
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.extreme(Dir::Right).map(|handle| pair(self.raw.node(handle).value()))
    }

    /// Removes and returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlMap;
    ///
    /// let mut map = AvlMap::from([(2, 'b'), (1, 'a')]);
    /// assert_eq!(map.pop_first(), Some((1, 'a')));
    /// assert_eq!(map.pop_first(), Some((2, 'b')));
    /// assert_eq!(map.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.raw.remove_extreme(Dir::Left)
    }

    /// Removes and returns the entry with the largest key.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.raw.remove_extreme(Dir::Right)
    }

    /// Gets an iterator over the entries, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: cursor::Iter::new(&self.raw),
        }
    }

    /// Gets an iterator over the keys, in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values, in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns a cursor positioned on the entry with the smallest key.
    pub fn cursor_first(&self) -> Cursor<'_, K, V> {
        Cursor {
            inner: cursor::Cursor::new(&self.raw, self.raw.seek_extreme(Dir::Left)),
        }
    }

    /// Returns a cursor positioned on the entry with the largest key.
    pub fn cursor_last(&self) -> Cursor<'_, K, V> {
        Cursor {
            inner: cursor::Cursor::new(&self.raw, self.raw.seek_extreme(Dir::Right)),
        }
    }
}

impl<K, V, C: Comparator<K>> AvlMap<K, V, C> {
    /// Inserts a key-value pair.
    ///
    /// If the map already held an equal key, its value is replaced and the old value returned; the
    /// stored key and the entry's node are kept. Otherwise a new node is linked in and `None` is
    /// returned.
    ///
    /// # Complexity
    ///
    /// O(log n), with at most one rotation.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.raw.search_insert(|(node, _)| self.cmp.compare(&key, node)) {
            Ok(existing) => Some(mem::replace(&mut self.raw.value_mut(existing).1, value)),
            Err(point) => {
                let handle = self.raw.insert_at(point, (key, value));
                self.raw.debug_check_order(handle, |(a, _), (b, _)| self.cmp.compare(a, b));
                None
            }
        }
    }

    /// Returns the id of the node holding `key`.
    #[must_use]
    pub fn find_id(&self, key: &K) -> Option<NodeId> {
        self.raw.search(|(node, _)| self.cmp.compare(key, node)).map(NodeId)
    }

    /// Returns a reference to the value for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and the value for `key`.
    #[must_use]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw
            .search(|(node, _)| self.cmp.compare(key, node))
            .map(|handle| pair(self.raw.node(handle).value()))
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlMap;
    ///
    /// let mut map = AvlMap::from([(1, "a")]);
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let handle = self.raw.search(|(node, _)| self.cmp.compare(key, node))?;
        Some(&mut self.raw.value_mut(handle).1)
    }

    /// Returns `true` if the map holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_id(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the stored key together with its value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let cmp = &self.cmp;
        self.raw.remove_with(|(node, _)| cmp.compare(key, node))
    }

    /// Returns the entries with the greatest key below `key`, with `key` itself, and with the
    /// least key above `key`, in a single descent.
    ///
    /// When `key` is present all three are its entry.
    #[must_use]
    pub fn interval(&self, key: &K) -> (Entry<'_, K, V>, Entry<'_, K, V>, Entry<'_, K, V>) {
        let bounds = self.raw.interval(|(node, _)| self.cmp.compare(key, node));
        let entry = |handle: Option<_>| handle.map(|handle| pair(self.raw.node(handle).value()));
        (entry(bounds.lower), entry(bounds.exact), entry(bounds.upper))
    }

    /// Returns a cursor on `key`, or on the last entry visited while searching for it.
    pub fn cursor(&self, key: &K) -> Cursor<'_, K, V> {
        Cursor {
            inner: cursor::Cursor::new(&self.raw, self.raw.seek(|(node, _)| self.cmp.compare(key, node))),
        }
    }

    /// Constructs a double-ended iterator over the entries whose keys fall within `range`.
    ///
    /// # Panics
    ///
    /// Panics if the range's start is after its end, or if start and end are equal and both
    /// excluded.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_arena::AvlMap;
    ///
    /// let map: AvlMap<i32, char> = (0..26).zip('a'..='z').collect();
    /// let letters: String = map.range(7..=11).map(|(_, c)| c).collect();
    /// assert_eq!(letters, "hijkl");
    /// ```
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Range<'_, K, V> {
        cursor::validate_range_bounds(&range, |a, b| self.cmp.compare(a, b), "AvlMap");

        let key_cmp = |(node, _): &(K, V), bound: &K| self.cmp.compare(node, bound);
        let front = match range.start_bound() {
            Bound::Included(start) => self.raw.seek_boundary(|entry| key_cmp(entry, start).is_lt(), Dir::Right),
            Bound::Excluded(start) => self.raw.seek_boundary(|entry| key_cmp(entry, start).is_le(), Dir::Right),
            Bound::Unbounded => self.raw.seek_extreme(Dir::Left),
        };
        let back = match range.end_bound() {
            Bound::Included(end) => self.raw.seek_boundary(|entry| key_cmp(entry, end).is_gt(), Dir::Left),
            Bound::Excluded(end) => self.raw.seek_boundary(|entry| key_cmp(entry, end).is_ge(), Dir::Left),
            Bound::Unbounded => self.raw.seek_extreme(Dir::Right),
        };

        let (Some(&first), Some(&last)) = (front.last(), back.last()) else {
            return Range {
                inner: cursor::Range::empty(&self.raw),
            };
        };
        let inner = if key_cmp(self.raw.node(first).value(), &self.raw.node(last).value().0).is_le() {
            cursor::Range::new(cursor::Cursor::new(&self.raw, front), cursor::Cursor::new(&self.raw, back))
        } else {
            cursor::Range::empty(&self.raw)
        };
        Range { inner }
    }

    /// Checks the tree invariants over the keys and returns the tree's height.
    ///
    /// # Errors
    ///
    /// Returns the first defect found, which only happens if the comparator is not a total order.
    pub fn audit(&self) -> Result<usize, AuditError> {
        audit(&self.raw, |(a, _), (b, _)| self.cmp.compare(a, b))
    }
}

impl<K, V, C: Comparator<K>> Index<&K> for AvlMap<K, V, C> {
    type Output = V;

    /// Returns a reference to the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for AvlMap<K, V, C> {
    fn clone(&self) -> Self {
        AvlMap {
            raw: self.raw.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for AvlMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for AvlMap<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AvlMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Default> Default for AvlMap<K, V, C> {
    fn default() -> Self {
        AvlMap::with_comparator(C::default())
    }
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for AvlMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AvlMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for AvlMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, K, V, C> IntoIterator for &'a AvlMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

// ─── Cursor ─────────────────────────────────────────────────────────────────

/// A bidirectional position in an [`AvlMap`].
///
/// Created by [`AvlMap::cursor`], [`AvlMap::cursor_first`] and [`AvlMap::cursor_last`].
///
/// # Examples
///
/// ```
/// use avl_arena::AvlMap;
///
/// let map = AvlMap::from([(1, "one"), (3, "three"), (5, "five")]);
/// let mut cursor = map.cursor(&4);
/// // 4 is missing; the search ended on one of its neighbours.
/// if cursor.get().is_some_and(|(&k, _)| k > 4) {
///     cursor.move_prev();
/// }
/// assert_eq!(cursor.get(), Some((&3, &"three")));
/// ```
pub struct Cursor<'a, K, V> {
    inner: cursor::Cursor<'a, (K, V)>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Returns the entry under the cursor.
    #[must_use]
    pub fn get(&self) -> Option<(&'a K, &'a V)> {
        self.inner.get().map(pair)
    }

    /// Returns the identity of the node under the cursor.
    #[must_use]
    pub fn id(&self) -> Option<NodeId> {
        self.inner.id()
    }

    /// Returns `true` if the cursor is positioned on an entry.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// Moves to the next entry in key order. Returns whether the cursor still has a position.
    pub fn move_next(&mut self) -> bool {
        self.inner.move_next()
    }

    /// Moves to the previous entry in key order. Returns whether the cursor still has a position.
    pub fn move_prev(&mut self) -> bool {
        self.inner.move_prev()
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

// ─── Iterators ──────────────────────────────────────────────────────────────

/// An iterator over the entries of an [`AvlMap`], sorted by key.
///
/// This `struct` is created by the [`iter`](AvlMap::iter) method on [`AvlMap`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    inner: cursor::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next().map(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next_back().map(pair)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over a sub-range of the entries of an [`AvlMap`].
///
/// This `struct` is created by the [`range`](AvlMap::range) method on [`AvlMap`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    inner: cursor::Range<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next().map(pair)
    }
}

impl<'a, K, V> DoubleEndedIterator for Range<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next_back().map(pair)
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Range<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the keys of an [`AvlMap`], in order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the values of an [`AvlMap`], in key order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
