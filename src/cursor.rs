use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::{Bound, RangeBounds};

use crate::node_ref::{NodeId, NodeRef};
use crate::raw::{Dir, Handle, RawAvlTree, Stack};

/// Panics if `range` is empty by construction: its start is after its end, or the two are equal
/// and both excluded. `cmp` orders the two bounds; `collection` names the caller in the message.
pub(crate) fn validate_range_bounds<T, R: RangeBounds<T>>(
    range: &R,
    cmp: impl FnOnce(&T, &T) -> Ordering,
    collection: &str,
) {
    if let (Bound::Included(start) | Bound::Excluded(start), Bound::Included(end) | Bound::Excluded(end)) =
        (range.start_bound(), range.end_bound())
    {
        let valid = match cmp(start, end) {
            Ordering::Less => true,
            Ordering::Equal => {
                !(matches!(range.start_bound(), Bound::Excluded(_)) && matches!(range.end_bound(), Bound::Excluded(_)))
            }
            Ordering::Greater => false,
        };
        assert!(valid, "range start is greater than range end in {collection}");
    }
}

/// A bidirectional position in an [`AvlTree`](crate::AvlTree).
///
/// The cursor keeps the path from the root to its node, so stepping to the next or previous value
/// costs amortized O(1) and never compares anything. It borrows the tree, which cannot be modified
/// while the cursor is alive.
///
/// Created by [`AvlTree::cursor`](crate::AvlTree::cursor),
/// [`AvlTree::cursor_first`](crate::AvlTree::cursor_first) and
/// [`AvlTree::cursor_last`](crate::AvlTree::cursor_last). Once a cursor steps off either end it has
/// no position and stays there.
///
/// # Examples
///
/// ```
/// use avl_arena::AvlTree;
///
/// let tree = AvlTree::from([10, 20, 30, 40]);
/// let mut cursor = tree.cursor(&20);
/// assert_eq!(cursor.get(), Some(&20));
/// assert!(cursor.move_next());
/// assert_eq!(cursor.get(), Some(&30));
/// assert!(cursor.move_prev());
/// assert!(cursor.move_prev());
/// assert_eq!(cursor.get(), Some(&10));
/// assert!(!cursor.move_prev());
/// assert_eq!(cursor.get(), None);
/// ```
pub struct Cursor<'a, T> {
    raw: &'a RawAvlTree<T>,
    stack: Stack,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(raw: &'a RawAvlTree<T>, stack: Stack) -> Self {
        Self { raw, stack }
    }

    pub(crate) fn handle(&self) -> Option<Handle> {
        self.stack.last().copied()
    }

    /// Returns the value under the cursor, or `None` if the cursor has no position.
    #[must_use]
    pub fn get(&self) -> Option<&'a T> {
        self.handle().map(|handle| self.raw.node(handle).value())
    }

    /// Returns the identity of the node under the cursor.
    #[must_use]
    pub fn id(&self) -> Option<NodeId> {
        self.handle().map(NodeId)
    }

    /// Returns a structural view of the node under the cursor.
    #[must_use]
    pub fn node(&self) -> Option<NodeRef<'a, T>> {
        self.handle().map(|handle| NodeRef::new(self.raw, handle))
    }

    /// Returns `true` if the cursor is positioned on a value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Moves to the next value in order. Returns whether the cursor still has a position.
    pub fn move_next(&mut self) -> bool {
        self.raw.step(&mut self.stack, Dir::Right)
    }

    /// Moves to the previous value in order. Returns whether the cursor still has a position.
    pub fn move_prev(&mut self) -> bool {
        self.raw.step(&mut self.stack, Dir::Left)
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw,
            stack: self.stack.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// An iterator over a contiguous run of values of an [`AvlTree`](crate::AvlTree), in order.
///
/// This `struct` is created by the [`range`](crate::AvlTree::range) method on
/// [`AvlTree`](crate::AvlTree). See its documentation for more.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, T> {
    front: Cursor<'a, T>,
    back: Cursor<'a, T>,
    finished: bool,
}

impl<'a, T> Range<'a, T> {
    /// Iterates from `front` to `back`, both inclusive. `front` must not be after `back`.
    pub(crate) fn new(front: Cursor<'a, T>, back: Cursor<'a, T>) -> Self {
        let finished = !(front.is_valid() && back.is_valid());
        Self { front, back, finished }
    }

    pub(crate) fn empty(raw: &'a RawAvlTree<T>) -> Self {
        Self::new(Cursor::new(raw, Stack::new()), Cursor::new(raw, Stack::new()))
    }
}

impl<'a, T> Iterator for Range<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.finished {
            return None;
        }
        let value = self.front.get()?;
        if self.front.handle() == self.back.handle() {
            self.finished = true;
        } else {
            self.front.move_next();
        }
        Some(value)
    }
}

impl<'a, T> DoubleEndedIterator for Range<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.finished {
            return None;
        }
        let value = self.back.get()?;
        if self.front.handle() == self.back.handle() {
            self.finished = true;
        } else {
            self.back.move_prev();
        }
        Some(value)
    }
}

impl<T> FusedIterator for Range<'_, T> {}

impl<T> Clone for Range<'_, T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
            finished: self.finished,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Range<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over all values of an [`AvlTree`](crate::AvlTree), in order.
///
/// This `struct` is created by the [`iter`](crate::AvlTree::iter) method on
/// [`AvlTree`](crate::AvlTree). See its documentation for more.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T> {
    inner: Range<'a, T>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(raw: &'a RawAvlTree<T>) -> Self {
        Self {
            inner: Range::new(
                Cursor::new(raw, raw.seek_extreme(Dir::Left)),
                Cursor::new(raw, raw.seek_extreme(Dir::Right)),
            ),
            remaining: raw.len(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let value = self.inner.next()?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        let value = self.inner.next_back()?;
        self.remaining -= 1;
        Some(value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
