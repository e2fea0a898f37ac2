use core::fmt;

use crate::raw::{Dir, Handle, RawAvlTree};

/// Identity of a node in an [`AvlTree`](crate::AvlTree) or [`AvlMap`](crate::AvlMap).
///
/// An id is issued when a value is first inserted and stays attached to that value until it is
/// removed, however the tree is rotated in between. Removing a value with two children moves its
/// in-order successor's node into its place; the successor keeps its id.
///
/// Ids are plain indices. Once a value is removed its id may be reissued to a later insertion, so
/// looking up a stale id can return an unrelated value.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) Handle);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.0.to_index()).finish()
    }
}

/// A read-only view of one node and, through its children, of its subtree.
///
/// Returned by the `root` accessors. It exposes the stored balance factor so that external
/// checkers can audit the tree's structure.
///
/// # Examples
///
/// ```
/// use avl_arena::{AvlTree, NodeRef};
///
/// fn height<T>(node: Option<NodeRef<'_, T>>) -> usize {
///     node.map_or(0, |n| 1 + height(n.left()).max(height(n.right())))
/// }
///
/// let tree: AvlTree<i32> = (0..100).collect();
/// let root = tree.root().unwrap();
/// assert!((-1..=1).contains(&root.balance()));
/// assert_eq!(height(Some(root)), tree.height());
/// ```
pub struct NodeRef<'a, T> {
    raw: &'a RawAvlTree<T>,
    handle: Handle,
}

impl<'a, T> NodeRef<'a, T> {
    pub(crate) fn new(raw: &'a RawAvlTree<T>, handle: Handle) -> Self {
        Self { raw, handle }
    }

    pub(crate) fn root_of(raw: &'a RawAvlTree<T>) -> Option<Self> {
        raw.root().map(|handle| Self::new(raw, handle))
    }

    /// The node's identity.
    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId(self.handle)
    }

    /// The stored value (a key/value pair for maps).
    #[must_use]
    pub fn value(&self) -> &'a T {
        self.raw.node(self.handle).value()
    }

    /// Stored balance factor: height of the right subtree minus height of the left subtree.
    #[must_use]
    pub fn balance(&self) -> i8 {
        self.raw.node(self.handle).balance()
    }

    /// Root of the left subtree.
    #[must_use]
    pub fn left(&self) -> Option<NodeRef<'a, T>> {
        self.child(Dir::Left)
    }

    /// Root of the right subtree.
    #[must_use]
    pub fn right(&self) -> Option<NodeRef<'a, T>> {
        self.child(Dir::Right)
    }

    fn child(&self, dir: Dir) -> Option<NodeRef<'a, T>> {
        self.raw.node(self.handle).link(dir).map(|handle| Self::new(self.raw, handle))
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id())
            .field("value", self.value())
            .field("balance", &self.balance())
            .finish()
    }
}
