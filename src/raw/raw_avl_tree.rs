use core::cmp::Ordering;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Dir, Node};

/// Inline capacity of descent paths and cursor stacks.
///
/// An AVL tree of n nodes is at most 1.4405 * log2(n + 2) levels tall, so every tree a `u32`
/// handle can address fits in 46 levels. 64 is the next array length `smallvec` implements.
pub(crate) const MAX_INLINE_DEPTH: usize = 64;

/// Ancestors of a cursor position, root first.
pub(crate) type Stack = SmallVec<[Handle; MAX_INLINE_DEPTH]>;

/// Ancestors of a removal point, each with the side the descent took.
type Path = SmallVec<[(Handle, Dir); MAX_INLINE_DEPTH]>;

/// The core AVL tree backing `AvlTree` and `AvlMap`.
///
/// Ordering is supplied per call as a closure: `towards(node_value)` returns how the searched key
/// compares to `node_value`. The tree itself never compares two stored values.
#[derive(Clone)]
pub(crate) struct RawAvlTree<T> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Number of nodes reachable from `root`.
    len: usize,
}

/// Where a missing key would be linked in, plus the state needed to rebalance afterwards.
///
/// Produced by [`RawAvlTree::search_insert`] and consumed by [`RawAvlTree::insert_at`]; the tree
/// must not be modified in between.
pub(crate) struct InsertPoint {
    /// Parent of the new leaf and the side it hangs on; `None` for an empty tree.
    parent: Option<(Handle, Dir)>,
    /// Deepest ancestor whose balance was non-zero, or the root if there is none.
    pivot: Option<Handle>,
    pivot_parent: Option<Handle>,
    /// Directions taken from `pivot` down to the new leaf.
    dirs: SmallVec<[Dir; MAX_INLINE_DEPTH]>,
}

/// Result of a single-pass bound search.
pub(crate) struct Interval {
    pub(crate) lower: Option<Handle>,
    pub(crate) exact: Option<Handle>,
    pub(crate) upper: Option<Handle>,
}

#[inline]
const fn descend(ordering: Ordering) -> Option<Dir> {
    match ordering {
        Ordering::Less => Some(Dir::Left),
        Ordering::Greater => Some(Dir::Right),
        Ordering::Equal => None,
    }
}

impl<T> RawAvlTree<T> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
            len: 0,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<T> {
        self.nodes.get(handle)
    }

    /// Returns the node behind a handle that may be stale.
    pub(crate) fn try_node(&self, handle: Handle) -> Option<&Node<T>> {
        self.nodes.try_get(handle)
    }

    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut T {
        self.nodes.get_mut(handle).value_mut()
    }

    #[inline]
    fn child(&self, handle: Handle, dir: Dir) -> Handle {
        self.nodes.get(handle).link(dir).expect("`RawAvlTree::child()` - missing child!")
    }

    /// Height of the tree, found by following the taller side of every node.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            let node = self.nodes.get(handle);
            current = node.link(if node.balance() < 0 { Dir::Left } else { Dir::Right });
        }
        height
    }

    /// Returns the leftmost (`Dir::Left`) or rightmost (`Dir::Right`) node.
    pub(crate) fn extreme(&self, dir: Dir) -> Option<Handle> {
        let mut current = self.root?;
        while let Some(next) = self.nodes.get(current).link(dir) {
            current = next;
        }
        Some(current)
    }

    /// Exact lookup.
    pub(crate) fn search(&self, mut towards: impl FnMut(&T) -> Ordering) -> Option<Handle> {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            match descend(towards(node.value())) {
                Some(dir) => current = node.link(dir),
                None => return Some(handle),
            }
        }
        None
    }

    /// Finds the closest nodes below and above the searched key in one descent.
    ///
    /// An exact match is reported as all three bounds.
    pub(crate) fn interval(&self, mut towards: impl FnMut(&T) -> Ordering) -> Interval {
        let mut lower = None;
        let mut upper = None;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            match towards(node.value()) {
                Ordering::Less => {
                    upper = Some(handle);
                    current = node.link(Dir::Left);
                }
                Ordering::Greater => {
                    lower = Some(handle);
                    current = node.link(Dir::Right);
                }
                Ordering::Equal => {
                    return Interval {
                        lower: Some(handle),
                        exact: Some(handle),
                        upper: Some(handle),
                    };
                }
            }
        }
        Interval {
            lower,
            exact: None,
            upper,
        }
    }

    /// Records the descent towards the searched key.
    ///
    /// The stack ends at the match, or at the last node visited when the key is missing.
    pub(crate) fn seek(&self, mut towards: impl FnMut(&T) -> Ordering) -> Stack {
        let mut stack = Stack::new();
        let mut current = self.root;
        while let Some(handle) = current {
            stack.push(handle);
            let node = self.nodes.get(handle);
            match descend(towards(node.value())) {
                Some(dir) => current = node.link(dir),
                None => break,
            }
        }
        stack
    }

    /// Records the descent to the leftmost or rightmost node.
    pub(crate) fn seek_extreme(&self, dir: Dir) -> Stack {
        let mut stack = Stack::new();
        let mut current = self.root;
        while let Some(handle) = current {
            stack.push(handle);
            current = self.nodes.get(handle).link(dir);
        }
        stack
    }

    /// Positions a stack on the innermost node for which `outside` is false.
    ///
    /// `outside` must hold for a prefix of the in-order sequence when `inward` is `Dir::Right`
    /// (the result is the first node past that prefix), or for a suffix when `inward` is
    /// `Dir::Left` (the result is the last node before it). Returns an empty stack if every node is
    /// outside.
    pub(crate) fn seek_boundary(&self, mut outside: impl FnMut(&T) -> bool, inward: Dir) -> Stack {
        let mut stack = Stack::new();
        let mut keep = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            stack.push(handle);
            let node = self.nodes.get(handle);
            if outside(node.value()) {
                current = node.link(inward);
            } else {
                keep = stack.len();
                current = node.link(inward.opposite());
            }
        }
        stack.truncate(keep);
        stack
    }

    /// Moves a cursor stack to the in-order neighbour on side `dir`.
    ///
    /// Returns `false`, leaving the stack empty, when there is no such neighbour.
    pub(crate) fn step(&self, stack: &mut Stack, dir: Dir) -> bool {
        let Some(&top) = stack.last() else {
            return false;
        };

        if let Some(mut handle) = self.nodes.get(top).link(dir) {
            // Down: the neighbour is the innermost node of that subtree.
            loop {
                stack.push(handle);
                match self.nodes.get(handle).link(dir.opposite()) {
                    Some(next) => handle = next,
                    None => return true,
                }
            }
        }

        // Up: unwind until we leave a subtree through its `dir.opposite()` side.
        loop {
            let popped = stack.pop();
            match stack.last() {
                Some(&parent) if self.nodes.get(parent).link(dir) == popped => {}
                _ => return !stack.is_empty(),
            }
        }
    }

    /// Locates the key `towards` steers to. Returns the matching node, or where a new node would go.
    pub(crate) fn search_insert(&self, mut towards: impl FnMut(&T) -> Ordering) -> Result<Handle, InsertPoint> {
        let mut point = InsertPoint {
            parent: None,
            pivot: self.root,
            pivot_parent: None,
            dirs: SmallVec::new(),
        };

        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let Some(dir) = descend(towards(node.value())) else {
                return Ok(handle);
            };
            // Only the subtree below the last unbalanced ancestor can change height.
            if node.balance() != 0 {
                point.pivot = Some(handle);
                point.pivot_parent = point.parent.map(|(parent, _)| parent);
                point.dirs.clear();
            }
            point.dirs.push(dir);
            point.parent = Some((handle, dir));
            current = node.link(dir);
        }

        Err(point)
    }

    /// Links `value` in as a new leaf at `point` and restores the AVL invariant.
    ///
    /// At most one (single or double) rotation happens, always at the pivot.
    pub(crate) fn insert_at(&mut self, point: InsertPoint, value: T) -> Handle {
        let leaf = self.nodes.alloc(Node::new(value));
        self.len += 1;
        self.attach(point.parent, Some(leaf));

        let Some(pivot) = point.pivot else {
            return leaf;
        };

        let mut handle = pivot;
        for &dir in &point.dirs {
            let node = self.nodes.get_mut(handle);
            node.set_balance(node.balance() + dir.sign());
            handle = node.link(dir).expect("`RawAvlTree::insert_at()` - broken insertion path!");
        }
        debug_assert_eq!(handle, leaf);

        let balance = self.nodes.get(pivot).balance();
        if balance.abs() < 2 {
            return leaf;
        }

        let rotation = if balance < 0 { Dir::Right } else { Dir::Left };
        let heavy = rotation.opposite();
        let child = self.child(pivot, heavy);
        let top = if self.nodes.get(child).balance() == heavy.sign() {
            let top = self.rotate_single(pivot, rotation);
            self.nodes.get_mut(pivot).set_balance(0);
            self.nodes.get_mut(child).set_balance(0);
            top
        } else {
            self.rotate_double(pivot, rotation)
        };

        match point.pivot_parent {
            None => self.root = Some(top),
            Some(parent) => {
                let side = if self.nodes.get(parent).link(Dir::Left) == Some(pivot) { Dir::Left } else { Dir::Right };
                self.nodes.get_mut(parent).set_link(side, Some(top));
            }
        }

        leaf
    }

    /// Removes the node `towards` reports as equal and returns its value.
    pub(crate) fn remove_with(&mut self, mut towards: impl FnMut(&T) -> Ordering) -> Option<T> {
        let mut path = Path::new();
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            let Some(dir) = descend(towards(node.value())) else {
                break;
            };
            path.push((current, dir));
            current = node.link(dir)?;
        }
        Some(self.unlink(current, path))
    }

    /// Removes the leftmost (`Dir::Left`) or rightmost (`Dir::Right`) node.
    pub(crate) fn remove_extreme(&mut self, dir: Dir) -> Option<T> {
        let mut path = Path::new();
        let mut current = self.root?;
        while let Some(next) = self.nodes.get(current).link(dir) {
            path.push((current, dir));
            current = next;
        }
        Some(self.unlink(current, path))
    }

    /// Detaches `target`, whose ancestors are `path`, frees it and rebalances.
    ///
    /// A target with two children is replaced by its in-order successor node, which keeps its
    /// handle.
    fn unlink(&mut self, target: Handle, mut path: Path) -> T {
        let slot = path.last().copied();
        let node = self.nodes.get(target);
        let (left, right, balance) = (node.link(Dir::Left), node.link(Dir::Right), node.balance());

        match right {
            None => self.attach(slot, left),
            Some(successor) if self.nodes.get(successor).link(Dir::Left).is_none() => {
                let node = self.nodes.get_mut(successor);
                node.set_link(Dir::Left, left);
                node.set_balance(balance);
                self.attach(slot, Some(successor));
                path.push((successor, Dir::Right));
            }
            Some(mut parent) => {
                let at = path.len();
                let successor = loop {
                    path.push((parent, Dir::Left));
                    let next = self.child(parent, Dir::Left);
                    if self.nodes.get(next).link(Dir::Left).is_none() {
                        break next;
                    }
                    parent = next;
                };

                let successor_right = self.nodes.get(successor).link(Dir::Right);
                self.nodes.get_mut(parent).set_link(Dir::Left, successor_right);

                let node = self.nodes.get_mut(successor);
                node.set_link(Dir::Left, left);
                node.set_link(Dir::Right, right);
                node.set_balance(balance);
                self.attach(slot, Some(successor));
                path.insert(at, (successor, Dir::Right));
            }
        }

        self.len -= 1;
        self.retrace_after_remove(path);

        let value = self.nodes.take(target).into_value();
        debug_assert_eq!(self.nodes.len(), self.len);
        value
    }

    /// Walks `path` upwards after the subtree below its last entry lost one level.
    ///
    /// Unlike insertion, rotations may be needed at several ancestors.
    fn retrace_after_remove(&mut self, mut path: Path) {
        while let Some((handle, shrunk)) = path.pop() {
            let heavy = shrunk.opposite();
            let lean = heavy.sign();

            let node = self.nodes.get_mut(handle);
            let balance = node.balance() + lean;
            node.set_balance(balance);

            if balance == lean {
                // Was balanced; the subtree height did not change.
                #[cfg(feature = "tracing")]
                tracing::trace!(node = ?handle, remaining = path.len(), "remove: retrace stopped");
                return;
            }
            if balance == 0 {
                continue;
            }

            let sibling = self.child(handle, heavy);
            let sibling_balance = self.nodes.get(sibling).balance();
            let slot = path.last().copied();

            if sibling_balance == -lean {
                let top = self.rotate_double(handle, shrunk);
                self.attach(slot, Some(top));
                continue;
            }

            let top = self.rotate_single(handle, shrunk);
            self.attach(slot, Some(top));
            if sibling_balance == 0 {
                self.nodes.get_mut(sibling).set_balance(-lean);
                self.nodes.get_mut(handle).set_balance(lean);
                return;
            }
            self.nodes.get_mut(sibling).set_balance(0);
            self.nodes.get_mut(handle).set_balance(0);
        }
    }

    /// Sets the child of `slot`'s node on `slot`'s side, or the root if `slot` is `None`.
    fn attach(&mut self, slot: Option<(Handle, Dir)>, child: Option<Handle>) {
        match slot {
            None => self.root = child,
            Some((parent, dir)) => self.nodes.get_mut(parent).set_link(dir, child),
        }
    }

    /// Promotes the child of `p` opposite `dir` into p's place and returns it.
    ///
    /// Balances and the parent link are left to the caller.
    fn rotate_single(&mut self, p: Handle, dir: Dir) -> Handle {
        let opposite = dir.opposite();
        let q = self.child(p, opposite);
        let inner = self.nodes.get(q).link(dir);
        self.nodes.get_mut(p).set_link(opposite, inner);
        self.nodes.get_mut(q).set_link(dir, Some(p));

        #[cfg(feature = "tracing")]
        tracing::trace!(pivot = ?p, top = ?q, ?dir, "rotate_single");

        q
    }

    /// Promotes the grandchild of `p` reached by `dir.opposite()` then `dir` into p's place.
    ///
    /// All three balances are recomputed from the grandchild's old balance. The parent link is
    /// left to the caller.
    fn rotate_double(&mut self, p: Handle, dir: Dir) -> Handle {
        let opposite = dir.opposite();
        let q = self.child(p, opposite);
        let r = self.child(q, dir);

        let node = self.nodes.get(r);
        let (near, far, r_balance) = (node.link(dir), node.link(opposite), node.balance());
        self.nodes.get_mut(p).set_link(opposite, near);
        self.nodes.get_mut(q).set_link(dir, far);

        let node = self.nodes.get_mut(r);
        node.set_link(dir, Some(p));
        node.set_link(opposite, Some(q));
        node.set_balance(0);

        let lean = opposite.sign();
        let (p_balance, q_balance) = match r_balance {
            b if b == lean => (-lean, 0),
            0 => (0, 0),
            _ => (0, lean),
        };
        self.nodes.get_mut(p).set_balance(p_balance);
        self.nodes.get_mut(q).set_balance(q_balance);

        #[cfg(feature = "tracing")]
        tracing::trace!(pivot = ?p, top = ?r, ?dir, p_balance, q_balance, "rotate_double");

        r
    }

    /// Checks `cmp` against the in-order neighbours of `handle`.
    ///
    /// A cheap sample of the strict-weak-order contract, run after every insertion. Does nothing in
    /// release builds.
    pub(crate) fn debug_check_order(&self, handle: Handle, mut cmp: impl FnMut(&T, &T) -> Ordering) {
        if !cfg!(debug_assertions) {
            return;
        }
        let value = self.nodes.get(handle).value();
        let stack = self.seek(|node| cmp(value, node));
        debug_assert_eq!(stack.last(), Some(&handle), "comparator is not reflexive");

        for dir in [Dir::Left, Dir::Right] {
            let mut neighbour = stack.clone();
            if self.step(&mut neighbour, dir)
                && let Some(&other) = neighbour.last()
            {
                let other = self.nodes.get(other).value();
                let expected = if dir == Dir::Left { Ordering::Less } else { Ordering::Greater };
                debug_assert_eq!(cmp(other, value), expected, "comparator is not a total order");
                debug_assert_eq!(cmp(value, other), expected.reverse(), "comparator is not antisymmetric");
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use crate::audit::audit;
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn insert(tree: &mut RawAvlTree<i32>, key: i32) -> (Handle, bool) {
        match tree.search_insert(|node| key.cmp(node)) {
            Ok(handle) => (handle, false),
            Err(point) => (tree.insert_at(point, key), true),
        }
    }

    fn remove(tree: &mut RawAvlTree<i32>, key: i32) -> Option<i32> {
        tree.remove_with(|node| key.cmp(node))
    }

    fn build(keys: &[i32]) -> RawAvlTree<i32> {
        let mut tree = RawAvlTree::new();
        for &key in keys {
            insert(&mut tree, key);
            assert_valid(&tree);
        }
        tree
    }

    fn assert_valid(tree: &RawAvlTree<i32>) {
        if let Err(error) = audit(tree, Ord::cmp) {
            panic!("invalid tree: {error}");
        }
    }

    /// Value and balance of `key`'s node.
    fn at(tree: &RawAvlTree<i32>, key: i32) -> (i32, i8) {
        let node = tree.node(tree.search(|node| key.cmp(node)).expect("key is present"));
        (*node.value(), node.balance())
    }

    fn child_value(tree: &RawAvlTree<i32>, key: i32, dir: Dir) -> Option<i32> {
        let node = tree.node(tree.search(|node| key.cmp(node)).expect("key is present"));
        node.link(dir).map(|child| *tree.node(child).value())
    }

    fn root_value(tree: &RawAvlTree<i32>) -> Option<i32> {
        tree.root().map(|root| *tree.node(root).value())
    }

    fn in_order(tree: &RawAvlTree<i32>) -> Vec<i32> {
        let mut stack = tree.seek_extreme(Dir::Left);
        let mut out = Vec::new();
        while let Some(&top) = stack.last() {
            out.push(*tree.node(top).value());
            tree.step(&mut stack, Dir::Right);
        }
        out
    }

    /// Calls `f` with every permutation of `items` (Heap's algorithm).
    fn for_each_permutation(items: &mut [i32], k: usize, f: &mut impl FnMut(&[i32])) {
        if k <= 1 {
            f(items);
            return;
        }
        for i in 0..k - 1 {
            for_each_permutation(items, k - 1, f);
            if k % 2 == 0 {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
        }
        for_each_permutation(items, k - 1, f);
    }

    #[test]
    fn empty_tree() {
        let mut tree: RawAvlTree<i32> = RawAvlTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.search(|_| Ordering::Equal), None);
        assert_eq!(remove(&mut tree, 1), None);
        assert_eq!(tree.remove_extreme(Dir::Left), None);
        assert!(tree.seek(|_| Ordering::Less).is_empty());
        assert_valid(&tree);
    }

    #[test]
    fn duplicate_insert_returns_existing_handle() {
        let mut tree = build(&[5, 3, 8]);
        let (first, inserted) = insert(&mut tree, 4);
        assert!(inserted);
        let (second, inserted) = insert(&mut tree, 4);
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn single_rotation_on_ascending_run() {
        let tree = build(&[1, 2, 3]);
        assert_eq!(root_value(&tree), Some(2));
        assert_eq!(at(&tree, 1), (1, 0));
        assert_eq!(at(&tree, 2), (2, 0));
        assert_eq!(at(&tree, 3), (3, 0));
    }

    #[test]
    fn single_rotation_on_descending_run() {
        let tree = build(&[3, 2, 1]);
        assert_eq!(root_value(&tree), Some(2));
        assert_eq!(child_value(&tree, 2, Dir::Left), Some(1));
        assert_eq!(child_value(&tree, 2, Dir::Right), Some(3));
    }

    #[test]
    fn double_rotations_on_zigzag() {
        for keys in [[1, 3, 2], [3, 1, 2]] {
            let tree = build(&keys);
            assert_eq!(root_value(&tree), Some(2));
            assert_eq!(at(&tree, 1).1, 0);
            assert_eq!(at(&tree, 3).1, 0);
        }
    }

    #[test]
    fn double_rotation_balance_table() {
        // Grandchild 7 leans right before the rotation at 5.
        let tree = build(&[5, 3, 10, 2, 4, 7, 12, 1, 6, 8, 9]);
        assert_eq!(in_order(&tree), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12]);
        assert_valid(&tree);

        // Grandchild leans left.
        let tree = build(&[50, 20, 80, 70, 90, 60]);
        assert_eq!(root_value(&tree), Some(70));
        assert_eq!(at(&tree, 50), (50, 0));
        assert_eq!(at(&tree, 80), (80, 1));
        assert_eq!(at(&tree, 70), (70, 0));
    }

    #[test]
    fn insertion_only_touches_pivot_subtree() {
        // 40 leans right; inserting 42 under 45 must leave 20's subtree untouched.
        let tree = build(&[40, 20, 60, 10, 30, 45, 70, 42]);
        assert_eq!(root_value(&tree), Some(40));
        assert_eq!(at(&tree, 40), (40, 1));
        assert_eq!(at(&tree, 20), (20, 0));
        assert_eq!(at(&tree, 60), (60, -1));
        assert_eq!(at(&tree, 45), (45, -1));
        assert_eq!(tree.height(), 4);
    }

    #[test]
    fn remove_root_with_deep_successor() {
        let mut tree = build(&[40, 20, 60, 10, 30, 45, 70, 42]);
        let (successor, _) = insert(&mut tree, 42);

        assert_eq!(remove(&mut tree, 40), Some(40));
        assert_valid(&tree);
        assert_eq!(tree.len(), 7);

        // The successor node itself moved into the root slot.
        assert_eq!(tree.root(), Some(successor));
        assert_eq!(at(&tree, 42), (42, 0));
        assert_eq!(at(&tree, 60), (60, 0));
        assert_eq!(child_value(&tree, 60, Dir::Left), Some(45));
        assert_eq!(in_order(&tree), [10, 20, 30, 42, 45, 60, 70]);
    }

    #[test]
    fn remove_node_whose_right_child_is_successor() {
        let mut tree = build(&[2, 1, 3, 4]);
        let (three, _) = insert(&mut tree, 3);
        assert_eq!(remove(&mut tree, 2), Some(2));
        assert_valid(&tree);
        assert_eq!(tree.root(), Some(three));
        assert_eq!(child_value(&tree, 3, Dir::Left), Some(1));
        assert_eq!(child_value(&tree, 3, Dir::Right), Some(4));
    }

    #[test]
    fn remove_with_balanced_sibling_stops_after_single_rotation() {
        let mut tree = build(&[2, 1, 4, 3, 5]);
        assert_eq!(remove(&mut tree, 1), Some(1));
        assert_valid(&tree);
        assert_eq!(root_value(&tree), Some(4));
        assert_eq!(at(&tree, 4), (4, -1));
        assert_eq!(at(&tree, 2), (2, 1));
        assert_eq!(child_value(&tree, 2, Dir::Right), Some(3));
    }

    #[test]
    fn remove_with_opposing_sibling_double_rotates() {
        let mut tree = build(&[2, 1, 4, 3]);
        assert_eq!(remove(&mut tree, 1), Some(1));
        assert_valid(&tree);
        assert_eq!(root_value(&tree), Some(3));
        assert_eq!(at(&tree, 2), (2, 0));
        assert_eq!(at(&tree, 4), (4, 0));
    }

    #[test]
    fn remove_cascades_rotations_to_root() {
        // Minimal (Fibonacci) AVL tree of height 5: removing its shallowest leaf
        // rebalances at more than one level.
        let mut tree = build(&[8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1]);
        assert_eq!(tree.height(), 5);
        assert_eq!(remove(&mut tree, 12), Some(12));
        assert_valid(&tree);
        assert_eq!(tree.height(), 4);
        assert_eq!(root_value(&tree), Some(5));
        assert_eq!(in_order(&tree), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn remove_extremes() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        assert_eq!(tree.remove_extreme(Dir::Left), Some(1));
        assert_eq!(tree.remove_extreme(Dir::Right), Some(7));
        assert_eq!(tree.remove_extreme(Dir::Left), Some(2));
        assert_valid(&tree);
        assert_eq!(in_order(&tree), [3, 4, 5, 6]);
    }

    #[test]
    fn every_removal_from_every_insertion_order() {
        let mut keys = [1, 2, 3, 4, 5, 6, 7];
        let len = keys.len();
        for_each_permutation(&mut keys, len, &mut |order| {
            let tree = build(order);
            for &victim in order {
                let mut tree = tree.clone();
                assert_eq!(remove(&mut tree, victim), Some(victim));
                assert_valid(&tree);
                assert_eq!(tree.len(), len - 1);
            }
        });
    }

    #[test]
    fn interval_bounds() {
        let tree = build(&[10, 20, 30, 40]);
        let value = |h: Option<Handle>| h.map(|h| *tree.node(h).value());

        let hit = tree.interval(|node| 20.cmp(node));
        assert_eq!((value(hit.lower), value(hit.exact), value(hit.upper)), (Some(20), Some(20), Some(20)));

        let miss = tree.interval(|node| 25.cmp(node));
        assert_eq!((value(miss.lower), value(miss.exact), value(miss.upper)), (Some(20), None, Some(30)));

        let below = tree.interval(|node| 5.cmp(node));
        assert_eq!((value(below.lower), value(below.upper)), (None, Some(10)));

        let above = tree.interval(|node| 45.cmp(node));
        assert_eq!((value(above.lower), value(above.upper)), (Some(40), None));
    }

    #[test]
    fn step_both_ways() {
        let tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        let mut stack = tree.seek(|node| 4.cmp(node));
        let mut backwards = Vec::new();
        while let Some(&top) = stack.last() {
            backwards.push(*tree.node(top).value());
            tree.step(&mut stack, Dir::Left);
        }
        assert_eq!(backwards, [4, 3, 2, 1]);
        assert!(!tree.step(&mut stack, Dir::Right));

        let mut stack = tree.seek_extreme(Dir::Right);
        assert_eq!(stack.last().map(|&h| *tree.node(h).value()), Some(7));
        assert!(!tree.step(&mut stack, Dir::Right));
        assert!(stack.is_empty());
    }

    #[test]
    fn seek_stops_at_insertion_point() {
        let tree = build(&[10, 20, 30]);
        let stack = tree.seek(|node| 25.cmp(node));
        assert_eq!(stack.last().map(|&h| *tree.node(h).value()), Some(30));
    }

    #[test]
    fn seek_boundary_finds_edges() {
        let tree = build(&[10, 20, 30, 40, 50]);
        let top = |stack: Stack| stack.last().map(|&h| *tree.node(h).value());

        assert_eq!(top(tree.seek_boundary(|v| *v < 25, Dir::Right)), Some(30));
        assert_eq!(top(tree.seek_boundary(|v| *v < 30, Dir::Right)), Some(30));
        assert_eq!(top(tree.seek_boundary(|v| *v <= 30, Dir::Right)), Some(40));
        assert_eq!(top(tree.seek_boundary(|v| *v < 99, Dir::Right)), None);

        assert_eq!(top(tree.seek_boundary(|v| *v > 25, Dir::Left)), Some(20));
        assert_eq!(top(tree.seek_boundary(|v| *v >= 10, Dir::Left)), None);
        assert_eq!(top(tree.seek_boundary(|_| false, Dir::Left)), Some(50));
    }

    #[test]
    #[should_panic(expected = "comparator is not a total order")]
    #[cfg(debug_assertions)]
    fn debug_order_check_catches_inconsistent_comparator() {
        let tree = build(&[1, 2, 3]);
        let two = tree.search(|node| 2.cmp(node)).expect("2 is present");
        // Agrees with the tree on 2 itself but claims everything else sorts after it.
        tree.debug_check_order(two, |a, b| if a == b { Ordering::Equal } else if *b == 2 { Ordering::Greater } else { a.cmp(b) });
    }

    #[test]
    fn inline_depth_covers_tallest_tree() {
        static_assertions::const_assert!(MAX_INLINE_DEPTH >= 46);
        assert_eq!(Stack::new().inline_size(), MAX_INLINE_DEPTH);
        assert_eq!(Path::new().inline_size(), MAX_INLINE_DEPTH);

        let mut tree = build(&[]);
        for key in 0..2_000 {
            insert(&mut tree, key);
        }
        let stack = tree.seek_extreme(Dir::Left);
        assert!(!stack.is_empty() && stack.len() <= tree.height());
        assert!(!stack.spilled());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
        PopFirst,
        PopLast,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0i32..400).prop_map(Op::Insert),
            4 => (0i32..400).prop_map(Op::Remove),
            1 => Just(Op::PopFirst),
            1 => Just(Op::PopLast),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn invariants_hold_after_every_operation(ops in prop::collection::vec(op_strategy(), 0..600)) {
            let mut tree: RawAvlTree<i32> = RawAvlTree::new();
            let mut model: BTreeSet<i32> = BTreeSet::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        prop_assert_eq!(insert(&mut tree, key).1, model.insert(key));
                    }
                    Op::Remove(key) => {
                        let expected = model.remove(&key).then_some(key);
                        prop_assert_eq!(remove(&mut tree, key), expected);
                    }
                    Op::PopFirst => prop_assert_eq!(tree.remove_extreme(Dir::Left), model.pop_first()),
                    Op::PopLast => prop_assert_eq!(tree.remove_extreme(Dir::Right), model.pop_last()),
                }
                prop_assert_eq!(audit(&tree, Ord::cmp).map_err(|e| alloc::format!("{e}")), Ok(tree.height()));
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(in_order(&tree), model.into_iter().collect::<Vec<_>>());
        }
    }
}
