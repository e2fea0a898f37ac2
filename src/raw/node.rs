use super::handle::Handle;

/// Side of a node, also used as the step direction of cursors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    /// Balance contribution of a subtree growing on this side.
    #[inline]
    pub(crate) const fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// A single tree node.
///
/// `balance` is height(right) - height(left) and stays within `-1..=1` between operations.
#[derive(Clone)]
pub(crate) struct Node<T> {
    value: T,
    links: [Option<Handle>; 2],
    balance: i8,
}

impl<T> Node<T> {
    /// Creates a detached leaf.
    pub(crate) const fn new(value: T) -> Self {
        Self {
            value,
            links: [None, None],
            balance: 0,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub(crate) fn into_value(self) -> T {
        self.value
    }

    #[inline]
    pub(crate) fn link(&self, dir: Dir) -> Option<Handle> {
        self.links[dir.index()]
    }

    #[inline]
    pub(crate) fn set_link(&mut self, dir: Dir, child: Option<Handle>) {
        self.links[dir.index()] = child;
    }

    #[inline]
    pub(crate) fn balance(&self) -> i8 {
        self.balance
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, balance: i8) {
        self.balance = balance;
    }
}
