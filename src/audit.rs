use core::cmp::Ordering;
use core::fmt;

use crate::node_ref::{NodeId, NodeRef};
use crate::raw::RawAvlTree;

/// A structural defect found by `audit`.
///
/// A tree built only through this crate's API never produces one unless its comparator breaks the
/// total-order contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuditError {
    /// The stored balance factor differs from the measured height difference.
    BalanceMismatch {
        /// The offending node.
        node: NodeId,
        /// Balance factor recorded in the node.
        stored: i8,
        /// Height of the right subtree minus height of the left subtree.
        actual: isize,
    },
    /// The subtree heights differ by more than one.
    Unbalanced {
        /// The offending node.
        node: NodeId,
        /// Height of the right subtree minus height of the left subtree.
        actual: isize,
    },
    /// A value is not strictly between the bounds set by its ancestors.
    OutOfOrder {
        /// The offending node.
        node: NodeId,
    },
    /// The element count disagrees with the number of reachable nodes.
    LenMismatch {
        /// Count maintained by the tree.
        len: usize,
        /// Nodes reachable from the root.
        reachable: usize,
    },
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::BalanceMismatch { node, stored, actual } => {
                write!(f, "{node:?} stores balance {stored} but its subtrees differ by {actual}")
            }
            AuditError::Unbalanced { node, actual } => write!(f, "{node:?} is unbalanced ({actual})"),
            AuditError::OutOfOrder { node } => write!(f, "{node:?} is out of order"),
            AuditError::LenMismatch { len, reachable } => {
                write!(f, "len is {len} but {reachable} nodes are reachable")
            }
        }
    }
}

impl core::error::Error for AuditError {}

/// Checks every node of `raw` and returns the tree's height.
pub(crate) fn audit<T>(raw: &RawAvlTree<T>, mut cmp: impl FnMut(&T, &T) -> Ordering) -> Result<usize, AuditError> {
    let mut reachable = 0;
    let height = check(NodeRef::root_of(raw), None, None, &mut cmp, &mut reachable)?;
    if reachable != raw.len() {
        return Err(AuditError::LenMismatch {
            len: raw.len(),
            reachable,
        });
    }
    Ok(height)
}

/// Recursion depth is the tree height, which the balance checks below keep logarithmic.
fn check<'a, T, F>(
    node: Option<NodeRef<'a, T>>,
    lower: Option<&'a T>,
    upper: Option<&'a T>,
    cmp: &mut F,
    reachable: &mut usize,
) -> Result<usize, AuditError>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let Some(node) = node else {
        return Ok(0);
    };
    *reachable += 1;

    let value = node.value();
    let above_lower = lower.is_none_or(|lower| cmp(lower, value) == Ordering::Less);
    let below_upper = upper.is_none_or(|upper| cmp(value, upper) == Ordering::Less);
    if !(above_lower && below_upper) {
        return Err(AuditError::OutOfOrder { node: node.id() });
    }

    let left = check(node.left(), lower, Some(value), cmp, reachable)?;
    let right = check(node.right(), Some(value), upper, cmp, reachable)?;

    #[allow(clippy::cast_possible_wrap)]
    let actual = right as isize - left as isize;
    if actual.abs() > 1 {
        return Err(AuditError::Unbalanced { node: node.id(), actual });
    }
    let stored = node.balance();
    if isize::from(stored) != actual {
        return Err(AuditError::BalanceMismatch {
            node: node.id(),
            stored,
            actual,
        });
    }

    Ok(left.max(right) + 1)
}
