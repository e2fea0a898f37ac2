use core::cmp::Ordering;

/// A three-way ordering over the values stored in an [`AvlTree`](crate::AvlTree) or the keys of an
/// [`AvlMap`](crate::AvlMap).
///
/// The comparator is supplied once, when the collection is built, and is consulted on every
/// descent. It must describe a strict total order: `compare(a, b)` is the reverse of
/// `compare(b, a)`, `Equal` only for equivalent values, and the relation is transitive. Violating
/// that is a logic error; the resulting behavior is unspecified but never undefined. Debug builds
/// check each newly inserted value against its neighbours.
///
/// Any `Fn(&T, &T) -> Ordering` closure is a comparator.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use avl_arena::{AvlTree, Comparator};
///
/// struct ByLength;
///
/// impl Comparator<&str> for ByLength {
///     fn compare(&self, a: &&str, b: &&str) -> Ordering {
///         a.len().cmp(&b.len()).then_with(|| a.cmp(b))
///     }
/// }
///
/// let mut words = AvlTree::with_comparator(ByLength);
/// words.insert("ccc");
/// words.insert("a");
/// words.insert("bb");
/// assert_eq!(words.iter().copied().collect::<Vec<_>>(), ["a", "bb", "ccc"]);
/// ```
pub trait Comparator<T: ?Sized> {
    /// Compares `a` with `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The comparator used by default: the type's own [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct NaturalOrder;

impl<T: ?Sized + Ord> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn sign<C: Comparator<i32>>(cmp: &C, a: i32, b: i32) -> Ordering {
        cmp.compare(&a, &b)
    }

    #[test]
    fn natural_order_matches_ord() {
        assert_eq!(sign(&NaturalOrder, 1, 2), Ordering::Less);
        assert_eq!(sign(&NaturalOrder, 2, 2), Ordering::Equal);
        assert_eq!(NaturalOrder.compare("b", "a"), Ordering::Greater);
    }

    #[test]
    fn closures_are_comparators() {
        let descending = |a: &i32, b: &i32| b.cmp(a);
        assert_eq!(sign(&descending, 1, 2), Ordering::Greater);
        assert_eq!(sign(&descending, 3, 3), Ordering::Equal);
    }
}
