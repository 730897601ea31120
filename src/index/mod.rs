//! Lookup strategies over a contiguous run of entries.
//!
//! The containers never search their storage directly. Ordered containers go through
//! [`ordered`] (binary search under a [`Compare`]) and unordered ones through [`unordered`]
//! (linear scan under an [`Equivalence`]). Both work on a plain slice plus a projection from
//! an entry to its key, so maps (entries `(K, V)`) and sets (entries `K`) share them.
//!
//! Lookups are heterogeneous: a container keyed by `K` can be searched with any `Q` such that
//! `K: Borrow<Q>` and the predicate is defined on `Q`. With the default predicates this
//! means a `SmallFlatMap<String, _, N>` can be queried with a `&str`.

pub(crate) mod ordered;
pub(crate) mod unordered;

use core::cmp::Ordering;

/// A strict weak ordering used to keep ordered containers sorted.
///
/// Implemented for [`Natural`], [`Descending`] and every `Fn(&T, &T) -> Ordering`.
pub trait Compare<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;

    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Ascending order by [`Ord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Descending order by [`Ord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Descending;

impl<T: Ord + ?Sized> Compare<T> for Descending {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        b.cmp(a)
    }
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Key equality used by unordered containers.
///
/// Implemented for [`DefaultEq`] and every `Fn(&T, &T) -> bool`.
pub trait Equivalence<T: ?Sized> {
    fn equivalent(&self, a: &T, b: &T) -> bool;
}

/// Equality by [`PartialEq`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DefaultEq;

impl<T: PartialEq + ?Sized> Equivalence<T> for DefaultEq {
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

impl<T: ?Sized, F> Equivalence<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_natural_and_descending() {
        assert!(Natural.less(&1, &2));
        assert!(!Natural.less(&2, &2));
        assert!(Descending.less(&2, &1));
        assert_eq!(Compare::<str>::compare(&Natural, "a", "b"), Ordering::Less);
    }

    #[test]
    fn test_index_closure_predicates() {
        let by_len = |a: &String, b: &String| a.len().cmp(&b.len());
        assert!(by_len.less(&"ab".to_string(), &"abc".to_string()));
        let case_blind = |a: &str, b: &str| a.eq_ignore_ascii_case(b);
        assert!(case_blind.equivalent("Key", "kEY"));
        assert!(DefaultEq.equivalent(&3, &3));
    }
}
