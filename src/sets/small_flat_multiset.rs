//! Sorted multiset, stored contiguously with a small inline buffer.
//!
//! [`SmallFlatMultiset`] allows any number of equivalent keys. They sit next to each other
//! in one run, so [`equal_range`](SmallFlatMultiset::equal_range) describes all of them as a
//! range of positions and [`count`](SmallFlatMultiset::count) is two binary searches.
//!
//! A new key is placed in front of the keys it is equivalent to.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Range, RangeBounds};

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use crate::error::{Error, Result, infallible};
use crate::index::{Compare, Natural, ordered};
use crate::raw::growth::Amortized;
use crate::raw::{self, IntoIter, RawFlat};
use crate::sets::{Iter, key};

/// A sorted collection of keys that may repeat.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `K` | Key type |
/// | `N` | Keys held inline before the first heap allocation |
/// | `C` | Key ordering, [`Natural`] by default |
/// | `A` | Allocator for the heap block, `Global` by default |
pub struct SmallFlatMultiset<K, const N: usize, C = Natural, A: FlatAllocator = Global> {
    raw: RawFlat<K, N, A>,
    cmp: C,
}

impl<K, const N: usize, C, A: FlatAllocator> SmallFlatMultiset<K, N, C, A> {
    pub fn new() -> Self
    where
        C: Default,
        A: Default,
    {
        Self::with_comparator_in(C::default(), A::default())
    }

    pub fn with_capacity(capacity: usize) -> Self
    where
        C: Default,
        A: Default,
    {
        infallible(Self::try_with_capacity_in(capacity, A::default()))
    }

    pub fn with_comparator(cmp: C) -> Self
    where
        A: Default,
    {
        Self::with_comparator_in(cmp, A::default())
    }

    pub fn new_in(alloc: A) -> Self
    where
        C: Default,
    {
        Self::with_comparator_in(C::default(), alloc)
    }

    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        Self {
            raw: RawFlat::new_in(alloc),
            cmp,
        }
    }

    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self>
    where
        C: Default,
    {
        Ok(Self {
            raw: RawFlat::with_capacity_in(capacity, alloc)?,
            cmp: C::default(),
        })
    }

    pub fn from_moved_in(other: Self, alloc: A) -> Self {
        let Self { raw, cmp } = other;
        Self {
            raw: infallible(RawFlat::move_in(raw, alloc)),
            cmp,
        }
    }

    pub fn clone_in(&self, alloc: A) -> Self
    where
        K: Clone,
        C: Clone,
    {
        Self {
            raw: infallible(self.raw.clone_in(alloc)),
            cmp: self.cmp.clone(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.raw.available()
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.raw.max_size()
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.raw.is_inline()
    }

    pub fn allocator(&self) -> &A {
        self.raw.allocator()
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional));
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.raw.try_reserve_exact(additional)
    }

    pub fn shrink_to_fit(&mut self) {
        infallible(self.raw.shrink_to_fit());
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    #[inline]
    pub fn as_slice(&self) -> &[K] {
        self.raw.as_slice()
    }

    pub fn iter(&self) -> Iter<'_, K> {
        self.raw.as_slice().iter()
    }

    pub fn nth(&self, index: usize) -> Iter<'_, K> {
        self.raw.as_slice()[index..].iter()
    }

    pub fn index_of(&self, stored: &K) -> Option<usize> {
        self.raw.index_of(stored)
    }

    pub fn get_index(&self, index: usize) -> Option<&K> {
        self.raw.as_slice().get(index)
    }

    pub fn at_index(&self, index: usize) -> Result<&K> {
        let len = self.len();
        self.get_index(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    pub fn remove_index(&mut self, index: usize) -> K {
        self.raw.remove(index)
    }

    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = raw::bounds(range, self.len());
        self.raw.erase_range(range);
    }

    pub fn retain<F: FnMut(&K) -> bool>(&mut self, mut keep: F) {
        self.raw.retain_mut(|k| keep(k));
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
        mem::swap(&mut self.cmp, &mut other.cmp);
    }

    /// Position of the first key equivalent to `value`.
    pub fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::find(self.raw.as_slice(), value, &self.cmp, key::<K, Q>)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(value).is_some()
    }

    /// Number of keys equivalent to `value`.
    pub fn count<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.equal_range(value).len()
    }

    pub fn lower_bound<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::lower_bound(self.raw.as_slice(), value, &self.cmp, key::<K, Q>)
    }

    pub fn upper_bound<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::upper_bound(self.raw.as_slice(), value, &self.cmp, key::<K, Q>)
    }

    /// Positions of every key equivalent to `value`.
    pub fn equal_range<Q>(&self, value: &Q) -> Range<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::equal_range(self.raw.as_slice(), value, &self.cmp, key::<K, Q>)
    }

    /// The keys equivalent to `value`, as a slice.
    pub fn get_all<Q>(&self, value: &Q) -> &[K]
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        &self.raw.as_slice()[self.equal_range(value)]
    }

    /// Removes every key equivalent to `value` and returns how many there were.
    pub fn remove_all<Q>(&mut self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let range = self.equal_range(value);
        let removed = range.len();
        self.raw.erase_range(range);
        removed
    }

    /// Removes the first key equivalent to `value`.
    pub fn remove_one<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let i = self.find(value)?;
        Some(self.raw.remove(i))
    }
}

impl<K, const N: usize, C: Compare<K>, A: FlatAllocator> SmallFlatMultiset<K, N, C, A> {
    /// Adds `value` in front of its equivalent keys and returns its position.
    pub fn insert(&mut self, value: K) -> usize {
        infallible(self.try_insert(value))
    }

    pub fn try_insert(&mut self, value: K) -> Result<usize> {
        let i = ordered::insert_position_multi(
            self.raw.as_slice(),
            &value,
            &self.cmp,
            key::<K, K>,
            None,
        );
        self.raw.try_insert(i, value)?;
        Ok(i)
    }

    /// Adds `value` at `hint` if that keeps the keys sorted, at its usual place otherwise.
    pub fn insert_hint(&mut self, hint: usize, value: K) -> usize {
        let i = ordered::insert_position_multi(
            self.raw.as_slice(),
            &value,
            &self.cmp,
            key::<K, K>,
            Some(hint),
        );
        infallible(self.raw.try_insert(i, value));
        i
    }

    /// Adds the key produced by the fallible `make`. On error the multiset is unchanged.
    pub fn try_insert_with<E, F>(&mut self, make: F) -> Result<usize, E>
    where
        E: From<Error>,
        F: FnOnce() -> Result<K, E>,
    {
        let value = make()?;
        Ok(self.try_insert(value)?)
    }
}

impl<K, const N: usize, C: Default, A: FlatAllocator + Default> Default
    for SmallFlatMultiset<K, N, C, A>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, const N: usize, C: Clone, A: FlatAllocator> Clone for SmallFlatMultiset<K, N, C, A> {
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().clone())
    }

    fn clone_from(&mut self, source: &Self) {
        infallible(self.raw.assign_clone(&source.raw));
        self.cmp = source.cmp.clone();
    }
}

impl<K: fmt::Debug, const N: usize, C, A: FlatAllocator> fmt::Debug
    for SmallFlatMultiset<K, N, C, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, const N: usize, C, A: FlatAllocator> PartialEq
    for SmallFlatMultiset<K, N, C, A>
{
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<K: Eq, const N: usize, C, A: FlatAllocator> Eq for SmallFlatMultiset<K, N, C, A> {}

impl<K: PartialOrd, const N: usize, C, A: FlatAllocator> PartialOrd
    for SmallFlatMultiset<K, N, C, A>
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<K: Ord, const N: usize, C, A: FlatAllocator> Ord for SmallFlatMultiset<K, N, C, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<K: Hash, const N: usize, C, A: FlatAllocator> Hash for SmallFlatMultiset<K, N, C, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<K, const N: usize, C: Compare<K>, A: FlatAllocator> Extend<K>
    for SmallFlatMultiset<K, N, C, A>
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<K, const N: usize, C, A> FromIterator<K> for SmallFlatMultiset<K, N, C, A>
where
    C: Compare<K> + Default,
    A: FlatAllocator + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord, const N: usize, const M: usize> From<[K; M]> for SmallFlatMultiset<K, N> {
    fn from(keys: [K; M]) -> Self {
        keys.into_iter().collect()
    }
}

impl<K, const N: usize, C, A: FlatAllocator> IntoIterator for SmallFlatMultiset<K, N, C, A> {
    type Item = K;
    type IntoIter = IntoIter<K, N, A, Amortized>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, const N: usize, C, A: FlatAllocator> IntoIterator
    for &'a SmallFlatMultiset<K, N, C, A>
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BuildError, Tracked};
    use core::cell::Cell;
    use proptest::prelude::*;
    use std::rc::Rc;

    /// Orders by the first field only, so equivalent keys stay distinguishable.
    fn by_first(a: &(i32, char), b: &(i32, char)) -> Ordering {
        a.0.cmp(&b.0)
    }

    #[test]
    fn test_small_flat_multiset_insert_in_front_of_equal_run() {
        let mut s: SmallFlatMultiset<(i32, char), 4, _> =
            SmallFlatMultiset::with_comparator(by_first);
        assert_eq!(s.insert((2, 'a')), 0);
        assert_eq!(s.insert((1, 'b')), 0);
        assert_eq!(s.insert((2, 'c')), 1);
        assert_eq!(s.insert((3, 'd')), 3);
        let tags: Vec<char> = s.iter().map(|e| e.1).collect();
        assert_eq!(tags, vec!['b', 'c', 'a', 'd']);
    }

    #[test]
    fn test_small_flat_multiset_counts_and_ranges() {
        let s: SmallFlatMultiset<i32, 4> = SmallFlatMultiset::from([5, 1, 5, 3, 5, 1]);
        assert_eq!(s.as_slice(), &[1, 1, 3, 5, 5, 5]);
        assert!(!s.is_inline());
        assert_eq!(s.count(&5), 3);
        assert_eq!(s.count(&4), 0);
        assert_eq!(s.equal_range(&1), 0..2);
        assert_eq!(s.get_all(&5), &[5, 5, 5]);
        assert_eq!(s.find(&3), Some(2));
        assert_eq!(s.lower_bound(&4), 3);
        assert_eq!(s.upper_bound(&1), 2);
        assert!(s.contains(&1));
    }

    #[test]
    fn test_small_flat_multiset_hint() {
        let mut s: SmallFlatMultiset<i32, 8> = SmallFlatMultiset::from([1, 3, 3, 5]);
        // Anywhere inside or at the edges of the equal run is fine.
        assert_eq!(s.insert_hint(3, 3), 3);
        assert_eq!(s.insert_hint(1, 3), 1);
        // A hint that would break the order is replaced by the search.
        assert_eq!(s.insert_hint(0, 4), 5);
        assert_eq!(s.as_slice(), &[1, 3, 3, 3, 3, 4, 5]);
    }

    #[test]
    fn test_small_flat_multiset_removal() {
        let mut s: SmallFlatMultiset<i32, 4> = SmallFlatMultiset::from([2, 2, 2, 7, 9]);
        assert_eq!(s.remove_one(&2), Some(2));
        assert_eq!(s.count(&2), 2);
        assert_eq!(s.remove_all(&2), 2);
        assert_eq!(s.remove_all(&2), 0);
        assert_eq!(s.remove_one(&8), None);
        assert_eq!(s.remove_index(1), 9);
        assert_eq!(s.as_slice(), &[7]);
        s.erase_range(..);
        assert!(s.is_empty());
    }

    #[test]
    fn test_small_flat_multiset_drops_every_key() {
        let live = Rc::new(Cell::new(0));
        {
            let mut s: SmallFlatMultiset<Tracked, 2> = SmallFlatMultiset::new();
            for v in [4, 4, 1, 4, 2] {
                s.insert(Tracked::new(v, &live));
            }
            assert_eq!(live.get(), 5);
            let needle = Tracked::new(4, &live);
            assert_eq!(s.remove_all(&needle), 3);
            drop(needle);
            assert_eq!(live.get(), 2);
            let copy = s.clone();
            assert_eq!(live.get(), 4);
            assert_eq!(copy, s);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_small_flat_multiset_fallible_insert() {
        let mut s: SmallFlatMultiset<i32, 2> = SmallFlatMultiset::from([1, 1]);
        assert_eq!(
            s.try_insert_with(|| Err::<i32, _>(BuildError::Refused)),
            Err(BuildError::Refused)
        );
        assert_eq!((s.len(), s.is_inline()), (2, true));
        assert_eq!(s.try_insert_with(|| Ok::<_, BuildError>(1)), Ok(0));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_small_flat_multiset_traits() {
        let a: SmallFlatMultiset<i32, 4> = SmallFlatMultiset::from([2, 1, 2]);
        let b: SmallFlatMultiset<i32, 4> = [1, 2, 2].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(format!("{:?}", a), "[1, 2, 2]");
        assert!(a < SmallFlatMultiset::from([1, 3]));
        let owned: Vec<_> = a.into_iter().rev().collect();
        assert_eq!(owned, vec![2, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_small_flat_multiset_sorted_with_counts(
            keys in proptest::collection::vec(0u8..8, 0..64)
        ) {
            let s: SmallFlatMultiset<u8, 4> = keys.iter().copied().collect();
            prop_assert!(s.as_slice().windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(s.len() <= s.capacity() && s.capacity() <= s.max_size());
            for k in 0u8..8 {
                let expected = keys.iter().filter(|&&x| x == k).count();
                prop_assert_eq!(s.count(&k), expected);
            }
        }
    }
}
