//! Fixed-capacity, unsorted set that never allocates.
//!
//! [`StaticUnorderedFlatSet`] holds up to `N` unique keys in its embedded buffer and finds
//! them by linear scan. It suits keys that have equality but no order, in quantities small
//! enough that a scan beats hashing.
//!
//! Removal moves the last key into the hole, so the order of the remaining keys changes.

use core::borrow::Borrow;
use core::fmt;
use core::mem;
use core::ops::RangeBounds;

use allocator_api2::alloc::Global;

use crate::error::{Error, Result, infallible};
use crate::index::{DefaultEq, Equivalence, unordered};
use crate::raw::growth::Fixed;
use crate::raw::{self, IntoIter, RawFlat};
use crate::sets::{Iter, key};

/// An unsorted set of at most `N` unique keys, stored inline.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `K` | Key type |
/// | `N` | Capacity, fixed at compile time; must be greater than zero |
/// | `E` | Key equality, [`DefaultEq`] by default |
pub struct StaticUnorderedFlatSet<K, const N: usize, E = DefaultEq> {
    raw: RawFlat<K, N, Global, Fixed>,
    eq: E,
}

impl<K, const N: usize, E> StaticUnorderedFlatSet<K, N, E> {
    pub fn new() -> Self
    where
        E: Default,
    {
        Self::with_equivalence(E::default())
    }

    pub fn with_equivalence(eq: E) -> Self {
        const { assert!(N > 0, "a fixed-capacity container needs N > 0") };
        Self {
            raw: RawFlat::new_in(Global),
            eq,
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
    pub fn is_full(&self) -> bool {
        self.raw.len() == N
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub const fn max_size(&self) -> usize {
        N
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.raw.available()
    }

    pub fn key_eq(&self) -> &E {
        &self.eq
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

    /// Removes the key at `index` in O(1). The last key takes its place.
    pub fn remove_index(&mut self, index: usize) -> K {
        self.raw.swap_remove(index)
    }

    /// Removes the keys in `range`. The keys after it may change order.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = raw::bounds(range, self.len());
        self.raw.erase_range_unordered(range);
    }

    pub fn retain<F: FnMut(&K) -> bool>(&mut self, mut keep: F) {
        self.raw.retain_mut(|k| keep(k));
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
        mem::swap(&mut self.eq, &mut other.eq);
    }

    pub fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        unordered::find(self.raw.as_slice(), value, &self.eq, key::<K, Q>)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.find(value).is_some()
    }

    pub fn count<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        usize::from(self.contains(value))
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.find(value).map(|i| &self.raw.as_slice()[i])
    }

    /// Removes the key equal to `value` in O(1). The last key takes its place.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the key equal to `value`. The last key takes its place.
    pub fn take<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        let i = self.find(value)?;
        Some(self.raw.swap_remove(i))
    }
}

impl<K, const N: usize, E: Equivalence<K>> StaticUnorderedFlatSet<K, N, E> {
    /// Adds `value` at the end.
    ///
    /// Returns `Ok(false)` if an equal key is already present, even when the set is full,
    /// and `Err(value)` if the key is new but there is no room for it.
    pub fn insert(&mut self, value: K) -> Result<bool, K> {
        if self.contains(&value) {
            return Ok(false);
        }
        if self.is_full() {
            return Err(value);
        }
        self.raw.push(value);
        Ok(true)
    }

    /// Same as [`insert`](Self::insert); the hint is ignored.
    pub fn insert_hint(&mut self, _hint: usize, value: K) -> Result<bool, K> {
        self.insert(value)
    }

    /// Adds `value`, replacing and returning an equal key already present.
    pub fn replace(&mut self, value: K) -> Result<Option<K>, K> {
        match self.find(&value) {
            Some(i) => Ok(Some(mem::replace(&mut self.raw.as_mut_slice()[i], value))),
            None if self.is_full() => Err(value),
            None => {
                self.raw.push(value);
                Ok(None)
            }
        }
    }

    /// Adds the key produced by `make`. An error from `make`, or a full set, leaves the set
    /// unchanged.
    pub fn try_insert_with<X, F>(&mut self, make: F) -> Result<bool, X>
    where
        X: From<Error>,
        F: FnOnce() -> Result<K, X>,
    {
        let value = make()?;
        if self.contains(&value) {
            return Ok(false);
        }
        self.raw.try_push(value)?;
        Ok(true)
    }
}

impl<K, const N: usize, E: Default> Default for StaticUnorderedFlatSet<K, N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, const N: usize, E: Clone> Clone for StaticUnorderedFlatSet<K, N, E> {
    fn clone(&self) -> Self {
        Self {
            raw: infallible(self.raw.clone_in(Global)),
            eq: self.eq.clone(),
        }
    }
}

impl<K: fmt::Debug, const N: usize, E> fmt::Debug for StaticUnorderedFlatSet<K, N, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Two sets are equal when they hold the same keys, in any order.
impl<K: PartialEq, const N: usize, E> PartialEq for StaticUnorderedFlatSet<K, N, E> {
    fn eq(&self, other: &Self) -> bool {
        unordered::is_permutation(self.as_slice(), other.as_slice())
    }
}

impl<K: Eq, const N: usize, E> Eq for StaticUnorderedFlatSet<K, N, E> {}

/// Adds every key.
///
/// # Panics
/// If a new key does not fit; use [`insert`](StaticUnorderedFlatSet::insert) to get it back
/// instead.
impl<K, const N: usize, E: Equivalence<K>> Extend<K> for StaticUnorderedFlatSet<K, N, E> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            if self.insert(value).is_err() {
                Error::CapacityExceeded {
                    requested: N + 1,
                    max: N,
                }
                .raise();
            }
        }
    }
}

impl<K, const N: usize, E: Equivalence<K> + Default> FromIterator<K>
    for StaticUnorderedFlatSet<K, N, E>
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K: PartialEq, const N: usize, const M: usize> From<[K; M]> for StaticUnorderedFlatSet<K, N> {
    fn from(keys: [K; M]) -> Self {
        keys.into_iter().collect()
    }
}

impl<K, const N: usize, E> IntoIterator for StaticUnorderedFlatSet<K, N, E> {
    type Item = K;
    type IntoIter = IntoIter<K, N, Global, Fixed>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, const N: usize, E> IntoIterator for &'a StaticUnorderedFlatSet<K, N, E> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BuildError;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_static_set_insert_until_full() {
        let mut s: StaticUnorderedFlatSet<char, 3> = StaticUnorderedFlatSet::new();
        assert_eq!(s.insert('x'), Ok(true));
        assert_eq!(s.insert('y'), Ok(true));
        assert_eq!(s.insert('x'), Ok(false));
        assert_eq!(s.insert_hint(0, 'z'), Ok(true));
        assert!(s.is_full());
        // A duplicate is reported as present even though there is no room.
        assert_eq!(s.insert('y'), Ok(false));
        assert_eq!(s.insert('w'), Err('w'));
        assert_eq!(s.as_slice(), &['x', 'y', 'z']);
    }

    #[test]
    fn test_static_set_remove_reorders() {
        let mut s: StaticUnorderedFlatSet<i32, 4> = StaticUnorderedFlatSet::from([1, 2, 3, 4]);
        assert!(s.remove(&1));
        assert_eq!(s.as_slice(), &[4, 2, 3]);
        assert_eq!(s.take(&9), None);
        assert_eq!(s.remove_index(1), 2);
        assert_eq!(s.as_slice(), &[4, 3]);
        s.erase_range(0..1);
        assert_eq!(s.as_slice(), &[3]);
    }

    #[test]
    fn test_static_set_replace_and_lookup() {
        let same_len = |a: &&str, b: &&str| a.len() == b.len();
        let mut s: StaticUnorderedFlatSet<&str, 2, _> =
            StaticUnorderedFlatSet::with_equivalence(same_len);
        assert_eq!(s.insert("ab"), Ok(true));
        assert_eq!(s.replace("cd"), Ok(Some("ab")));
        assert_eq!(s.replace("efg"), Ok(None));
        assert_eq!(s.replace("hijk"), Err("hijk"));
        assert_eq!(s.get(&"xy"), Some(&"cd"));
        assert_eq!(s.find(&"xyz"), Some(1));
        assert_eq!(s.count(&"x"), 0);
        assert_eq!(s.at_index(2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn test_static_set_fallible_insert() {
        let mut s: StaticUnorderedFlatSet<i32, 1> = StaticUnorderedFlatSet::new();
        assert_eq!(
            s.try_insert_with(|| Err::<i32, _>(BuildError::Refused)),
            Err(BuildError::Refused)
        );
        assert_eq!(s.try_insert_with(|| Ok::<_, BuildError>(5)), Ok(true));
        assert_eq!(s.try_insert_with(|| Ok::<_, BuildError>(5)), Ok(false));
        assert_eq!(
            s.try_insert_with(|| Ok::<_, BuildError>(6)),
            Err(BuildError::Storage(Error::CapacityExceeded { requested: 2, max: 1 }))
        );
    }

    #[test]
    fn test_static_set_traits() {
        let a: StaticUnorderedFlatSet<i32, 4> = StaticUnorderedFlatSet::from([1, 2, 3]);
        let b: StaticUnorderedFlatSet<i32, 4> = StaticUnorderedFlatSet::from([3, 1, 2]);
        assert_eq!(a, b);
        assert_ne!(a, StaticUnorderedFlatSet::from([1, 2]));
        assert_eq!(format!("{:?}", b), "{3, 1, 2}");
        let mut c = a.clone();
        c.clear();
        c.swap(&mut b.clone());
        assert_eq!(c.len(), 3);
        let sum: i32 = a.into_iter().sum();
        assert_eq!(sum, 6);
    }

    #[test]
    #[should_panic(expected = "exceeds the maximum of 1")]
    fn test_static_set_collect_overflow_panics() {
        let _set: StaticUnorderedFlatSet<i32, 1> = [1, 2].into_iter().collect();
    }

    proptest! {
        #[test]
        fn prop_static_set_matches_hash_set(
            ops in proptest::collection::vec((any::<bool>(), 0u8..12), 0..80)
        ) {
            let mut s: StaticUnorderedFlatSet<u8, 12> = StaticUnorderedFlatSet::new();
            let mut model = HashSet::new();
            for (insert, k) in ops {
                if insert {
                    prop_assert_eq!(s.insert(k), Ok(model.insert(k)));
                } else {
                    prop_assert_eq!(s.remove(&k), model.remove(&k));
                }
                prop_assert!(s.len() <= s.capacity() && s.capacity() <= s.max_size());
            }
            prop_assert_eq!(s.len(), model.len());
            prop_assert!(s.iter().all(|k| model.contains(k)));
        }
    }
}
