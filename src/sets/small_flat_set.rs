//! Sorted set with unique keys, stored contiguously with a small inline buffer.
//!
//! [`SmallFlatSet`] is the key-only sibling of
//! [`SmallFlatMap`](crate::maps::small_flat_map::SmallFlatMap): the same storage engine and
//! the same binary-search lookups, without the value half of each entry.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Range, RangeBounds};
use std::collections::BTreeSet;

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use crate::error::{Error, Result, infallible};
use crate::index::{Compare, Natural, ordered};
use crate::raw::growth::Amortized;
use crate::raw::{self, IntoIter, RawFlat};
use crate::sets::{Iter, key};

/// A set of unique keys kept in sorted order in one contiguous buffer.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `K` | Key type |
/// | `N` | Keys held inline before the first heap allocation |
/// | `C` | Key ordering, [`Natural`] by default |
/// | `A` | Allocator for the heap block, `Global` by default |
///
/// Insertion either succeeds or leaves the set as it was.
pub struct SmallFlatSet<K, const N: usize, C = Natural, A: FlatAllocator = Global> {
    raw: RawFlat<K, N, A>,
    cmp: C,
}

impl<K, const N: usize, C, A: FlatAllocator> SmallFlatSet<K, N, C, A> {
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

    /// Moves `other`'s keys into a set bound to `alloc`. The heap block is taken over when
    /// the two allocators are interchangeable.
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

    /// Drops spare capacity, moving back to the inline buffer when the keys fit in it.
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

    /// Iterates from position `index` to the end.
    ///
    /// # Panics
    /// If `index > len()`.
    pub fn nth(&self, index: usize) -> Iter<'_, K> {
        self.raw.as_slice()[index..].iter()
    }

    pub fn index_of(&self, stored: &K) -> Option<usize> {
        self.raw.index_of(stored)
    }

    pub fn first(&self) -> Option<&K> {
        self.raw.as_slice().first()
    }

    pub fn last(&self) -> Option<&K> {
        self.raw.as_slice().last()
    }

    pub fn get_index(&self, index: usize) -> Option<&K> {
        self.raw.as_slice().get(index)
    }

    pub fn at_index(&self, index: usize) -> Result<&K> {
        let len = self.len();
        self.get_index(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// # Panics
    /// If `index >= len()`.
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

    pub fn count<Q>(&self, value: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        usize::from(self.contains(value))
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

    pub fn equal_range<Q>(&self, value: &Q) -> Range<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::equal_range(self.raw.as_slice(), value, &self.cmp, key::<K, Q>)
    }

    /// The stored key equivalent to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(value).map(|i| &self.raw.as_slice()[i])
    }

    /// Removes the key equivalent to `value`, returning whether there was one.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the key equivalent to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let i = self.find(value)?;
        Some(self.raw.remove(i))
    }
}

impl<K, const N: usize, C: Compare<K>, A: FlatAllocator> SmallFlatSet<K, N, C, A> {
    fn position(&self, value: &K, hint: Option<usize>) -> core::result::Result<usize, usize> {
        ordered::insert_position(self.raw.as_slice(), value, &self.cmp, key::<K, K>, hint)
    }

    /// Adds `value`, returning `true` if it was not already present.
    ///
    /// # Panics
    /// If the set has to grow and cannot.
    pub fn insert(&mut self, value: K) -> bool {
        infallible(self.try_insert(value))
    }

    /// Adds `value`, reporting a failure to grow instead of panicking. On error the set is
    /// unchanged.
    pub fn try_insert(&mut self, value: K) -> Result<bool> {
        match self.position(&value, None) {
            Err(_) => Ok(false),
            Ok(i) => {
                self.raw.try_insert(i, value)?;
                Ok(true)
            }
        }
    }

    /// Adds `value`, trying position `hint` first. An unusable hint is ignored.
    ///
    /// Returns the position of the key and whether it was inserted.
    pub fn insert_hint(&mut self, hint: usize, value: K) -> (usize, bool) {
        match self.position(&value, Some(hint)) {
            Err(i) => (i, false),
            Ok(i) => {
                infallible(self.raw.try_insert(i, value));
                (i, true)
            }
        }
    }

    /// Adds the key produced by the fallible `make`. On error the set is unchanged.
    ///
    /// `make` runs before the position is searched for, so it is always called.
    pub fn try_insert_with<E, F>(&mut self, make: F) -> Result<(usize, bool), E>
    where
        E: From<Error>,
        F: FnOnce() -> Result<K, E>,
    {
        let value = make()?;
        match self.position(&value, None) {
            Err(i) => Ok((i, false)),
            Ok(i) => {
                self.raw.try_insert(i, value)?;
                Ok((i, true))
            }
        }
    }

    /// Adds `value`, replacing and returning an equivalent key already present.
    pub fn replace(&mut self, value: K) -> Option<K> {
        match self.position(&value, None) {
            Err(i) => Some(mem::replace(&mut self.raw.as_mut_slice()[i], value)),
            Ok(i) => {
                infallible(self.raw.try_insert(i, value));
                None
            }
        }
    }
}

impl<K, const N: usize, C: Default, A: FlatAllocator + Default> Default
    for SmallFlatSet<K, N, C, A>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, const N: usize, C: Clone, A: FlatAllocator> Clone for SmallFlatSet<K, N, C, A> {
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().clone())
    }

    fn clone_from(&mut self, source: &Self) {
        infallible(self.raw.assign_clone(&source.raw));
        self.cmp = source.cmp.clone();
    }
}

impl<K: fmt::Debug, const N: usize, C, A: FlatAllocator> fmt::Debug for SmallFlatSet<K, N, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, const N: usize, C, A: FlatAllocator> PartialEq for SmallFlatSet<K, N, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<K: Eq, const N: usize, C, A: FlatAllocator> Eq for SmallFlatSet<K, N, C, A> {}

impl<K: PartialEq, const N: usize, C, A: FlatAllocator> PartialEq<BTreeSet<K>>
    for SmallFlatSet<K, N, C, A>
{
    fn eq(&self, other: &BTreeSet<K>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: PartialOrd, const N: usize, C, A: FlatAllocator> PartialOrd for SmallFlatSet<K, N, C, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<K: Ord, const N: usize, C, A: FlatAllocator> Ord for SmallFlatSet<K, N, C, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<K: Hash, const N: usize, C, A: FlatAllocator> Hash for SmallFlatSet<K, N, C, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<K, const N: usize, C: Compare<K>, A: FlatAllocator> Extend<K> for SmallFlatSet<K, N, C, A> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, K: Copy, const N: usize, C: Compare<K>, A: FlatAllocator> Extend<&'a K>
    for SmallFlatSet<K, N, C, A>
{
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<K, const N: usize, C, A> FromIterator<K> for SmallFlatSet<K, N, C, A>
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

impl<K: Ord, const N: usize, const M: usize> From<[K; M]> for SmallFlatSet<K, N> {
    fn from(keys: [K; M]) -> Self {
        keys.into_iter().collect()
    }
}

impl<K, const N: usize, C, A: FlatAllocator> IntoIterator for SmallFlatSet<K, N, C, A> {
    type Item = K;
    type IntoIter = IntoIter<K, N, A, Amortized>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, const N: usize, C, A: FlatAllocator> IntoIterator for &'a SmallFlatSet<K, N, C, A> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
