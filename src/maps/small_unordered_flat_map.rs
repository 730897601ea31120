//! Unsorted map with unique keys, stored contiguously with a small inline buffer.
//!
//! [`SmallUnorderedFlatMap`] needs nothing but key equality. New entries are appended and
//! lookups scan linearly, which for a handful of entries is as fast as anything else and
//! works for keys that have no order.
//!
//! Removal is O(1): the last entry is moved into the hole. The order of the remaining
//! entries therefore changes, which every removing method mentions.

use core::borrow::Borrow;
use core::fmt;
use core::mem;
use core::ops::{Index, RangeBounds};

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use crate::error::{Error, Result, infallible};
use crate::index::{DefaultEq, Equivalence, unordered};
use crate::maps::entry::{Entry, OccupiedEntry, Removal, VacantEntry};
use crate::maps::{Iter, IterMut, Keys, Values, ValuesMut, key_of};
use crate::raw::growth::Amortized;
use crate::raw::{self, IntoIter, RawFlat};

/// A map with unique keys in insertion order, until something is removed.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `K` | Key type |
/// | `V` | Value type |
/// | `N` | Entries held inline before the first heap allocation |
/// | `E` | Key equality, [`DefaultEq`] (`PartialEq`) by default |
/// | `A` | Allocator for the heap block, `Global` by default |
pub struct SmallUnorderedFlatMap<K, V, const N: usize, E = DefaultEq, A: FlatAllocator = Global> {
    raw: RawFlat<(K, V), N, A>,
    eq: E,
}

impl<K, V, const N: usize, E, A: FlatAllocator> SmallUnorderedFlatMap<K, V, N, E, A> {
    pub fn new() -> Self
    where
        E: Default,
        A: Default,
    {
        Self::with_equivalence_in(E::default(), A::default())
    }

    pub fn with_capacity(capacity: usize) -> Self
    where
        E: Default,
        A: Default,
    {
        infallible(Self::try_with_capacity_in(capacity, A::default()))
    }

    pub fn with_equivalence(eq: E) -> Self
    where
        A: Default,
    {
        Self::with_equivalence_in(eq, A::default())
    }

    pub fn new_in(alloc: A) -> Self
    where
        E: Default,
    {
        Self::with_equivalence_in(E::default(), alloc)
    }

    pub fn with_equivalence_in(eq: E, alloc: A) -> Self {
        Self {
            raw: RawFlat::new_in(alloc),
            eq,
        }
    }

    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self>
    where
        E: Default,
    {
        Ok(Self {
            raw: RawFlat::with_capacity_in(capacity, alloc)?,
            eq: E::default(),
        })
    }

    /// Moves `other`'s entries into a map bound to `alloc`.
    pub fn from_moved_in(other: Self, alloc: A) -> Self {
        let Self { raw, eq } = other;
        Self {
            raw: infallible(RawFlat::move_in(raw, alloc)),
            eq,
        }
    }

    /// Clones the map into one bound to `alloc`, sized exactly to its length.
    pub fn clone_in(&self, alloc: A) -> Self
    where
        K: Clone,
        V: Clone,
        E: Clone,
    {
        Self {
            raw: infallible(self.raw.clone_in(alloc)),
            eq: self.eq.clone(),
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

    pub fn key_eq(&self) -> &E {
        &self.eq
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
    pub fn as_slice(&self) -> &[(K, V)] {
        self.raw.as_slice()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.raw.as_slice())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.raw.as_mut_slice())
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.raw.as_slice().iter(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.raw.as_slice().iter(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.raw.as_mut_slice().iter_mut(),
        }
    }

    /// Iterates from the entry at position `index` to the end.
    ///
    /// # Panics
    /// If `index > len()`.
    pub fn nth(&self, index: usize) -> Iter<'_, K, V> {
        Iter::new(&self.raw.as_slice()[index..])
    }

    pub fn index_of(&self, entry: &(K, V)) -> Option<usize> {
        self.raw.index_of(entry)
    }

    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.raw.as_slice().get(index).map(|e| (&e.0, &e.1))
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        self.raw.as_mut_slice().get_mut(index).map(|e| (&e.0, &mut e.1))
    }

    pub fn at_index(&self, index: usize) -> Result<(&K, &V)> {
        let len = self.len();
        self.get_index(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Removes the entry at `index` in O(1). The last entry takes its place.
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn remove_index(&mut self, index: usize) -> (K, V) {
        self.raw.swap_remove(index)
    }

    /// Removes the entries in `range`, moving as few of the others as possible.
    ///
    /// The entries after the range may end up in a different order.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = raw::bounds(range, self.len());
        self.raw.erase_range_unordered(range);
    }

    /// Keeps only the entries for which `keep` returns `true`, preserving their order.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut keep: F) {
        self.raw.retain_mut(|e| keep(&e.0, &mut e.1));
    }

    /// Exchanges the contents, key equality included, of two maps.
    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
        mem::swap(&mut self.eq, &mut other.eq);
    }

    // --- Keyed lookup ---

    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        unordered::find(self.raw.as_slice(), key, &self.eq, key_of::<K, V, Q>)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.find(key).is_some()
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        usize::from(self.contains_key(key))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.find(key).map(|i| &self.raw.as_slice()[i].1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        let i = self.find(key)?;
        Some(&mut self.raw.as_mut_slice()[i].1)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.find(key).and_then(|i| self.get_index(i))
    }

    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Removes the entry for `key` in O(1). The last entry takes its place.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the entry for `key` in O(1). The last entry takes its place.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        let i = self.find(key)?;
        Some(self.raw.swap_remove(i))
    }
}

// --- Insertion ---

impl<K, V, const N: usize, E: Equivalence<K>, A: FlatAllocator>
    SmallUnorderedFlatMap<K, V, N, E, A>
{
    /// Inserts `value` for `key` at the end, or overwrites the existing value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        infallible(self.try_insert(key, value))
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.find(&key) {
            Some(i) => Ok(Some(mem::replace(&mut self.raw.as_mut_slice()[i].1, value))),
            None => {
                self.raw.try_push((key, value))?;
                Ok(None)
            }
        }
    }

    /// Inserts or overwrites, returning the position of the entry and whether it is new.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (usize, bool) {
        match self.find(&key) {
            Some(i) => {
                self.raw.as_mut_slice()[i].1 = value;
                (i, false)
            }
            None => {
                self.raw.push((key, value));
                (self.len() - 1, true)
            }
        }
    }

    /// Same as inserting without a hint: new entries always go at the end.
    pub fn insert_hint(&mut self, _hint: usize, key: K, value: V) -> (usize, bool) {
        match self.find(&key) {
            Some(i) => (i, false),
            None => {
                self.raw.push((key, value));
                (self.len() - 1, true)
            }
        }
    }

    /// Appends a value made by `make` if `key` is absent; `make` is not called otherwise.
    pub fn try_emplace<F: FnOnce() -> V>(&mut self, key: K, make: F) -> (usize, bool) {
        infallible(self.try_insert_with(key, || Ok::<V, Error>(make())))
    }

    /// Appends a value made by the fallible `make` if `key` is absent. On error the map is
    /// unchanged.
    pub fn try_insert_with<X, F>(&mut self, key: K, make: F) -> Result<(usize, bool), X>
    where
        X: From<Error>,
        F: FnOnce() -> Result<V, X>,
    {
        match self.find(&key) {
            Some(i) => Ok((i, false)),
            None => {
                let end = self.len();
                self.raw.insert_with(end, |_| make().map(|value| (key, value)))?;
                Ok((end, true))
            }
        }
    }

    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, N, A> {
        match self.find(&key) {
            Some(index) => Entry::Occupied(OccupiedEntry {
                raw: &mut self.raw,
                index,
                removal: Removal::SwapLast,
            }),
            None => {
                let index = self.raw.len();
                Entry::Vacant(VacantEntry {
                    raw: &mut self.raw,
                    key,
                    index,
                })
            }
        }
    }
}

// --- Traits ---

impl<K, V, const N: usize, E: Default, A: FlatAllocator + Default> Default
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, const N: usize, E: Clone, A: FlatAllocator> Clone
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().clone())
    }

    fn clone_from(&mut self, source: &Self) {
        infallible(self.raw.assign_clone(&source.raw));
        self.eq = source.eq.clone();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize, E, A: FlatAllocator> fmt::Debug
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Two maps are equal when they hold the same entries, in any order.
impl<K: PartialEq, V: PartialEq, const N: usize, E, A: FlatAllocator> PartialEq
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
    fn eq(&self, other: &Self) -> bool {
        unordered::is_permutation(self.as_slice(), other.as_slice())
    }
}

impl<K: Eq, V: Eq, const N: usize, E, A: FlatAllocator> Eq
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
}

impl<K, V, Q, const N: usize, E, A> Index<&Q> for SmallUnorderedFlatMap<K, V, N, E, A>
where
    K: Borrow<Q>,
    Q: ?Sized,
    E: Equivalence<Q>,
    A: FlatAllocator,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K, V, const N: usize, E: Equivalence<K>, A: FlatAllocator> Extend<(K, V)>
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, const N: usize, E, A> FromIterator<(K, V)> for SmallUnorderedFlatMap<K, V, N, E, A>
where
    E: Equivalence<K> + Default,
    A: FlatAllocator + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: PartialEq, V, const N: usize, const M: usize> From<[(K, V); M]>
    for SmallUnorderedFlatMap<K, V, N>
{
    fn from(entries: [(K, V); M]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V, const N: usize, E, A: FlatAllocator> IntoIterator
    for SmallUnorderedFlatMap<K, V, N, E, A>
{
    type Item = (K, V);
    type IntoIter = IntoIter<(K, V), N, A, Amortized>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, V, const N: usize, E, A: FlatAllocator> IntoIterator
    for &'a SmallUnorderedFlatMap<K, V, N, E, A>
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, const N: usize, E, A: FlatAllocator> IntoIterator
    for &'a mut SmallUnorderedFlatMap<K, V, N, E, A>
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
