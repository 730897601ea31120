//! Fixed-capacity, unsorted multimap that never allocates.
//!
//! [`StaticUnorderedFlatMultimap`] keeps at most `N` entries in its embedded buffer. Equal
//! keys may appear any number of times. Insertion appends, and inserting into a full map
//! hands the entry back as `Err((key, value))` so the caller decides what to do with it.
//!
//! Erasing moves the last entry into the hole, so removal is O(1) and changes the order of
//! the remaining entries.
//!
//! # Design Considerations
//! | Aspect | Choice |
//! |--------|--------|
//! | Storage | the `N` embedded slots only; capacity is always `N` |
//! | Lookup | linear scan with the key-equality predicate `E` |
//! | Overflow | `insert` returns the rejected entry |
//! | Equality | same entries with the same multiplicities, in any order |

use core::borrow::Borrow;
use core::fmt;
use core::mem;
use core::ops::RangeBounds;

use allocator_api2::alloc::Global;

use crate::error::{Error, Result, infallible};
use crate::index::{DefaultEq, Equivalence, unordered};
use crate::maps::{Iter, IterMut, Keys, Values, ValuesMut, key_of};
use crate::raw::growth::Fixed;
use crate::raw::{self, IntoIter, RawFlat};

/// An unsorted multimap holding at most `N` entries inline.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `K` | Key type |
/// | `V` | Value type |
/// | `N` | Capacity, fixed at compile time; must be greater than zero |
/// | `E` | Key equality, [`DefaultEq`] by default |
pub struct StaticUnorderedFlatMultimap<K, V, const N: usize, E = DefaultEq> {
    raw: RawFlat<(K, V), N, Global, Fixed>,
    eq: E,
}

impl<K, V, const N: usize, E> StaticUnorderedFlatMultimap<K, V, N, E> {
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

    /// Returns `true` when no further entry can be inserted.
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

    /// Iterates from position `index` to the end.
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

    /// Removes the entries in `range`. The entries after it may change order.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = raw::bounds(range, self.len());
        self.raw.erase_range_unordered(range);
    }

    /// Keeps only the entries for which `keep` returns `true`, preserving their order.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut keep: F) {
        self.raw.retain_mut(|e| keep(&e.0, &mut e.1));
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
        mem::swap(&mut self.eq, &mut other.eq);
    }

    /// Appends an entry, or hands it back if the map is full.
    ///
    /// Returns the position of the new entry, which is always the last one.
    pub fn insert(&mut self, key: K, value: V) -> Result<usize, (K, V)> {
        if self.is_full() {
            return Err((key, value));
        }
        self.raw.push((key, value));
        Ok(self.len() - 1)
    }

    /// Same as [`insert`](Self::insert); the hint is ignored.
    pub fn insert_hint(&mut self, _hint: usize, key: K, value: V) -> Result<usize, (K, V)> {
        self.insert(key, value)
    }

    /// Appends the entry produced by `make`. `make` is not called when the map is full, and
    /// an error from it leaves the map unchanged.
    pub fn try_insert_with<X, F>(&mut self, make: F) -> Result<usize, X>
    where
        X: From<Error>,
        F: FnOnce() -> Result<(K, V), X>,
    {
        let end = self.len();
        self.raw.insert_with(end, |_| make())?;
        Ok(end)
    }

    // --- Keyed lookup ---

    /// Position of the first entry with a key equal to `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        unordered::find(self.raw.as_slice(), key, &self.eq, key_of::<K, V, Q>)
    }

    /// Position of the next entry with a key equal to `key`, at or after `from`.
    pub fn find_from<Q>(&self, from: usize, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        unordered::find_from(self.raw.as_slice(), from, key, &self.eq, key_of::<K, V, Q>)
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
        unordered::count(self.raw.as_slice(), key, &self.eq, key_of::<K, V, Q>)
    }

    /// First value stored under `key`.
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

    /// Every entry stored under `key`, in storage order.
    pub fn get_all<'a, Q>(&'a self, key: &'a Q) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        self.iter()
            .filter(move |(k, _)| self.eq.equivalent(<K as Borrow<Q>>::borrow(k), key))
    }

    /// Removes every entry stored under `key` and returns how many there were.
    ///
    /// Each removal moves the current last entry into the hole.
    pub fn remove<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        E: Equivalence<Q>,
    {
        let mut removed = 0;
        let mut from = 0;
        while let Some(i) = self.find_from(from, key) {
            self.raw.swap_remove(i);
            removed += 1;
            // The entry moved into `i` has not been looked at yet.
            from = i;
        }
        removed
    }

    /// Removes the first entry stored under `key`. The last entry takes its place.
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

impl<K, V, const N: usize, E: Default> Default for StaticUnorderedFlatMultimap<K, V, N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, const N: usize, E: Clone> Clone
    for StaticUnorderedFlatMultimap<K, V, N, E>
{
    fn clone(&self) -> Self {
        Self {
            raw: infallible(self.raw.clone_in(Global)),
            eq: self.eq.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize, E> fmt::Debug
    for StaticUnorderedFlatMultimap<K, V, N, E>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when both hold the same entries with the same multiplicities, in any order.
impl<K: PartialEq, V: PartialEq, const N: usize, E> PartialEq
    for StaticUnorderedFlatMultimap<K, V, N, E>
{
    fn eq(&self, other: &Self) -> bool {
        unordered::is_permutation(self.as_slice(), other.as_slice())
    }
}

impl<K: Eq, V: Eq, const N: usize, E> Eq for StaticUnorderedFlatMultimap<K, V, N, E> {}

/// Appends every entry.
///
/// # Panics
/// If the map runs out of room; use [`insert`](StaticUnorderedFlatMultimap::insert) to get
/// the rejected entry back instead.
impl<K, V, const N: usize, E> Extend<(K, V)> for StaticUnorderedFlatMultimap<K, V, N, E> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if self.insert(key, value).is_err() {
                Error::CapacityExceeded {
                    requested: N + 1,
                    max: N,
                }
                .raise();
            }
        }
    }
}

impl<K, V, const N: usize, E: Default> FromIterator<(K, V)>
    for StaticUnorderedFlatMultimap<K, V, N, E>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize, const M: usize> From<[(K, V); M]>
    for StaticUnorderedFlatMultimap<K, V, N>
{
    fn from(entries: [(K, V); M]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V, const N: usize, E> IntoIterator for StaticUnorderedFlatMultimap<K, V, N, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<(K, V), N, Global, Fixed>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, V, const N: usize, E> IntoIterator for &'a StaticUnorderedFlatMultimap<K, V, N, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, const N: usize, E> IntoIterator for &'a mut StaticUnorderedFlatMultimap<K, V, N, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
