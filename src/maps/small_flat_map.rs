//! Sorted map with unique keys, stored contiguously with a small inline buffer.
//!
//! [`SmallFlatMap`] keeps its `(K, V)` entries sorted by key in a single contiguous run.
//! Up to `N` entries live inside the map itself; beyond that the run moves to a heap block
//! from the bound allocator, and moves back when [`shrink_to_fit`](SmallFlatMap::shrink_to_fit)
//! finds that it fits again.
//!
//! Lookups are binary searches; insertion and removal shift the entries after the affected
//! position. For small maps this beats node-based trees on both memory and speed.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Index, Range, RangeBounds};
use std::collections::BTreeMap;

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use crate::error::{Error, Result, infallible};
use crate::index::{Compare, Natural, ordered};
use crate::maps::entry::{Entry, OccupiedEntry, Removal, VacantEntry};
use crate::maps::{Iter, IterMut, Keys, Values, ValuesMut, key_of};
use crate::raw::growth::Amortized;
use crate::raw::{self, IntoIter, RawFlat};

/// A map with unique keys kept in sorted order in one contiguous buffer.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `K` | Key type |
/// | `V` | Value type |
/// | `N` | Entries held inline before the first heap allocation |
/// | `C` | Key ordering, [`Natural`] (ascending `Ord`) by default |
/// | `A` | Allocator for the heap block, `Global` by default |
///
/// # Failure behaviour
/// Every insertion either succeeds or leaves the map exactly as it was. The `try_*`
/// methods report capacity and allocation failures as [`Error`]; the other methods panic
/// on them, like `Vec` does.
///
/// Positions returned by [`find`](Self::find), [`lower_bound`](Self::lower_bound) and the
/// insertion methods are indices into [`as_slice`](Self::as_slice); they stay valid until
/// the next mutation.
pub struct SmallFlatMap<K, V, const N: usize, C = Natural, A: FlatAllocator = Global> {
    raw: RawFlat<(K, V), N, A>,
    cmp: C,
}

impl<K, V, const N: usize, C, A: FlatAllocator> SmallFlatMap<K, V, N, C, A> {
    /// Creates an empty map. Does not allocate.
    pub fn new() -> Self
    where
        C: Default,
        A: Default,
    {
        Self::with_comparator_in(C::default(), A::default())
    }

    /// Creates an empty map able to hold `capacity` entries without reallocating.
    ///
    /// # Panics
    /// If the allocation fails or `capacity` exceeds [`max_size`](Self::max_size).
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

    /// Moves `other`'s entries into a map bound to `alloc`.
    ///
    /// The heap block is taken over when the allocators compare equal; otherwise the entries
    /// are moved into memory from `alloc`.
    pub fn from_moved_in(other: Self, alloc: A) -> Self {
        let Self { raw, cmp } = other;
        Self {
            raw: infallible(RawFlat::move_in(raw, alloc)),
            cmp,
        }
    }

    /// Clones the map into one bound to `alloc`, sized exactly to its length.
    pub fn clone_in(&self, alloc: A) -> Self
    where
        K: Clone,
        V: Clone,
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

    /// Number of entries that fit before the next reallocation.
    #[inline]
    pub fn available(&self) -> usize {
        self.raw.available()
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.raw.max_size()
    }

    /// Returns `true` while the entries live in the inline buffer.
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

    /// Reserves room for exactly `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        infallible(self.try_reserve(additional));
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.raw.try_reserve_exact(additional)
    }

    /// Releases unused capacity, returning to the inline buffer when the entries fit in it.
    pub fn shrink_to_fit(&mut self) {
        infallible(self.raw.shrink_to_fit());
    }

    /// Removes every entry. The heap block, if any, is kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// The entries, sorted by key.
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

    /// Position of `entry`, which must be a reference into this map's storage.
    pub fn index_of(&self, entry: &(K, V)) -> Option<usize> {
        self.raw.index_of(entry)
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.as_slice().first().map(|e| (&e.0, &e.1))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.as_slice().last().map(|e| (&e.0, &e.1))
    }

    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.raw.as_slice().get(index).map(|e| (&e.0, &e.1))
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        self.raw.as_mut_slice().get_mut(index).map(|e| (&e.0, &mut e.1))
    }

    /// Like [`get_index`](Self::get_index), reporting a miss as [`Error::IndexOutOfRange`].
    pub fn at_index(&self, index: usize) -> Result<(&K, &V)> {
        let len = self.len();
        self.get_index(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Removes the entry at `index`, keeping the rest sorted.
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn remove_index(&mut self, index: usize) -> (K, V) {
        self.raw.remove(index)
    }

    /// Removes the entries in `range` (positions, not keys).
    ///
    /// # Panics
    /// If the range is out of bounds.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = raw::bounds(range, self.len());
        self.raw.erase_range(range);
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&mut self, mut keep: F) {
        self.raw.retain_mut(|e| keep(&e.0, &mut e.1));
    }

    /// Exchanges the contents, comparators included, of two maps.
    ///
    /// # Panics
    /// If the allocators are not interchangeable and do not propagate on swap.
    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
        mem::swap(&mut self.cmp, &mut other.cmp);
    }

    // --- Keyed lookup ---

    /// Position of the entry for `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::find(self.raw.as_slice(), key, &self.cmp, key_of::<K, V, Q>)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(key).is_some()
    }

    /// Number of entries for `key`: 0 or 1.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        usize::from(self.contains_key(key))
    }

    /// Position of the first entry whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::lower_bound(self.raw.as_slice(), key, &self.cmp, key_of::<K, V, Q>)
    }

    /// Position of the first entry whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::upper_bound(self.raw.as_slice(), key, &self.cmp, key_of::<K, V, Q>)
    }

    /// Positions of the entries equivalent to `key`; empty or of length one.
    pub fn equal_range<Q>(&self, key: &Q) -> Range<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        ordered::equal_range(self.raw.as_slice(), key, &self.cmp, key_of::<K, V, Q>)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(key).map(|i| &self.raw.as_slice()[i].1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let i = self.find(key)?;
        Some(&mut self.raw.as_mut_slice()[i].1)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.find(key).and_then(|i| self.get_index(i))
    }

    /// Like [`get`](Self::get), reporting a miss as [`Error::KeyNotFound`].
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let i = self.find(key)?;
        Some(self.raw.remove(i))
    }
}

// --- Insertion ---

impl<K, V, const N: usize, C: Compare<K>, A: FlatAllocator> SmallFlatMap<K, V, N, C, A> {
    fn position(&self, key: &K, hint: Option<usize>) -> core::result::Result<usize, usize> {
        ordered::insert_position(
            self.raw.as_slice(),
            key,
            &self.cmp,
            key_of::<K, V, K>,
            hint,
        )
    }

    /// Inserts `value` for `key`, returning the value it replaces, if any.
    ///
    /// # Panics
    /// If the map has to grow and cannot.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        infallible(self.try_insert(key, value))
    }

    /// Inserts `value` for `key`, returning the value it replaces. On error the map is
    /// unchanged and the pair is dropped.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        match self.position(&key, None) {
            Err(i) => Ok(Some(mem::replace(&mut self.raw.as_mut_slice()[i].1, value))),
            Ok(i) => {
                self.raw.try_insert(i, (key, value))?;
                Ok(None)
            }
        }
    }

    /// Inserts or overwrites, returning the position of the entry and whether it is new.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (usize, bool) {
        match self.position(&key, None) {
            Err(i) => {
                self.raw.as_mut_slice()[i].1 = value;
                (i, false)
            }
            Ok(i) => {
                infallible(self.raw.try_insert(i, (key, value)));
                (i, true)
            }
        }
    }

    /// Inserts the pair if `key` is absent, trying position `hint` first.
    ///
    /// The hint is used when the entry before it has a smaller key and the entry at it a
    /// larger one; any other hint is ignored and the position is searched for. When `key`
    /// is already present nothing changes and `value` is dropped.
    ///
    /// Returns the position of the entry for `key` and whether it was inserted.
    pub fn insert_hint(&mut self, hint: usize, key: K, value: V) -> (usize, bool) {
        match self.position(&key, Some(hint)) {
            Err(i) => (i, false),
            Ok(i) => {
                infallible(self.raw.try_insert(i, (key, value)));
                (i, true)
            }
        }
    }

    /// Inserts a value made by `make` if `key` is absent; `make` is not called otherwise.
    pub fn try_emplace<F: FnOnce() -> V>(&mut self, key: K, make: F) -> (usize, bool) {
        infallible(self.try_insert_with(key, || Ok::<V, Error>(make())))
    }

    /// Inserts a value made by the fallible `make` if `key` is absent.
    ///
    /// If `make` fails, or the map cannot grow, the error is returned and the map is left
    /// exactly as it was, capacity and storage location included.
    pub fn try_insert_with<E, F>(&mut self, key: K, make: F) -> Result<(usize, bool), E>
    where
        E: From<Error>,
        F: FnOnce() -> Result<V, E>,
    {
        match self.position(&key, None) {
            Err(i) => Ok((i, false)),
            Ok(i) => {
                self.raw.insert_with(i, |_| make().map(|value| (key, value)))?;
                Ok((i, true))
            }
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, N, A> {
        match self.position(&key, None) {
            Err(index) => Entry::Occupied(OccupiedEntry {
                raw: &mut self.raw,
                index,
                removal: Removal::Shift,
            }),
            Ok(index) => Entry::Vacant(VacantEntry {
                raw: &mut self.raw,
                key,
                index,
            }),
        }
    }
}

// --- Traits ---

impl<K, V, const N: usize, C: Default, A: FlatAllocator + Default> Default
    for SmallFlatMap<K, V, N, C, A>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, const N: usize, C: Clone, A: FlatAllocator> Clone
    for SmallFlatMap<K, V, N, C, A>
{
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().clone())
    }

    fn clone_from(&mut self, source: &Self) {
        infallible(self.raw.assign_clone(&source.raw));
        self.cmp = source.cmp.clone();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize, C, A: FlatAllocator> fmt::Debug
    for SmallFlatMap<K, V, N, C, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, const N: usize, C, A: FlatAllocator> PartialEq
    for SmallFlatMap<K, V, N, C, A>
{
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<K: Eq, V: Eq, const N: usize, C, A: FlatAllocator> Eq for SmallFlatMap<K, V, N, C, A> {}

impl<K: PartialEq, V: PartialEq, const N: usize, C, A: FlatAllocator> PartialEq<BTreeMap<K, V>>
    for SmallFlatMap<K, V, N, C, A>
{
    fn eq(&self, other: &BTreeMap<K, V>) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: PartialOrd, V: PartialOrd, const N: usize, C, A: FlatAllocator> PartialOrd
    for SmallFlatMap<K, V, N, C, A>
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<K: Ord, V: Ord, const N: usize, C, A: FlatAllocator> Ord for SmallFlatMap<K, V, N, C, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<K: Hash, V: Hash, const N: usize, C, A: FlatAllocator> Hash for SmallFlatMap<K, V, N, C, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<K, V, Q, const N: usize, C, A> Index<&Q> for SmallFlatMap<K, V, N, C, A>
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: Compare<Q>,
    A: FlatAllocator,
{
    type Output = V;

    /// # Panics
    /// If `key` is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K, V, const N: usize, C: Compare<K>, A: FlatAllocator> Extend<(K, V)>
    for SmallFlatMap<K, V, N, C, A>
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: Copy, V: Copy, const N: usize, C: Compare<K>, A: FlatAllocator>
    Extend<(&'a K, &'a V)> for SmallFlatMap<K, V, N, C, A>
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(k, v)| (*k, *v)));
    }
}

impl<K, V, const N: usize, C, A> FromIterator<(K, V)> for SmallFlatMap<K, V, N, C, A>
where
    C: Compare<K> + Default,
    A: FlatAllocator + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, const N: usize, const M: usize> From<[(K, V); M]> for SmallFlatMap<K, V, N> {
    fn from(entries: [(K, V); M]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V, const N: usize, C, A: FlatAllocator> IntoIterator for SmallFlatMap<K, V, N, C, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<(K, V), N, A, Amortized>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, K, V, const N: usize, C, A: FlatAllocator> IntoIterator
    for &'a SmallFlatMap<K, V, N, C, A>
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, const N: usize, C, A: FlatAllocator> IntoIterator
    for &'a mut SmallFlatMap<K, V, N, C, A>
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
