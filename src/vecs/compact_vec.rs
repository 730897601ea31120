//! Vector whose capacity always equals its length.
//!
//! [`CompactVec`] trades insertion speed for memory: every insertion reallocates to exactly
//! the new length and every removal shrinks to exactly the remaining length, so there is
//! never any slack. An empty `CompactVec` owns no heap block at all.
//!
//! Use it for long-lived, rarely modified sequences where the spare capacity of a `Vec`
//! would be wasted. It `Deref`s to `[T]`, so all slice methods are available.
//!
//! # Design Considerations
//! | Aspect | Choice |
//! |--------|--------|
//! | Growth | exact: `capacity() == len()` after every operation |
//! | Inline buffer | none |
//! | Insertion | always O(n), always one allocation |
//! | Failure | a failed insertion leaves the vector exactly as it was |
//! | Panics | removal, `retain` and `extend` shrink to the surviving length even when unwinding |
//!
//! Shrinking after a removal allocates a smaller block. If the allocator refuses it, the
//! removal still succeeds and the vector keeps its larger block until the next removal
//! manages to shrink it; this is the only way `capacity()` can exceed `len()`.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{Deref, DerefMut, RangeBounds};

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use crate::error::{Error, Result, infallible};
use crate::raw::growth::Exact;
use crate::raw::{self, IntoIter, RawFlat};

/// A contiguous growable array with no spare capacity.
///
/// # Generic parameters
/// | Parameter | Meaning |
/// |-----------|---------|
/// | `T` | Element type |
/// | `A` | Allocator for the heap block, `Global` by default |
pub struct CompactVec<T, A: FlatAllocator = Global> {
    raw: RawFlat<T, 0, A, Exact>,
}

impl<T, A: FlatAllocator> CompactVec<T, A> {
    /// Creates an empty vector. Does not allocate.
    pub fn new() -> Self
    where
        A: Default,
    {
        Self::new_in(A::default())
    }

    pub fn new_in(alloc: A) -> Self {
        Self {
            raw: RawFlat::new_in(alloc),
        }
    }

    /// Creates a vector of `n` clones of `value`.
    pub fn from_elem(value: T, n: usize) -> Self
    where
        T: Clone,
        A: Default,
    {
        let mut v = Self::new();
        v.resize(n, value);
        v
    }

    /// Moves `other`'s elements into a vector bound to `alloc`.
    pub fn from_moved_in(other: Self, alloc: A) -> Self {
        Self {
            raw: infallible(RawFlat::move_in(other.raw, alloc)),
        }
    }

    pub fn clone_in(&self, alloc: A) -> Self
    where
        T: Clone,
    {
        Self {
            raw: infallible(self.raw.clone_in(alloc)),
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

    /// Always equal to [`len`](Self::len).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.raw.max_size()
    }

    pub fn allocator(&self) -> &A {
        self.raw.allocator()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.raw.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }

    /// Iterates from position `index` to the end.
    ///
    /// # Panics
    /// If `index > len()`.
    pub fn nth(&self, index: usize) -> core::slice::Iter<'_, T> {
        self.as_slice()[index..].iter()
    }

    pub fn index_of(&self, elem: &T) -> Option<usize> {
        self.raw.index_of(elem)
    }

    /// Like indexing, reporting an out-of-range position as [`Error::IndexOutOfRange`].
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len();
        self.as_slice()
            .get(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len();
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    // --- Insertion ---

    pub fn push(&mut self, value: T) {
        self.raw.push(value);
    }

    pub fn try_push(&mut self, value: T) -> Result<()> {
        self.raw.try_push(value)
    }

    /// # Panics
    /// If `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) {
        infallible(self.raw.try_insert(index, value));
    }

    pub fn try_insert(&mut self, index: usize, value: T) -> Result<()> {
        self.raw.try_insert(index, value)
    }

    /// Inserts `n` clones of `value` at `index`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &T)
    where
        T: Clone,
    {
        infallible(self.raw.insert_n_with(index, n, |_, _| Ok::<T, Error>(value.clone())));
    }

    /// Inserts clones of the elements of `values` at `index`.
    ///
    /// If a `clone` panics the vector is left as it was.
    pub fn insert_from_slice(&mut self, index: usize, values: &[T])
    where
        T: Clone,
    {
        infallible(
            self.raw
                .insert_n_with(index, values.len(), |_, i| Ok::<T, Error>(values[i].clone())),
        );
    }

    /// Inserts at `index` the element produced by `make`, which sees the current contents.
    ///
    /// The element is constructed before anything is moved, so it may be derived from any
    /// existing element. An error from `make`, or a failure to allocate, leaves the vector
    /// exactly as it was.
    pub fn insert_with<E, F>(&mut self, index: usize, make: F) -> Result<(), E>
    where
        E: From<Error>,
        F: FnOnce(&[T]) -> Result<T, E>,
    {
        self.raw.insert_with(index, make)
    }

    pub fn extend_from_slice(&mut self, values: &[T])
    where
        T: Clone,
    {
        self.insert_from_slice(self.len(), values);
    }

    /// Resizes to `new_len`, filling with clones of `value` or truncating.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        let len = self.len();
        if new_len <= len {
            self.truncate(new_len);
        } else {
            self.insert_n(len, new_len - len, &value);
        }
    }

    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, f: F) {
        self.raw.resize_with(new_len, f);
    }

    // --- Removal ---

    pub fn pop(&mut self) -> Option<T> {
        self.raw.pop()
    }

    /// # Panics
    /// If `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        self.raw.remove(index)
    }

    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let range = raw::bounds(range, self.len());
        self.raw.erase_range(range);
    }

    pub fn truncate(&mut self, len: usize) {
        self.raw.truncate(len);
    }

    /// Removes every element and releases the heap block.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) {
        self.retain_mut(|x| keep(x));
    }

    pub fn retain_mut<F: FnMut(&mut T) -> bool>(&mut self, keep: F) {
        self.raw.retain_mut(keep);
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.raw.swap(&mut other.raw);
    }
}

impl<T, A: FlatAllocator> Deref for CompactVec<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.raw.as_slice()
    }
}

impl<T, A: FlatAllocator> DerefMut for CompactVec<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }
}

impl<T, A: FlatAllocator + Default> Default for CompactVec<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, A: FlatAllocator> Clone for CompactVec<T, A> {
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().clone())
    }

    fn clone_from(&mut self, source: &Self) {
        infallible(self.raw.assign_clone(&source.raw));
    }
}

impl<T: fmt::Debug, A: FlatAllocator> fmt::Debug for CompactVec<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, A: FlatAllocator> PartialEq for CompactVec<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: FlatAllocator> Eq for CompactVec<T, A> {}

impl<T: PartialEq, A: FlatAllocator> PartialEq<[T]> for CompactVec<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: FlatAllocator> PartialEq<Vec<T>> for CompactVec<T, A> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialOrd, A: FlatAllocator> PartialOrd for CompactVec<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, A: FlatAllocator> Ord for CompactVec<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, A: FlatAllocator> Hash for CompactVec<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

/// Reserves for the iterator's lower size bound up front, then trims to the exact length.
impl<T, A: FlatAllocator> Extend<T> for CompactVec<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.raw.extend_known(iter);
    }
}

impl<'a, T: Copy + 'a, A: FlatAllocator> Extend<&'a T> for CompactVec<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.raw.extend_known(iter.into_iter().copied());
    }
}

impl<T, A: FlatAllocator + Default> FromIterator<T> for CompactVec<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<T, const M: usize> From<[T; M]> for CompactVec<T> {
    fn from(values: [T; M]) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for CompactVec<T> {
    fn from(values: &[T]) -> Self {
        let mut v = Self::new();
        v.extend_from_slice(values);
        v
    }
}

impl<T, A: FlatAllocator> IntoIterator for CompactVec<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, 0, A, Exact>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.raw)
    }
}

impl<'a, T, A: FlatAllocator> IntoIterator for &'a CompactVec<T, A> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: FlatAllocator> IntoIterator for &'a mut CompactVec<T, A> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
