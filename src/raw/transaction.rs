//! Mutations of a single engine: insert, erase, relocate.
//!
//! Every path that can fail midway (an element constructor returning `Err`, a panicking
//! constructor or drop, an allocator refusing a block) is built so the container is left
//! exactly as it was, or, where noted, in a valid but reduced state. The invariant that makes
//! this work is simple: the new values are built first, in slots that are not part of the
//! live range, and only once all of them exist is anything already live moved.

use core::mem;
use core::ops::Range;
use core::ptr::{self, NonNull};
use core::slice;

use super::RawFlat;
use super::growth::GrowthPolicy;
use super::storage::AllocatorBinding;
use crate::alloc::FlatAllocator;
use crate::error::{Error, Result, infallible};

// --- Rollback guards ---

/// Values built so far into slots outside the live range. Dropping the guard drops them.
struct Built<T> {
    first: *mut T,
    count: usize,
}

impl<T> Drop for Built<T> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.first, self.count)) };
    }
}

/// A fresh buffer being filled. Dropping the guard drops what was built and releases the
/// heap block, if there is one.
struct Staging<'a, T, A: FlatAllocator> {
    binding: &'a AllocatorBinding<A>,
    block: Option<NonNull<T>>,
    cap: usize,
    first: *mut T,
    count: usize,
}

impl<T, A: FlatAllocator> Drop for Staging<'_, T, A> {
    fn drop(&mut self) {
        unsafe {
            AllocatorBinding::<A>::destroy_range(self.first, self.count);
            if let Some(block) = self.block {
                self.binding.deallocate(block, self.cap);
            }
        }
    }
}

/// Moves `count` values from `src` to `dst` and publishes `new_len` when dropped, whether the
/// scope ends normally or by unwinding out of an element drop.
struct Backfill<'a, T> {
    base: *mut T,
    src: usize,
    dst: usize,
    count: usize,
    len: &'a mut usize,
    new_len: usize,
}

impl<T> Drop for Backfill<'_, T> {
    fn drop(&mut self) {
        unsafe { ptr::copy(self.base.add(self.src), self.base.add(self.dst), self.count) };
        *self.len = self.new_len;
    }
}

// --- Capacity ---

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> RawFlat<T, N, A, G> {
    /// Returns the buffer that will receive `cap` slots: the embedded one when the request
    /// fits in it and a heap block is currently active, a fresh heap block otherwise.
    fn acquire(&self, cap: usize) -> Result<Option<NonNull<T>>> {
        if cap <= N {
            debug_assert!(!self.is_inline());
            Ok(None)
        } else {
            self.binding.allocate::<T>(cap).map(Some)
        }
    }

    /// Moves every live value into a buffer of exactly `target` slots, or into the embedded
    /// buffer when `target <= N`.
    ///
    /// Failing to obtain the new block leaves the container untouched.
    pub(crate) fn relocate(&mut self, target: usize) -> Result<()> {
        let len = self.handle.len;
        debug_assert!(target >= len);
        if target <= N && self.is_inline() {
            return Ok(());
        }
        if target > N && target == self.handle.cap {
            return Ok(());
        }
        let block = self.acquire(target)?;
        let src = self.base();
        let dst = match block {
            Some(block) => block.as_ptr(),
            None => self.inline.as_mut_ptr(),
        };
        unsafe { ptr::copy_nonoverlapping(src, dst, len) };
        self.adopt(block, target, len);
        Ok(())
    }

    /// Ensures `capacity() >= total`. A request that is already satisfied does nothing.
    pub(crate) fn try_reserve(&mut self, total: usize) -> Result<()> {
        if total <= self.handle.cap {
            return Ok(());
        }
        let max = self.max_size();
        if total > max {
            return Err(Error::CapacityExceeded {
                requested: total,
                max,
            });
        }
        self.relocate(total)
    }

    /// Ensures `capacity() >= len() + additional`, allocating exactly that much if needed.
    pub(crate) fn try_reserve_exact(&mut self, additional: usize) -> Result<()> {
        match self.handle.len.checked_add(additional) {
            Some(total) => self.try_reserve(total),
            None => Err(Error::CapacityExceeded {
                requested: usize::MAX,
                max: self.max_size(),
            }),
        }
    }

    /// Ensures room for `additional` more values, growing the way an insertion would.
    pub(crate) fn try_reserve_for(&mut self, additional: usize) -> Result<()> {
        if self.available() >= additional {
            return Ok(());
        }
        let cap = G::grow(self.handle.len, additional, N, self.max_size())?;
        self.relocate(cap)
    }

    /// Drops the slack: the heap block is replaced by one of exactly `len` slots, or by the
    /// embedded buffer when the values fit in it. Calling it twice is the same as once.
    pub(crate) fn shrink_to_fit(&mut self) -> Result<()> {
        if self.handle.len < self.handle.cap {
            self.relocate(self.handle.len)?;
        }
        Ok(())
    }

    /// Restores `capacity() == len()` after an erase under a zero-slack policy.
    ///
    /// A refused block keeps the current one; the values are untouched either way.
    #[inline]
    fn settle(&mut self) {
        if G::ZERO_SLACK {
            let _ = self.shrink_to_fit();
        }
    }

    /// Runs `f` and settles afterwards, also when `f` unwinds.
    #[inline]
    pub(crate) fn settle_after<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut guard = Settle(self);
        f(&mut *guard.0)
    }
}

/// Settles the engine it points at when dropped.
struct Settle<'a, T, const N: usize, A: FlatAllocator, G: GrowthPolicy>(
    &'a mut RawFlat<T, N, A, G>,
);

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> Drop for Settle<'_, T, N, A, G> {
    fn drop(&mut self) {
        self.0.settle();
    }
}

// --- Insertion ---

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> RawFlat<T, N, A, G> {
    /// Inserts `n` values produced by `make` so that the first of them lands at `pos`.
    ///
    /// `make` is called `n` times with a view of the live values as they were before the
    /// call and the index of the value to produce. If any call returns `Err`, or panics, the
    /// values already produced are dropped and the container is unchanged: same values,
    /// same order, same capacity, same buffer.
    ///
    /// # Panics
    /// If `pos > len()`.
    pub(crate) fn insert_n_with<E, F>(&mut self, pos: usize, n: usize, mut make: F) -> Result<(), E>
    where
        E: From<Error>,
        F: FnMut(&[T], usize) -> Result<T, E>,
    {
        let len = self.handle.len;
        assert!(pos <= len, "insertion index (is {pos}) should be <= len (is {len})");
        if n == 0 {
            return Ok(());
        }

        if self.available() >= n {
            let base = self.base_mut();
            let live = unsafe { slice::from_raw_parts(base as *const T, len) };
            let mut built = Built {
                first: unsafe { base.add(len) },
                count: 0,
            };
            while built.count < n {
                let value = make(live, built.count)?;
                unsafe { AllocatorBinding::<A>::construct(built.first.add(built.count), value) };
                built.count += 1;
            }
            mem::forget(built);
            // The new values sit at the end; rotate them into place.
            unsafe { slice::from_raw_parts_mut(base.add(pos), len + n - pos).rotate_right(n) };
            self.handle.len = len + n;
            return Ok(());
        }

        let cap = G::grow(len, n, N, self.max_size())?;
        let block = self.acquire(cap)?;
        let old = self.base_mut();
        let new = match block {
            Some(block) => block.as_ptr(),
            None => self.inline.as_mut_ptr(),
        };
        let mut staging = Staging {
            binding: &self.binding,
            block,
            cap,
            first: unsafe { new.add(pos) },
            count: 0,
        };
        let live = unsafe { slice::from_raw_parts(old as *const T, len) };
        while staging.count < n {
            let value = make(live, staging.count)?;
            unsafe { AllocatorBinding::<A>::construct(staging.first.add(staging.count), value) };
            staging.count += 1;
        }
        mem::forget(staging);
        unsafe {
            ptr::copy_nonoverlapping(old, new, pos);
            ptr::copy_nonoverlapping(old.add(pos), new.add(pos + n), len - pos);
        }
        self.adopt(block, cap, len + n);
        Ok(())
    }

    /// Inserts the value produced by `make` at `pos`. See
    /// [`insert_n_with`](Self::insert_n_with) for the failure guarantee.
    pub(crate) fn insert_with<E, F>(&mut self, pos: usize, make: F) -> Result<(), E>
    where
        E: From<Error>,
        F: FnOnce(&[T]) -> Result<T, E>,
    {
        let mut make = Some(make);
        self.insert_n_with(pos, 1, |live, _| match make.take() {
            Some(make) => make(live),
            None => unreachable!("a single insertion constructs exactly one value"),
        })
    }

    #[inline]
    pub(crate) fn try_insert(&mut self, pos: usize, value: T) -> Result<()> {
        self.insert_with(pos, |_| Ok(value))
    }

    #[inline]
    pub(crate) fn try_push(&mut self, value: T) -> Result<()> {
        self.try_insert(self.handle.len, value)
    }

    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        infallible(self.try_push(value));
    }

    /// Appends every item, one at a time. A panicking iterator leaves the items appended so
    /// far in place.
    pub(crate) fn extend_lazy<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }

    /// Appends every item after reserving for the iterator's lower size bound.
    pub(crate) fn extend_known<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        infallible(self.try_reserve_for(iter.size_hint().0));
        self.settle_after(|raw| raw.extend_lazy(iter));
    }

    /// Grows to `new_len` with values from `f`, or truncates down to it.
    pub(crate) fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) {
        let len = self.handle.len;
        if new_len <= len {
            self.truncate(new_len);
        } else {
            infallible(self.insert_n_with(len, new_len - len, |_, _| Ok::<T, Error>(f())));
        }
    }
}

// --- Erasure ---

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> RawFlat<T, N, A, G> {
    /// Removes and returns the value at `index`, shifting the tail left.
    ///
    /// # Panics
    /// If `index >= len()`.
    pub(crate) fn remove(&mut self, index: usize) -> T {
        let len = self.handle.len;
        assert!(index < len, "removal index (is {index}) should be < len (is {len})");
        let value = unsafe {
            let slot = self.base_mut().add(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, len - index - 1);
            value
        };
        self.handle.len = len - 1;
        self.settle();
        value
    }

    /// Removes and returns the value at `index`, moving the last value into its slot.
    ///
    /// O(1), but the order of the remaining values changes.
    ///
    /// # Panics
    /// If `index >= len()`.
    pub(crate) fn swap_remove(&mut self, index: usize) -> T {
        let len = self.handle.len;
        assert!(index < len, "swap_remove index (is {index}) should be < len (is {len})");
        let value = unsafe {
            let base = self.base_mut();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(len - 1), base.add(index), 1);
            value
        };
        self.handle.len = len - 1;
        self.settle();
        value
    }

    /// Removes the last value.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.handle.len == 0 {
            return None;
        }
        self.handle.len -= 1;
        let value = unsafe { ptr::read(self.base().add(self.handle.len)) };
        self.settle();
        Some(value)
    }

    fn check_range(&self, range: &Range<usize>) {
        let len = self.handle.len;
        assert!(
            range.start <= range.end && range.end <= len,
            "erase range {}..{} out of bounds for length {len}",
            range.start,
            range.end
        );
    }

    /// Drops `range` and shifts the tail left, preserving order.
    pub(crate) fn erase_range(&mut self, range: Range<usize>) {
        self.check_range(&range);
        let Range { start, end } = range;
        if start == end {
            return;
        }
        self.settle_after(|raw| {
            let len = raw.handle.len;
            raw.handle.len = start;
            let base = raw.base_mut();
            let _backfill = Backfill {
                base,
                src: end,
                dst: start,
                count: len - end,
                len: &mut raw.handle.len,
                new_len: len - (end - start),
            };
            unsafe { AllocatorBinding::<A>::destroy_range(base.add(start), end - start) };
        });
    }

    /// Drops `range` and fills the hole with as few moves as possible.
    ///
    /// When the erased run is at least as long as the tail, the tail is shifted left;
    /// otherwise the last `range.len()` values are moved into the hole. Either way at most
    /// `min(range.len(), len() - range.end)` values move, and the order of the survivors is
    /// not preserved.
    pub(crate) fn erase_range_unordered(&mut self, range: Range<usize>) {
        self.check_range(&range);
        let Range { start, end } = range;
        if start == end {
            return;
        }
        let len = self.handle.len;
        let erased = end - start;
        let tail = len - end;
        let (src, count) = if erased >= tail {
            (end, tail)
        } else {
            (len - erased, erased)
        };
        self.settle_after(|raw| {
            raw.handle.len = start;
            let base = raw.base_mut();
            let _backfill = Backfill {
                base,
                src,
                dst: start,
                count,
                len: &mut raw.handle.len,
                new_len: len - erased,
            };
            unsafe { AllocatorBinding::<A>::destroy_range(base.add(start), erased) };
        });
    }

    /// Drops every value from `new_len` on. Does nothing if `new_len >= len()`.
    pub(crate) fn truncate(&mut self, new_len: usize) {
        let len = self.handle.len;
        if new_len >= len {
            return;
        }
        self.settle_after(|raw| {
            raw.handle.len = new_len;
            let base = raw.base_mut();
            unsafe { AllocatorBinding::<A>::destroy_range(base.add(new_len), len - new_len) };
        });
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.truncate(0);
    }

    /// Keeps the values for which `keep` returns `true`, in order.
    ///
    /// If `keep` panics, the values not yet visited are kept and the live range stays
    /// contiguous.
    pub(crate) fn retain_mut<F: FnMut(&mut T) -> bool>(&mut self, mut keep: F) {
        struct Backshift<'a, T> {
            base: *mut T,
            processed: usize,
            deleted: usize,
            original_len: usize,
            len: &'a mut usize,
        }

        impl<T> Drop for Backshift<'_, T> {
            fn drop(&mut self) {
                if self.deleted > 0 {
                    unsafe {
                        ptr::copy(
                            self.base.add(self.processed),
                            self.base.add(self.processed - self.deleted),
                            self.original_len - self.processed,
                        )
                    };
                }
                *self.len = self.original_len - self.deleted;
            }
        }

        self.settle_after(|raw| {
            let original_len = raw.handle.len;
            raw.handle.len = 0;
            let base = raw.base_mut();
            let mut g = Backshift {
                base,
                processed: 0,
                deleted: 0,
                original_len,
                len: &mut raw.handle.len,
            };
            while g.processed < g.original_len {
                let cur = unsafe { g.base.add(g.processed) };
                if !keep(unsafe { &mut *cur }) {
                    g.processed += 1;
                    g.deleted += 1;
                    unsafe { AllocatorBinding::<A>::destroy(cur) };
                    continue;
                }
                if g.deleted > 0 {
                    unsafe { ptr::copy_nonoverlapping(cur, cur.sub(g.deleted), 1) };
                }
                g.processed += 1;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::growth::{Amortized, Exact, Fixed};
    use super::*;
    use crate::testing::{BuildError, CountingAlloc, Tracked};
    use allocator_api2::alloc::Global;
    use core::cell::Cell;
    use proptest::prelude::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    type Raw<T, const N: usize> = RawFlat<T, N, CountingAlloc, Amortized>;

    fn filled<const N: usize>(alloc: &CountingAlloc, n: i32) -> Raw<i32, N> {
        let mut raw = RawFlat::new_in(alloc.clone());
        for i in 0..n {
            raw.push(i);
        }
        raw
    }

    #[test]
    fn test_transaction_insert_in_place_shifts_tail() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 8> = filled(&alloc, 4);
        raw.try_insert(1, 100).unwrap();
        assert_eq!(raw.as_slice(), &[0, 100, 1, 2, 3]);
        raw.try_insert(5, 200).unwrap();
        assert_eq!(raw.as_slice(), &[0, 100, 1, 2, 3, 200]);
        assert!(raw.is_inline());
        assert_eq!(alloc.allocations(), 0);
    }

    #[test]
    fn test_transaction_growth_sequence() {
        // N = 4: inline up to 4, then 8, then 16.
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 4> = filled(&alloc, 4);
        assert_eq!((raw.capacity(), raw.is_inline()), (4, true));
        raw.push(4);
        assert_eq!((raw.len(), raw.capacity(), raw.is_inline()), (5, 8, false));
        for i in 5..9 {
            raw.push(i);
        }
        assert_eq!(raw.capacity(), 16);
        assert_eq!(raw.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(alloc.live_blocks(), 1);
        assert_eq!(alloc.allocations(), 2);
    }

    #[test]
    fn test_transaction_failed_constructor_on_full_inline_is_noop() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 4> = filled(&alloc, 4);
        let result = raw.insert_with(2, |_| Err::<i32, _>(BuildError::Refused));
        assert_eq!(result, Err(BuildError::Refused));
        assert_eq!(raw.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(raw.capacity(), 4);
        assert!(raw.is_inline());
        assert_eq!(alloc.live_blocks(), 0);
    }

    #[test]
    fn test_transaction_failed_constructor_in_place_is_noop() {
        let live = Rc::new(Cell::new(0));
        let mut raw: RawFlat<Tracked, 8> = RawFlat::new_in(Global);
        for i in 0..3 {
            raw.push(Tracked::new(i, &live));
        }
        let result = raw.insert_n_with(1, 3, |_, i| {
            if i == 2 {
                Err(BuildError::Refused)
            } else {
                Ok(Tracked::new(10 + i as i32, &live))
            }
        });
        assert_eq!(result.unwrap_err(), BuildError::Refused);
        assert_eq!(live.get(), 3);
        let values: Vec<i32> = raw.as_slice().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_transaction_panicking_constructor_releases_new_block() {
        let live = Rc::new(Cell::new(0));
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<Tracked, 2> = RawFlat::new_in(alloc.clone());
        raw.push(Tracked::new(0, &live));
        raw.push(Tracked::new(1, &live));
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _ = raw.insert_n_with(0, 3, |_, i| {
                if i == 1 {
                    panic!("constructor exploded");
                }
                Ok::<_, Error>(Tracked::new(99, &live))
            });
        }));
        assert!(result.is_err());
        assert_eq!(live.get(), 2);
        assert_eq!(alloc.live_blocks(), 0);
        assert!(raw.is_inline());
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn test_transaction_allocation_failure_is_noop() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 2> = filled(&alloc, 2);
        alloc.fail_next();
        assert!(matches!(
            raw.try_push(9),
            Err(Error::AllocationFailed { .. })
        ));
        assert_eq!(raw.as_slice(), &[0, 1]);
        assert!(raw.is_inline());
    }

    #[test]
    fn test_transaction_constructor_sees_current_contents() {
        let mut raw: RawFlat<String, 2> = RawFlat::new_in(Global);
        raw.push("a".to_string());
        raw.push("b".to_string());
        // Spills while deriving the new value from an existing one.
        raw.insert_with(0, |live| Ok::<_, Error>(live[1].clone() + "!"))
            .unwrap();
        assert_eq!(raw.as_slice(), &["b!", "a", "b"]);
    }

    #[test]
    fn test_transaction_fixed_policy_rejects_overflow() {
        let mut raw: RawFlat<i32, 2, Global, Fixed> = RawFlat::new_in(Global);
        raw.try_push(1).unwrap();
        raw.try_push(2).unwrap();
        assert_eq!(
            raw.try_push(3),
            Err(Error::CapacityExceeded {
                requested: 3,
                max: 2
            })
        );
        assert_eq!(raw.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_transaction_reserve_and_shrink() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 4> = filled(&alloc, 3);
        raw.try_reserve(2).unwrap();
        assert!(raw.is_inline());
        raw.try_reserve(20).unwrap();
        assert_eq!(raw.capacity(), 20);
        assert_eq!(raw.as_slice(), &[0, 1, 2]);
        raw.shrink_to_fit().unwrap();
        assert!(raw.is_inline());
        assert_eq!(raw.capacity(), 4);
        assert_eq!(alloc.live_blocks(), 0);
        raw.shrink_to_fit().unwrap();
        assert_eq!(raw.capacity(), 4);
        assert_eq!(alloc.allocations(), 1);
    }

    #[test]
    fn test_transaction_shrink_keeps_heap_when_too_big() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 4> = filled(&alloc, 9);
        assert_eq!(raw.capacity(), 16);
        raw.shrink_to_fit().unwrap();
        assert_eq!(raw.capacity(), 9);
        assert!(!raw.is_inline());
        raw.truncate(3);
        raw.shrink_to_fit().unwrap();
        assert!(raw.is_inline());
        assert_eq!(raw.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_transaction_reserve_past_max() {
        let mut raw: RawFlat<u64, 4> = RawFlat::new_in(Global);
        assert!(matches!(
            raw.try_reserve(usize::MAX),
            Err(Error::CapacityExceeded { .. })
        ));
        assert!(raw.is_inline());
    }

    #[test]
    fn test_transaction_remove_and_swap_remove() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 8> = filled(&alloc, 5);
        assert_eq!(raw.remove(1), 1);
        assert_eq!(raw.as_slice(), &[0, 2, 3, 4]);
        assert_eq!(raw.swap_remove(0), 0);
        assert_eq!(raw.as_slice(), &[4, 2, 3]);
        assert_eq!(raw.pop(), Some(3));
        assert_eq!(raw.as_slice(), &[4, 2]);
    }

    #[test]
    fn test_transaction_erase_range_ordered() {
        let live = Rc::new(Cell::new(0));
        let mut raw: RawFlat<Tracked, 4> = RawFlat::new_in(Global);
        for i in 0..10 {
            raw.push(Tracked::new(i, &live));
        }
        raw.erase_range(2..5);
        let values: Vec<i32> = raw.as_slice().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0, 1, 5, 6, 7, 8, 9]);
        assert_eq!(live.get(), 7);
        raw.erase_range(3..3);
        assert_eq!(raw.len(), 7);
    }

    #[test]
    fn test_transaction_erase_range_unordered_moves_minimum() {
        let alloc = CountingAlloc::new(1);
        // Erased run shorter than the tail: the last two fill the hole.
        let mut raw: Raw<i32, 16> = filled(&alloc, 8);
        raw.erase_range_unordered(1..3);
        assert_eq!(raw.as_slice(), &[0, 6, 7, 3, 4, 5]);
        // Erased run longer than the tail: the tail shifts left.
        let mut raw: Raw<i32, 16> = filled(&alloc, 8);
        raw.erase_range_unordered(2..6);
        assert_eq!(raw.as_slice(), &[0, 1, 6, 7]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_transaction_erase_range_out_of_bounds() {
        let mut raw: RawFlat<i32, 4> = RawFlat::new_in(Global);
        raw.push(1);
        raw.erase_range(0..2);
    }

    #[test]
    fn test_transaction_exact_policy_tracks_length() {
        let alloc = CountingAlloc::new(1);
        let mut raw: RawFlat<i32, 0, CountingAlloc, Exact> = RawFlat::new_in(alloc.clone());
        for i in 0..5 {
            raw.push(i);
            assert_eq!(raw.capacity(), raw.len());
        }
        raw.remove(0);
        assert_eq!((raw.len(), raw.capacity()), (4, 4));
        raw.erase_range(0..2);
        assert_eq!((raw.len(), raw.capacity()), (2, 2));
        raw.retain_mut(|v| *v != 3);
        assert_eq!(raw.as_slice(), &[4]);
        assert_eq!(raw.capacity(), 1);
        raw.clear();
        assert_eq!(raw.capacity(), 0);
        assert_eq!(alloc.live_blocks(), 0);
    }

    #[test]
    fn test_transaction_exact_policy_settles_when_predicate_panics() {
        let mut raw: RawFlat<u32, 0, Global, Exact> = RawFlat::new_in(Global);
        raw.extend_lazy(0..10);
        let result = catch_unwind(AssertUnwindSafe(|| {
            raw.retain_mut(|x| {
                if *x == 8 {
                    panic!("predicate exploded");
                }
                *x % 2 == 0
            });
        }));
        assert!(result.is_err());
        assert_eq!(raw.as_slice(), &[0, 2, 4, 6, 8, 9]);
        assert_eq!(raw.capacity(), raw.len());
    }

    #[test]
    fn test_transaction_exact_policy_settles_when_iterator_panics() {
        let mut raw: RawFlat<u32, 0, Global, Exact> = RawFlat::new_in(Global);
        let result = catch_unwind(AssertUnwindSafe(|| {
            raw.extend_known((0..10).map(|i| {
                if i == 3 {
                    panic!("iterator exploded");
                }
                i
            }));
        }));
        assert!(result.is_err());
        assert_eq!(raw.as_slice(), &[0, 1, 2]);
        assert_eq!(raw.capacity(), 3);
    }

    #[test]
    fn test_transaction_exact_policy_keeps_block_when_shrink_is_refused() {
        let alloc = CountingAlloc::new(1);
        let mut raw: RawFlat<i32, 0, CountingAlloc, Exact> = RawFlat::new_in(alloc.clone());
        raw.extend_lazy(0..4);
        alloc.fail_next();
        assert_eq!(raw.remove(0), 0);
        assert_eq!(raw.as_slice(), &[1, 2, 3]);
        assert_eq!(raw.capacity(), 4);
        assert_eq!(raw.remove(0), 1);
        assert_eq!((raw.len(), raw.capacity()), (2, 2));
        assert_eq!(alloc.live_blocks(), 1);
    }

    #[test]
    fn test_transaction_retain_panicking_predicate_keeps_rest() {
        let live = Rc::new(Cell::new(0));
        let mut raw: RawFlat<Tracked, 8> = RawFlat::new_in(Global);
        for i in 0..6 {
            raw.push(Tracked::new(i, &live));
        }
        let result = catch_unwind(AssertUnwindSafe(|| {
            raw.retain_mut(|t| {
                if t.value == 3 {
                    panic!("predicate exploded");
                }
                t.value % 2 == 0
            });
        }));
        assert!(result.is_err());
        let values: Vec<i32> = raw.as_slice().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0, 2, 3, 4, 5]);
        assert_eq!(live.get(), 5);
    }

    #[test]
    fn test_transaction_resize_with() {
        let mut raw: RawFlat<i32, 2> = RawFlat::new_in(Global);
        let mut next = 0;
        raw.resize_with(5, || {
            next += 1;
            next
        });
        assert_eq!(raw.as_slice(), &[1, 2, 3, 4, 5]);
        raw.resize_with(2, || unreachable!());
        assert_eq!(raw.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_transaction_extend_known_reserves_once() {
        let alloc = CountingAlloc::new(1);
        let mut raw: Raw<i32, 2> = RawFlat::new_in(alloc.clone());
        raw.extend_known(0..10);
        assert_eq!(raw.len(), 10);
        assert_eq!(alloc.allocations(), 1);
    }

    #[test]
    fn test_transaction_zero_sized_values() {
        let mut raw: RawFlat<(), 2> = RawFlat::new_in(Global);
        for _ in 0..100 {
            raw.push(());
        }
        assert_eq!(raw.len(), 100);
        raw.erase_range(10..90);
        assert_eq!(raw.len(), 20);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize, i32),
        Remove(usize),
        Erase(usize, usize),
        Shrink,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<usize>(), any::<i32>()).prop_map(|(p, v)| Op::Insert(p, v)),
            any::<usize>().prop_map(Op::Remove),
            (any::<usize>(), 0usize..4).prop_map(|(p, n)| Op::Erase(p, n)),
            Just(Op::Shrink),
        ]
    }

    proptest! {
        #[test]
        fn prop_transaction_matches_vec(ops in proptest::collection::vec(op(), 0..64)) {
            let mut raw: RawFlat<i32, 4> = RawFlat::new_in(Global);
            let mut model: Vec<i32> = Vec::new();
            for op in ops {
                match op {
                    Op::Insert(p, v) => {
                        let p = p % (model.len() + 1);
                        raw.try_insert(p, v).unwrap();
                        model.insert(p, v);
                    }
                    Op::Remove(p) if !model.is_empty() => {
                        let p = p % model.len();
                        prop_assert_eq!(raw.remove(p), model.remove(p));
                    }
                    Op::Erase(p, n) if !model.is_empty() => {
                        let start = p % model.len();
                        let end = (start + n).min(model.len());
                        raw.erase_range(start..end);
                        model.drain(start..end);
                    }
                    Op::Shrink => raw.shrink_to_fit().unwrap(),
                    _ => {}
                }
                prop_assert_eq!(raw.as_slice(), model.as_slice());
                prop_assert!(raw.len() <= raw.capacity());
                prop_assert_eq!(raw.is_inline(), raw.capacity() == 4);
            }
        }
    }
}
