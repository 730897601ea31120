//! Operations that involve two engines: copy, move and swap.
//!
//! Heap blocks may only change owner when the two allocators compare equal; otherwise the
//! values are moved one by one into memory obtained from the receiving allocator.

use core::mem;
use core::ptr;

use super::RawFlat;
use super::growth::GrowthPolicy;
use super::storage::{AllocatorBinding, StorageHandle};
use crate::alloc::FlatAllocator;
use crate::error::Result;

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> RawFlat<T, N, A, G> {
    /// Clones every value into a new engine bound to `alloc`.
    ///
    /// The copy is sized exactly: it stays inline when the values fit and otherwise gets a
    /// heap block of `len()` slots. A panicking `clone` drops the partial copy.
    pub(crate) fn clone_in(&self, alloc: A) -> Result<Self>
    where
        T: Clone,
    {
        let mut out = Self::new_in(alloc);
        let len = self.len();
        if len > N {
            let block = out.binding.allocate::<T>(len)?;
            out.handle.heap = Some(block);
            out.handle.cap = len;
        }
        let dst = out.base_mut();
        // `out.handle.len` is the high-water mark: dropping `out` drops exactly the clones.
        for (i, value) in self.as_slice().iter().enumerate() {
            unsafe { AllocatorBinding::<A>::construct(dst.add(i), value.clone()) };
            out.handle.len = i + 1;
        }
        Ok(out)
    }

    /// Replaces the contents with clones of `source`'s values.
    ///
    /// The current values are dropped first; if a `clone` panics the engine keeps the clones
    /// made so far. With `PROPAGATE_ON_COPY` the allocator is replaced by a copy of
    /// `source`'s, after releasing a block the new allocator could not free.
    pub(crate) fn assign_clone(&mut self, source: &Self) -> Result<()>
    where
        T: Clone,
    {
        self.clear();
        if A::PROPAGATE_ON_COPY {
            if !self.binding.alloc.equals(&source.binding.alloc) {
                self.release_heap();
            }
            self.binding.alloc = source.binding.alloc.clone();
        }
        let len = source.len();
        if len > self.handle.cap {
            self.relocate(len)?;
        }
        self.settle_after(|raw| {
            let dst = raw.base_mut();
            for (i, value) in source.as_slice().iter().enumerate() {
                unsafe { AllocatorBinding::<A>::construct(dst.add(i), value.clone()) };
                raw.handle.len = i + 1;
            }
        });
        Ok(())
    }

    /// Moves the contents of `other` into a new engine bound to `alloc`.
    ///
    /// * inline contents are moved into the new embedded buffer;
    /// * a heap block is adopted as is when `alloc` equals `other`'s allocator;
    /// * otherwise the values are moved into an exact-size block from `alloc` and `other`'s
    ///   block is returned to its own allocator.
    ///
    /// If that last allocation fails, `other` is dropped with its contents.
    ///
    /// `alloc` is chosen by the caller, so `PROPAGATE_ON_MOVE` plays no part here.
    pub(crate) fn move_in(mut other: Self, alloc: A) -> Result<Self> {
        let len = other.len();
        let mut out = Self::new_in(alloc);
        if !other.is_inline() && out.binding.alloc.equals(&other.binding.alloc) {
            out.handle = mem::replace(&mut other.handle, StorageHandle::inline(N));
            return Ok(out);
        }
        if len > N {
            let block = out.binding.allocate::<T>(len)?;
            out.handle.heap = Some(block);
            out.handle.cap = len;
        }
        unsafe { ptr::copy_nonoverlapping(other.base(), out.base_mut(), len) };
        out.handle.len = len;
        other.handle.len = 0;
        Ok(out)
    }

    /// Exchanges the contents of two engines.
    ///
    /// # Panics
    /// When the allocators do not propagate on swap and do not compare equal.
    pub(crate) fn swap(&mut self, other: &mut Self) {
        assert!(
            A::PROPAGATE_ON_SWAP || self.binding.alloc.equals(&other.binding.alloc),
            "swapping containers whose allocators are not interchangeable"
        );
        if A::PROPAGATE_ON_SWAP {
            mem::swap(&mut self.binding.alloc, &mut other.binding.alloc);
        }
        match (self.is_inline(), other.is_inline()) {
            (true, true) => {
                let (a, b) = (self.len(), other.len());
                let common = a.min(b);
                let (mine, theirs) = (self.inline.as_mut_ptr(), other.inline.as_mut_ptr());
                unsafe {
                    ptr::swap_nonoverlapping(mine, theirs, common);
                    if a > b {
                        ptr::copy_nonoverlapping(mine.add(common), theirs.add(common), a - b);
                    } else {
                        ptr::copy_nonoverlapping(theirs.add(common), mine.add(common), b - a);
                    }
                }
                mem::swap(&mut self.handle.len, &mut other.handle.len);
            }
            (true, false) => Self::swap_inline_with_heap(self, other),
            (false, true) => Self::swap_inline_with_heap(other, self),
            (false, false) => mem::swap(&mut self.handle, &mut other.handle),
        }
    }

    /// `inline` gives its values to `heap`'s embedded buffer and takes over `heap`'s block.
    fn swap_inline_with_heap(inline: &mut Self, heap: &mut Self) {
        let len = inline.len();
        unsafe {
            ptr::copy_nonoverlapping(inline.inline.as_ptr(), heap.inline.as_mut_ptr(), len)
        };
        let mut moved = StorageHandle::inline(N);
        moved.len = len;
        inline.handle = mem::replace(&mut heap.handle, moved);
    }
}

#[cfg(test)]
mod tests {
    use super::super::growth::{Amortized, Exact};
    use super::*;
    use crate::testing::{CountingAlloc, Fragile, PropagatingAlloc, Tracked};
    use allocator_api2::alloc::Global;
    use core::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    type Raw<T, const N: usize> = RawFlat<T, N, CountingAlloc, Amortized>;

    fn filled<const N: usize>(alloc: &CountingAlloc, n: i32) -> Raw<i32, N> {
        let mut raw = RawFlat::new_in(alloc.clone());
        raw.extend_lazy(0..n);
        raw
    }

    #[test]
    fn test_cross_clone_is_exact() {
        let alloc = CountingAlloc::new(1);
        let src: Raw<i32, 4> = filled(&alloc, 9);
        assert_eq!(src.capacity(), 16);
        let copy = src.clone_in(alloc.clone()).unwrap();
        assert_eq!(copy.as_slice(), src.as_slice());
        assert_eq!(copy.capacity(), 9);

        let small: Raw<i32, 4> = filled(&alloc, 3);
        let copy = small.clone_in(alloc.clone()).unwrap();
        assert!(copy.is_inline());
        assert_eq!(copy.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_cross_clone_panic_drops_partial_copy() {
        let alloc = CountingAlloc::new(1);
        let mut src: RawFlat<Fragile, 2, CountingAlloc> = RawFlat::new_in(alloc.clone());
        src.push(Fragile::ok(1));
        src.push(Fragile::ok(2));
        src.push(Fragile::bomb(3));
        let result = catch_unwind(AssertUnwindSafe(|| src.clone_in(alloc.clone())));
        assert!(result.is_err());
        // Only the source's block remains.
        assert_eq!(alloc.live_blocks(), 1);
        assert_eq!(src.len(), 3);
    }

    #[test]
    fn test_cross_assign_clone_replaces_contents() {
        let live = Rc::new(Cell::new(0));
        let mut target: RawFlat<Tracked, 2> = RawFlat::new_in(Global);
        let mut source: RawFlat<Tracked, 2> = RawFlat::new_in(Global);
        target.push(Tracked::new(7, &live));
        for i in 0..5 {
            source.push(Tracked::new(i, &live));
        }
        target.assign_clone(&source).unwrap();
        let values: Vec<i32> = target.as_slice().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
        assert_eq!(live.get(), 10);
    }

    #[test]
    fn test_cross_assign_clone_propagates_allocator() {
        let a = PropagatingAlloc(CountingAlloc::new(1));
        let b = PropagatingAlloc(CountingAlloc::new(2));
        let mut target: RawFlat<i32, 2, PropagatingAlloc> = RawFlat::new_in(a.clone());
        target.extend_lazy(0..10);
        let mut source: RawFlat<i32, 2, PropagatingAlloc> = RawFlat::new_in(b.clone());
        source.extend_lazy(0..5);
        target.assign_clone(&source).unwrap();
        assert_eq!(target.allocator().0.id, 2);
        assert_eq!(a.0.live_blocks(), 0);
        assert_eq!(b.0.live_blocks(), 2);
        assert_eq!(target.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cross_move_adopts_block_with_equal_allocator() {
        let alloc = CountingAlloc::new(1);
        let src: Raw<i32, 4> = filled(&alloc, 10);
        let moved = RawFlat::move_in(src, alloc.clone()).unwrap();
        assert_eq!(moved.len(), 10);
        assert_eq!(alloc.allocations(), 2);
        assert_eq!(alloc.live_blocks(), 1);
    }

    #[test]
    fn test_cross_move_with_unequal_allocator_reallocates() {
        let first = CountingAlloc::new(1);
        let second = CountingAlloc::new(2);
        let src: Raw<i32, 4> = filled(&first, 10);
        let moved = RawFlat::move_in(src, second.clone()).unwrap();
        assert_eq!(moved.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(moved.capacity(), 10);
        assert_eq!(first.live_blocks(), 0);
        assert_eq!(second.live_blocks(), 1);
    }

    #[test]
    fn test_cross_move_inline_contents() {
        let live = Rc::new(Cell::new(0));
        let mut src: RawFlat<Tracked, 4> = RawFlat::new_in(Global);
        src.push(Tracked::new(1, &live));
        src.push(Tracked::new(2, &live));
        let moved = RawFlat::move_in(src, Global).unwrap();
        assert!(moved.is_inline());
        assert_eq!(moved.len(), 2);
        assert_eq!(live.get(), 2);
        drop(moved);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_cross_swap_inline_with_heap() {
        let alloc = CountingAlloc::new(1);
        let mut a: Raw<i32, 4> = filled(&alloc, 2);
        let mut b: Raw<i32, 4> = filled(&alloc, 50);
        let block = b.as_slice().as_ptr();
        a.swap(&mut b);
        assert_eq!(a.len(), 50);
        assert!(!a.is_inline());
        assert_eq!(a.as_slice().as_ptr(), block);
        assert_eq!(b.as_slice(), &[0, 1]);
        assert!(b.is_inline());
        assert_eq!(b.capacity(), 4);
        b.swap(&mut a);
        assert_eq!(b.len(), 50);
        assert_eq!(a.as_slice(), &[0, 1]);
        assert_eq!(alloc.live_blocks(), 1);
    }

    #[test]
    fn test_cross_swap_both_inline_uneven() {
        let mut a: RawFlat<String, 4> = RawFlat::new_in(Global);
        let mut b: RawFlat<String, 4> = RawFlat::new_in(Global);
        a.extend_lazy(["x", "y", "z"].map(String::from));
        b.push("q".to_string());
        a.swap(&mut b);
        assert_eq!(a.as_slice(), &["q"]);
        assert_eq!(b.as_slice(), &["x", "y", "z"]);
    }

    #[test]
    fn test_cross_swap_both_heap() {
        let alloc = CountingAlloc::new(1);
        let mut a: Raw<i32, 2> = filled(&alloc, 5);
        let mut b: Raw<i32, 2> = filled(&alloc, 9);
        a.swap(&mut b);
        assert_eq!((a.len(), b.len()), (9, 5));
    }

    #[test]
    #[should_panic(expected = "not interchangeable")]
    fn test_cross_swap_unequal_allocators_panics() {
        let mut a: Raw<i32, 2> = RawFlat::new_in(CountingAlloc::new(1));
        let mut b: Raw<i32, 2> = RawFlat::new_in(CountingAlloc::new(2));
        a.swap(&mut b);
    }

    #[test]
    fn test_cross_move_propagating_allocator_to_unequal_target() {
        let first = PropagatingAlloc(CountingAlloc::new(1));
        let second = PropagatingAlloc(CountingAlloc::new(2));
        let mut src: RawFlat<i32, 2, PropagatingAlloc> = RawFlat::new_in(first.clone());
        src.extend_lazy(0..7);
        let moved = RawFlat::move_in(src, second.clone()).unwrap();
        // The receiving allocator wins; the values are moved into its own block.
        assert_eq!(moved.allocator().0.id, 2);
        assert_eq!(moved.as_slice(), &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(moved.capacity(), 7);
        assert_eq!(first.0.live_blocks(), 0);
        assert_eq!(second.0.live_blocks(), 1);
    }

    #[test]
    fn test_cross_plain_move_carries_allocator() {
        let alloc = PropagatingAlloc(CountingAlloc::new(5));
        let mut src: RawFlat<i32, 2, PropagatingAlloc> = RawFlat::new_in(alloc.clone());
        src.extend_lazy(0..5);
        let block = src.as_slice().as_ptr();
        let moved = src;
        assert_eq!(moved.allocator().0.id, 5);
        assert_eq!(moved.as_slice().as_ptr(), block);
        assert_eq!(alloc.0.allocations(), 2);
    }

    #[test]
    fn test_cross_assign_clone_panic_keeps_zero_slack() {
        let mut target: RawFlat<Fragile, 0, Global, Exact> = RawFlat::new_in(Global);
        target.push(Fragile::ok(9));
        let mut source: RawFlat<Fragile, 0, Global, Exact> = RawFlat::new_in(Global);
        source.extend_lazy([Fragile::ok(1), Fragile::ok(2), Fragile::bomb(3)]);
        let r = catch_unwind(AssertUnwindSafe(|| target.assign_clone(&source)));
        assert!(r.is_err());
        assert_eq!(target.as_slice(), &[Fragile::ok(1), Fragile::ok(2)]);
        assert_eq!(target.capacity(), target.len());
    }

    #[test]
    fn test_cross_swap_propagating_allocators() {
        let mut a: RawFlat<i32, 2, PropagatingAlloc> =
            RawFlat::new_in(PropagatingAlloc(CountingAlloc::new(1)));
        let mut b: RawFlat<i32, 2, PropagatingAlloc> =
            RawFlat::new_in(PropagatingAlloc(CountingAlloc::new(2)));
        a.extend_lazy(0..6);
        a.swap(&mut b);
        assert_eq!(b.allocator().0.id, 1);
        assert_eq!(b.len(), 6);
        assert_eq!(a.allocator().0.id, 2);
        assert_eq!(a.len(), 0);
        assert!(a.is_inline());
    }
}
