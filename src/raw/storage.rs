//! Storage primitives: the embedded buffer, the handle describing the active buffer, and
//! the allocator binding through which heap memory is obtained and released.

use core::alloc::Layout;
use core::mem::{self, MaybeUninit};
use core::ptr::{self, NonNull};

use crate::alloc::FlatAllocator;
use crate::error::{Error, Result};

// --- InlineBuffer ---

/// `N` uninitialized slots embedded in the container itself.
///
/// The buffer is never allocated or released. Which slots hold live values is tracked by
/// the owning [`StorageHandle`]; the buffer knows nothing about it and never drops anything.
pub(crate) struct InlineBuffer<T, const N: usize> {
    slots: [MaybeUninit<T>; N],
}

impl<T, const N: usize> InlineBuffer<T, N> {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            slots: [const { MaybeUninit::uninit() }; N],
        }
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *const T {
        self.slots.as_ptr() as *const T
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.slots.as_mut_ptr() as *mut T
    }
}

// --- StorageHandle ---

/// Live range and capacity of the active buffer.
///
/// Logically this is the `{begin, end, capacity_end}` triple. `begin` is not stored for the
/// inline case because the container may be moved in memory at any time; it is recomputed
/// from the embedded buffer on every access. `heap` is `Some` exactly when a heap block is
/// active, and that block holds `cap` slots.
pub(crate) struct StorageHandle<T> {
    pub(crate) heap: Option<NonNull<T>>,
    pub(crate) len: usize,
    pub(crate) cap: usize,
}

impl<T> StorageHandle<T> {
    #[inline]
    pub(crate) const fn inline(cap: usize) -> Self {
        Self {
            heap: None,
            len: 0,
            cap,
        }
    }

    #[inline(always)]
    pub(crate) fn size(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    #[inline(always)]
    pub(crate) fn available(&self) -> usize {
        self.cap - self.len
    }

    #[inline(always)]
    pub(crate) fn is_inline(&self) -> bool {
        self.heap.is_none()
    }
}

// --- AllocatorBinding ---

/// The bound allocator; sole owner of any heap block the container holds.
///
/// Every heap allocation and release in the crate goes through `allocate`/`deallocate`
/// here, and every slot is initialized and torn down through `construct`/`destroy`, so the
/// engine never touches memory any other way.
pub(crate) struct AllocatorBinding<A> {
    pub(crate) alloc: A,
}

impl<A: FlatAllocator> AllocatorBinding<A> {
    #[inline]
    pub(crate) const fn new(alloc: A) -> Self {
        Self { alloc }
    }

    /// Largest element count a block of `T` may hold.
    #[inline]
    pub(crate) const fn max_size<T>() -> usize {
        if mem::size_of::<T>() == 0 {
            usize::MAX
        } else {
            isize::MAX as usize / mem::size_of::<T>()
        }
    }

    /// Obtains a block of exactly `n` slots.
    ///
    /// Zero-sized requests (either `n == 0` or a zero-sized `T`) never reach the allocator
    /// and yield a dangling, well-aligned pointer.
    pub(crate) fn allocate<T>(&self, n: usize) -> Result<NonNull<T>> {
        let layout = Layout::array::<T>(n).map_err(|_| Error::CapacityExceeded {
            requested: n,
            max: Self::max_size::<T>(),
        })?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        match self.alloc.allocate(layout) {
            Ok(block) => Ok(block.cast()),
            Err(_) => Err(Error::AllocationFailed { layout }),
        }
    }

    /// Releases a block previously returned by [`allocate`](Self::allocate) with the same `n`.
    ///
    /// # Safety
    /// `ptr` must come from `allocate::<T>(n)` on this allocator or one that
    /// [`equals`](FlatAllocator::equals) it, and must not be used afterwards.
    pub(crate) unsafe fn deallocate<T>(&self, ptr: NonNull<T>, n: usize) {
        // Layout was valid when the block was allocated.
        if let Ok(layout) = Layout::array::<T>(n) {
            if layout.size() != 0 {
                unsafe { self.alloc.deallocate(ptr.cast(), layout) };
            }
        }
    }

    /// # Safety
    /// `slot` must be valid for writes and currently uninitialized.
    #[inline(always)]
    pub(crate) unsafe fn construct<T>(slot: *mut T, value: T) {
        unsafe { ptr::write(slot, value) };
    }

    /// # Safety
    /// `slot` must hold a live value that is not used afterwards.
    #[inline(always)]
    pub(crate) unsafe fn destroy<T>(slot: *mut T) {
        unsafe { ptr::drop_in_place(slot) };
    }

    /// Drops `n` consecutive live values starting at `first`.
    ///
    /// # Safety
    /// `[first, first + n)` must hold live values that are not used afterwards.
    #[inline]
    pub(crate) unsafe fn destroy_range<T>(first: *mut T, n: usize) {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, n)) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingAlloc;
    use allocator_api2::alloc::Global;

    #[test]
    fn test_storage_handle_queries() {
        let mut h: StorageHandle<u32> = StorageHandle::inline(4);
        assert!(h.is_inline());
        assert_eq!((h.size(), h.capacity(), h.available()), (0, 4, 4));
        h.len = 3;
        assert_eq!(h.available(), 1);
        h.heap = Some(NonNull::dangling());
        assert!(!h.is_inline());
    }

    #[test]
    fn test_storage_binding_allocate_and_release() {
        let alloc = CountingAlloc::new(1);
        let binding = AllocatorBinding::new(alloc.clone());
        let p = binding.allocate::<u64>(16).unwrap();
        assert_eq!(alloc.live_blocks(), 1);
        unsafe {
            AllocatorBinding::<CountingAlloc>::construct(p.as_ptr(), 7u64);
            assert_eq!(*p.as_ptr(), 7);
            binding.deallocate(p, 16);
        }
        assert_eq!(alloc.live_blocks(), 0);
    }

    #[test]
    fn test_storage_binding_zero_sized_never_allocates() {
        let alloc = CountingAlloc::new(1);
        let binding = AllocatorBinding::new(alloc.clone());
        let p = binding.allocate::<()>(1000).unwrap();
        let q = binding.allocate::<u8>(0).unwrap();
        unsafe {
            binding.deallocate(p, 1000);
            binding.deallocate(q, 0);
        }
        assert_eq!(alloc.allocations(), 0);
    }

    #[test]
    fn test_storage_binding_reports_allocation_failure() {
        let alloc = CountingAlloc::new(1);
        alloc.fail_next();
        let binding = AllocatorBinding::new(alloc);
        assert!(matches!(
            binding.allocate::<u32>(4),
            Err(Error::AllocationFailed { .. })
        ));
    }

    #[test]
    fn test_storage_binding_oversized_layout() {
        let binding = AllocatorBinding::new(Global);
        assert!(matches!(
            binding.allocate::<u64>(usize::MAX / 2),
            Err(Error::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_storage_inline_buffer_addresses_are_embedded() {
        let mut buf: InlineBuffer<u16, 8> = InlineBuffer::new();
        let base = &buf as *const _ as usize;
        let first = buf.as_mut_ptr() as usize;
        assert!(first >= base && first < base + core::mem::size_of_val(&buf) + 1);
        assert_eq!(buf.as_ptr() as usize, first);
    }
}
