//! The storage engine shared by every container in the crate.
//!
//! [`RawFlat`] owns a contiguous run of `T` that lives either in an embedded buffer of `N`
//! slots or in a single heap block obtained from the bound allocator. Containers above it
//! decide *where* an element goes; the engine decides *how* the buffer changes to make room
//! for it and keeps the live range intact if anything fails on the way.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`storage`] | embedded buffer, live-range handle, allocator binding |
//! | [`growth`] | capacity policy (`Amortized`, `Exact`, `Fixed`) |
//! | `transaction` | insert / erase / relocate with rollback on failure |
//! | `cross` | copy, move and swap between two engines |
//! | `into_iter` | owning iterator |

pub(crate) mod growth;
pub(crate) mod storage;

mod cross;
mod into_iter;
mod transaction;

pub use into_iter::IntoIter;

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Bound, Range, RangeBounds};
use core::ptr::NonNull;
use core::slice;

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use growth::{Amortized, GrowthPolicy};
use storage::{AllocatorBinding, InlineBuffer, StorageHandle};

/// Upper bound on the size of the embedded buffer, checked when a container is created.
pub const MAX_INLINE_BYTES: usize = 16 * 1024;

/// Contiguous storage with `N` embedded slots that spills to the heap.
///
/// * Inline active: `heap == None`, `cap == N`, live values are the first `len` slots of
///   the embedded buffer.
/// * Heap active: `heap == Some(block)`, `cap > N`, the embedded buffer holds nothing.
///
/// The address of the embedded buffer is never stored, so moving a `RawFlat` by value is
/// always sound.
pub(crate) struct RawFlat<T, const N: usize, A: FlatAllocator = Global, G: GrowthPolicy = Amortized>
{
    handle: StorageHandle<T>,
    binding: AllocatorBinding<A>,
    inline: InlineBuffer<T, N>,
    _marker: PhantomData<(T, fn() -> G)>,
}

// SAFETY: the heap block is uniquely owned; sending the engine sends its elements and its
// allocator, nothing else.
unsafe impl<T: Send, const N: usize, A: FlatAllocator + Send, G: GrowthPolicy> Send
    for RawFlat<T, N, A, G>
{
}

// SAFETY: shared access only ever hands out `&T` and `&A`.
unsafe impl<T: Sync, const N: usize, A: FlatAllocator + Sync, G: GrowthPolicy> Sync
    for RawFlat<T, N, A, G>
{
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> RawFlat<T, N, A, G> {
    /// Creates an empty engine on the embedded buffer. Never allocates.
    #[inline]
    pub(crate) fn new_in(alloc: A) -> Self {
        const {
            assert!(
                mem::size_of::<InlineBuffer<T, N>>() <= MAX_INLINE_BYTES,
                "embedded buffer exceeds MAX_INLINE_BYTES"
            )
        };
        Self {
            handle: StorageHandle::inline(N),
            binding: AllocatorBinding::new(alloc),
            inline: InlineBuffer::new(),
            _marker: PhantomData,
        }
    }

    /// Creates an empty engine able to hold at least `capacity` elements.
    pub(crate) fn with_capacity_in(capacity: usize, alloc: A) -> crate::Result<Self> {
        let mut raw = Self::new_in(alloc);
        raw.try_reserve(capacity)?;
        Ok(raw)
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.handle.size()
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.handle.capacity()
    }

    #[inline(always)]
    pub(crate) fn available(&self) -> usize {
        self.handle.available()
    }

    #[inline(always)]
    pub(crate) fn is_inline(&self) -> bool {
        self.handle.is_inline()
    }

    #[inline]
    pub(crate) fn max_size(&self) -> usize {
        G::limit(N, AllocatorBinding::<A>::max_size::<T>())
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.binding.alloc
    }

    /// Start of the active buffer.
    #[inline(always)]
    fn base(&self) -> *const T {
        match self.handle.heap {
            Some(block) => block.as_ptr(),
            None => self.inline.as_ptr(),
        }
    }

    #[inline(always)]
    fn base_mut(&mut self) -> *mut T {
        match self.handle.heap {
            Some(block) => block.as_ptr(),
            None => self.inline.as_mut_ptr(),
        }
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.base(), self.handle.len) }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.handle.len;
        unsafe { slice::from_raw_parts_mut(self.base_mut(), len) }
    }

    /// Position of the element `elem` points at, if it lies in the live range.
    pub(crate) fn index_of(&self, elem: *const T) -> Option<usize> {
        let size = mem::size_of::<T>();
        if size == 0 {
            return None;
        }
        let start = self.base() as usize;
        let addr = elem as usize;
        if addr < start {
            return None;
        }
        let offset = addr - start;
        let index = offset / size;
        (offset % size == 0 && index < self.handle.len).then_some(index)
    }

    /// Frees the heap block without touching the values in it and falls back to the
    /// embedded buffer.
    ///
    /// Callers must have moved or dropped every live value first.
    fn release_heap(&mut self) {
        if let Some(block) = self.handle.heap.take() {
            unsafe { self.binding.deallocate(block, self.handle.cap) };
            self.handle.cap = N;
        }
    }

    /// Installs `block` (or the embedded buffer when `None`) as the active buffer, releasing
    /// the previous heap block. The values must already be in their new slots.
    fn adopt(&mut self, block: Option<NonNull<T>>, cap: usize, len: usize) {
        let old_cap = self.handle.cap;
        let was_inline = self.handle.is_inline();
        if let Some(old) = self.handle.heap.take() {
            unsafe { self.binding.deallocate(old, old_cap) };
        }
        match block {
            Some(block) => {
                self.handle.heap = Some(block);
                self.handle.cap = cap;
                if was_inline {
                    storage_event!("promoted {len} elements to a heap block of {cap}");
                } else {
                    storage_event!("reallocated heap block {old_cap} -> {cap}");
                }
            }
            None => {
                self.handle.cap = N;
                if !was_inline {
                    storage_event!("reclaimed inline buffer of {N} for {len} elements");
                }
            }
        }
        self.handle.len = len;
    }
}

/// Resolves `range` against a live range of `len` values.
///
/// # Panics
/// If the range is decreasing or reaches past `len`.
pub(crate) fn bounds<R: RangeBounds<usize>>(range: R, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.checked_add(1).unwrap_or(usize::MAX),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.checked_add(1).unwrap_or(usize::MAX),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    assert!(
        start <= end && end <= len,
        "range {start}..{end} out of bounds for length {len}"
    );
    start..end
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> Drop for RawFlat<T, N, A, G> {
    fn drop(&mut self) {
        // A panicking element drop must not lead to a second drop of the same range.
        let len = mem::replace(&mut self.handle.len, 0);
        struct Release<'a, T, const N: usize, A: FlatAllocator, G: GrowthPolicy>(
            &'a mut RawFlat<T, N, A, G>,
        );
        impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> Drop
            for Release<'_, T, N, A, G>
        {
            fn drop(&mut self) {
                self.0.release_heap();
            }
        }
        let release = Release(self);
        let base = release.0.base_mut();
        unsafe { AllocatorBinding::<A>::destroy_range(base, len) };
    }
}

impl<T: fmt::Debug, const N: usize, A: FlatAllocator, G: GrowthPolicy> fmt::Debug
    for RawFlat<T, N, A, G>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
