//! Instrumented element types and allocators for the unit tests.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;
use std::rc::Rc;

use allocator_api2::alloc::{AllocError, Allocator, Global};

use crate::alloc::FlatAllocator;

/// Shared bookkeeping for a family of equal [`CountingAlloc`]s.
#[derive(Debug, Default)]
pub(crate) struct AllocStats {
    pub live_blocks: Cell<usize>,
    pub allocations: Cell<usize>,
    pub fail_next: Cell<bool>,
}

/// Allocator that counts live blocks and compares equal by `id`.
#[derive(Debug, Clone)]
pub(crate) struct CountingAlloc {
    pub id: u32,
    pub stats: Rc<AllocStats>,
}

impl CountingAlloc {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            stats: Rc::new(AllocStats::default()),
        }
    }

    pub fn live_blocks(&self) -> usize {
        self.stats.live_blocks.get()
    }

    pub fn allocations(&self) -> usize {
        self.stats.allocations.get()
    }

    pub fn fail_next(&self) {
        self.stats.fail_next.set(true);
    }
}

unsafe impl Allocator for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if self.stats.fail_next.replace(false) {
            return Err(AllocError);
        }
        let block = Global.allocate(layout)?;
        self.stats.live_blocks.set(self.stats.live_blocks.get() + 1);
        self.stats.allocations.set(self.stats.allocations.get() + 1);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.live_blocks.set(self.stats.live_blocks.get() - 1);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

impl FlatAllocator for CountingAlloc {
    fn equals(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A [`CountingAlloc`] that travels with the contents on copy and swap.
#[derive(Debug, Clone)]
pub(crate) struct PropagatingAlloc(pub CountingAlloc);

unsafe impl Allocator for PropagatingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.0.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { self.0.deallocate(ptr, layout) }
    }
}

impl FlatAllocator for PropagatingAlloc {
    const PROPAGATE_ON_COPY: bool = true;
    const PROPAGATE_ON_SWAP: bool = true;

    fn equals(&self, other: &Self) -> bool {
        self.0.equals(&other.0)
    }
}

/// Element that keeps a shared count of live instances.
#[derive(Debug)]
pub(crate) struct Tracked {
    pub value: i32,
    live: Rc<Cell<isize>>,
}

impl Tracked {
    pub fn new(value: i32, live: &Rc<Cell<isize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            value,
            live: Rc::clone(live),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.live)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Tracked {}

impl PartialOrd for Tracked {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tracked {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

/// Element whose `clone` panics when `explode` is set.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Fragile {
    pub value: i32,
    pub explode: bool,
}

impl Fragile {
    pub fn ok(value: i32) -> Self {
        Self {
            value,
            explode: false,
        }
    }

    pub fn bomb(value: i32) -> Self {
        Self {
            value,
            explode: true,
        }
    }
}

impl Clone for Fragile {
    fn clone(&self) -> Self {
        if self.explode {
            panic!("Fragile({}) refused to clone", self.value);
        }
        Self::ok(self.value)
    }
}

/// Constructor failure used by the fallible-insert tests.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BuildError {
    Refused,
    Storage(crate::Error),
}

impl From<crate::Error> for BuildError {
    fn from(err: crate::Error) -> Self {
        BuildError::Storage(err)
    }
}
