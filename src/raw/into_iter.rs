use core::fmt;
use core::iter::FusedIterator;
use core::ptr;
use core::slice;

use super::RawFlat;
use super::growth::GrowthPolicy;
use super::storage::AllocatorBinding;
use crate::alloc::FlatAllocator;

/// Owning iterator over the values of a flat container, in storage order.
///
/// Values not yet yielded are dropped with the iterator; the buffer is released afterwards.
pub struct IntoIter<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> {
    raw: RawFlat<T, N, A, G>,
    front: usize,
    back: usize,
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> IntoIter<T, N, A, G> {
    pub(crate) fn new(mut raw: RawFlat<T, N, A, G>) -> Self {
        let back = raw.handle.len;
        // The engine no longer owns the values; the iterator does.
        raw.handle.len = 0;
        Self { raw, front: 0, back }
    }

    /// The values not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.raw.base().add(self.front), self.back - self.front) }
    }
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> Iterator for IntoIter<T, N, A, G> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        let value = unsafe { ptr::read(self.raw.base().add(self.front)) };
        self.front += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> DoubleEndedIterator
    for IntoIter<T, N, A, G>
{
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { ptr::read(self.raw.base().add(self.back)) })
    }
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> ExactSizeIterator
    for IntoIter<T, N, A, G>
{
}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> FusedIterator for IntoIter<T, N, A, G> {}

impl<T, const N: usize, A: FlatAllocator, G: GrowthPolicy> Drop for IntoIter<T, N, A, G> {
    fn drop(&mut self) {
        let remaining = self.back - self.front;
        let first = unsafe { self.raw.base_mut().add(self.front) };
        self.front = self.back;
        // `raw` is dropped after this and releases the block.
        unsafe { AllocatorBinding::<A>::destroy_range(first, remaining) };
    }
}

impl<T: fmt::Debug, const N: usize, A: FlatAllocator, G: GrowthPolicy> fmt::Debug
    for IntoIter<T, N, A, G>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
