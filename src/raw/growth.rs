//! Capacity decisions for the storage engine.
//!
//! A [`GrowthPolicy`] is a zero-sized marker selected at the type level. The engine asks it
//! for a new capacity whenever the live range has to grow past the current block; the policy
//! never allocates anything itself.

use crate::error::{Error, Result};

/// Computes the capacity to move to when `additional` more slots are needed.
pub trait GrowthPolicy {
    /// When `true`, capacity always equals the live length: erasing shrinks the block and
    /// clearing releases it.
    const ZERO_SLACK: bool = false;

    /// Returns the new capacity for a container holding `len` elements that needs room for
    /// `additional` more.
    ///
    /// `inline` is the size of the embedded buffer and `max` the largest representable
    /// element count. The result is always `>= len + additional`.
    fn grow(len: usize, additional: usize, inline: usize, max: usize) -> Result<usize>;

    /// Largest element count reachable under this policy, given the embedded buffer size and
    /// the allocator's limit.
    #[inline]
    fn limit(_inline: usize, max: usize) -> usize {
        max
    }
}

/// Amortized small-buffer growth: `max(N, len + max(len, additional))`.
///
/// Doubling keeps repeated single-element insertion amortized O(1) in reallocations. The
/// result is clamped to `max` rather than failing when doubling would overshoot it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Amortized;

impl GrowthPolicy for Amortized {
    #[inline]
    fn grow(len: usize, additional: usize, inline: usize, max: usize) -> Result<usize> {
        if max.saturating_sub(len) < additional {
            return Err(Error::CapacityExceeded {
                requested: len.saturating_add(additional),
                max,
            });
        }
        let wanted = len
            .checked_add(len.max(additional))
            .map_or(max, |n| n.min(max));
        Ok(inline.max(wanted))
    }
}

/// Exact, zero-slack growth: `len + additional`, nothing more.
///
/// Every insertion reallocates, so insertion is always O(n), in exchange for a capacity that
/// never runs ahead of the length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exact;

impl GrowthPolicy for Exact {
    const ZERO_SLACK: bool = true;

    #[inline]
    fn grow(len: usize, additional: usize, _inline: usize, max: usize) -> Result<usize> {
        match len.checked_add(additional) {
            Some(n) if n <= max => Ok(n),
            _ => Err(Error::CapacityExceeded {
                requested: len.saturating_add(additional),
                max,
            }),
        }
    }
}

/// Fixed capacity: the embedded buffer is the only storage there will ever be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fixed;

impl GrowthPolicy for Fixed {
    #[inline]
    fn limit(inline: usize, _max: usize) -> usize {
        inline
    }

    #[inline]
    fn grow(len: usize, additional: usize, inline: usize, _max: usize) -> Result<usize> {
        match len.checked_add(additional) {
            Some(n) if n <= inline => Ok(inline),
            _ => Err(Error::CapacityExceeded {
                requested: len.saturating_add(additional),
                max: inline,
            }),
        }
    }
}
