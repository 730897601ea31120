//! Allocator policy bound into every container.
//!
//! The raw allocation interface is `allocator_api2`'s [`Allocator`], which works on stable
//! Rust and is the same trait `hashbrown` accepts. [`FlatAllocator`] layers on top of it the
//! two facts the storage engine needs when elements or heap blocks cross from one container
//! to another:
//!
//! * whether two allocator instances are interchangeable ([`FlatAllocator::equals`]), i.e.
//!   whether a block obtained from one may be released through the other;
//! * whether the allocator itself travels with the contents on copy, move and swap
//!   (the `PROPAGATE_ON_*` flags).

use allocator_api2::alloc::{Allocator, Global};

/// An [`Allocator`] that can be bound to a flat container.
///
/// # Propagation
/// | Flag | Default | Effect |
/// |------|---------|--------|
/// | `PROPAGATE_ON_COPY` | `false` | `clone_from` adopts the source's allocator |
/// | `PROPAGATE_ON_MOVE` | `true` | moving a container carries its allocator along |
/// | `PROPAGATE_ON_SWAP` | `false` | `swap` exchanges the allocators as well |
///
/// When `PROPAGATE_ON_SWAP` is `false`, swapping two containers whose allocators do not
/// compare equal is a caller error and panics.
///
/// A Rust move always carries the allocator with the contents, which is what the `true`
/// default of `PROPAGATE_ON_MOVE` states; the flag is not consulted anywhere. The
/// allocator-extended moves (`from_moved_in`) take the receiving allocator from the caller
/// instead and follow the equality rule: the block is adopted when the allocators compare
/// equal and the values are moved into a fresh block otherwise.
pub trait FlatAllocator: Allocator + Clone {
    /// `clone_from` replaces the target's allocator with a copy of the source's.
    const PROPAGATE_ON_COPY: bool = false;
    /// Moving contents also moves the allocator. Always the case for a Rust move.
    const PROPAGATE_ON_MOVE: bool = true;
    /// `swap` also swaps the allocators.
    const PROPAGATE_ON_SWAP: bool = false;

    /// Returns `true` if memory allocated by `self` can be released by `other` and vice
    /// versa.
    fn equals(&self, other: &Self) -> bool;
}

impl FlatAllocator for Global {
    #[inline]
    fn equals(&self, _other: &Self) -> bool {
        true
    }
}

impl<A: FlatAllocator> FlatAllocator for &A {
    const PROPAGATE_ON_COPY: bool = A::PROPAGATE_ON_COPY;
    const PROPAGATE_ON_MOVE: bool = A::PROPAGATE_ON_MOVE;
    const PROPAGATE_ON_SWAP: bool = A::PROPAGATE_ON_SWAP;

    #[inline]
    fn equals(&self, other: &Self) -> bool {
        (**self).equals(*other)
    }
}
