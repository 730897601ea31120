//! Error taxonomy shared by every container in the crate.
//!
//! Only two things can go wrong inside the storage engine itself: a capacity request that
//! cannot be represented, and an allocator that refuses a block. Keyed and positional
//! lookups add [`Error::KeyNotFound`] and [`Error::IndexOutOfRange`]. Failures raised by
//! element constructors are never wrapped; they travel in the caller's own error type, which
//! only has to be convertible from [`Error`].

use core::alloc::Layout;

use thiserror::Error;

/// Errors surfaced by the flat containers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested size or capacity exceeds what the container can represent.
    #[error("requested capacity {requested} exceeds the maximum of {max}")]
    CapacityExceeded {
        /// Total number of slots that was asked for.
        requested: usize,
        /// The largest number of slots the container can hold.
        max: usize,
    },

    /// The bound allocator could not provide a block.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocationFailed {
        /// Layout of the block that was requested.
        layout: Layout,
    },

    /// A keyed direct-access lookup (`at`) found no matching key.
    #[error("key not found")]
    KeyNotFound,

    /// A positional direct-access lookup was past the end of the live range.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending position.
        index: usize,
        /// Number of live elements at the time of the call.
        len: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    /// Turns an engine error into the panic the infallible API promises.
    ///
    /// Allocation failures go through [`std::alloc::handle_alloc_error`], exactly like
    /// `Vec` does; everything else panics with the `Display` text.
    #[cold]
    #[inline(never)]
    pub(crate) fn raise(self) -> ! {
        match self {
            Error::AllocationFailed { layout } => std::alloc::handle_alloc_error(layout),
            other => panic!("{other}"),
        }
    }
}

/// Unwraps an engine result for the panicking flavour of an operation.
#[inline]
pub(crate) fn infallible<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => err.raise(),
    }
}
