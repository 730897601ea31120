//! # Small Flat Collections
//!
//! Sorted and unordered flat containers that keep their first `N` elements inside the
//! container itself and move to a single allocator-provided heap block when they grow
//! past that.
//!
//! Every container here is a thin layer over one storage engine. The engine owns the
//! inline buffer and the heap block, and it makes each insertion all-or-nothing: if the
//! new element's constructor fails, or the allocator refuses a block, the container is
//! left exactly as it was, with the same buffer and the same capacity.
//!
//! ## Containers
//!
//! | Type | Lookup | Keys | Storage |
//! |------|--------|------|---------|
//! | [`SmallFlatMap`] | binary search | unique | `N` inline, then heap |
//! | [`SmallFlatSet`] | binary search | unique | `N` inline, then heap |
//! | [`SmallFlatMultiset`] | binary search | repeated | `N` inline, then heap |
//! | [`SmallUnorderedFlatMap`] | linear scan | unique | `N` inline, then heap |
//! | [`StaticUnorderedFlatSet`] | linear scan | unique | `N` inline only |
//! | [`StaticUnorderedFlatMultimap`] | linear scan | repeated | `N` inline only |
//! | [`CompactVec`] | by position | n/a | heap, `capacity() == len()` |
//!
//! ## Capacity Constraints (`N`)
//!
//! * The embedded buffer may not exceed [`MAX_INLINE_BYTES`] (16 KiB). Larger buffers are
//!   rejected at compile time when the container is created.
//! * The `Static*` containers need `N > 0` and never allocate. A full container hands a
//!   rejected element back instead of growing.
//!
//! ## Unordered removal
//!
//! The unordered containers remove an element in O(1) by moving the last element into
//! the hole. The order of the remaining elements changes whenever that happens.
//!
//! ## Examples
//!
//! ### SmallFlatMap
//!
//! ```rust
//! use small_flat_collections::SmallFlatMap;
//!
//! // Four entries fit inline.
//! let mut map: SmallFlatMap<&str, i32, 4> = SmallFlatMap::new();
//! map.insert("c", 3);
//! map.insert("a", 1);
//! map.insert("b", 2);
//!
//! assert!(map.is_inline());
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
//!
//! // The fifth and sixth move the entries to the heap.
//! map.insert("d", 4);
//! map.insert("e", 5);
//! assert!(!map.is_inline());
//!
//! // Shrinking brings them back once they fit again.
//! map.remove("e");
//! map.remove("d");
//! map.shrink_to_fit();
//! assert!(map.is_inline());
//! ```
//!
//! ### Fallible insertion
//!
//! ```rust
//! use small_flat_collections::{Error, SmallFlatMap};
//!
//! let mut map: SmallFlatMap<u32, String, 2> = SmallFlatMap::new();
//! map.insert(1, "one".to_string());
//! map.insert(2, "two".to_string());
//!
//! let result = map.try_insert_with(3, || Err::<String, _>(Error::KeyNotFound));
//! assert!(result.is_err());
//! // Nothing moved: same contents, still inline.
//! assert_eq!(map.len(), 2);
//! assert!(map.is_inline());
//! ```
//!
//! ### StaticUnorderedFlatSet
//!
//! ```rust
//! use small_flat_collections::StaticUnorderedFlatSet;
//!
//! let mut set: StaticUnorderedFlatSet<char, 2> = StaticUnorderedFlatSet::new();
//! assert_eq!(set.insert('x'), Ok(true));
//! assert_eq!(set.insert('y'), Ok(true));
//! assert_eq!(set.insert('z'), Err('z'));
//! ```
//!
//! ## Logging
//!
//! With the default `log` feature the engine emits `trace!` records when a container moves
//! between its inline buffer and the heap. Nothing else is logged.

/// Records a storage-mode transition.
#[cfg(feature = "log")]
macro_rules! storage_event {
    ($($arg:tt)+) => {
        log::trace!(target: "small_flat_collections::storage", $($arg)+)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! storage_event {
    ($($arg:tt)+) => {};
}

// --- Module Declarations ---

pub mod alloc;
pub mod error;
pub mod index;
pub mod maps;
mod raw;
pub mod sets;
pub mod vecs;

#[cfg(test)]
mod testing;

// --- Re-exports ---

pub use alloc::FlatAllocator;
pub use allocator_api2::alloc::Global;
pub use error::{Error, Result};
pub use index::{Compare, DefaultEq, Descending, Equivalence, Natural};
pub use maps::entry::{Entry, OccupiedEntry, VacantEntry};
pub use maps::small_flat_map::SmallFlatMap;
pub use maps::small_unordered_flat_map::SmallUnorderedFlatMap;
pub use maps::static_unordered_flat_multimap::StaticUnorderedFlatMultimap;
pub use raw::growth::{Amortized, Exact, Fixed, GrowthPolicy};
pub use raw::{IntoIter, MAX_INLINE_BYTES};
pub use sets::small_flat_multiset::SmallFlatMultiset;
pub use sets::small_flat_set::SmallFlatSet;
pub use sets::static_unordered_flat_set::StaticUnorderedFlatSet;
pub use vecs::compact_vec::CompactVec;
