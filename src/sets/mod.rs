//! Set containers.
//!
//! Sets store their keys directly, so borrowing iteration is a plain slice walk. Keys are
//! never handed out mutably: changing one in place could break the order or uniqueness the
//! set relies on.

pub mod small_flat_multiset;
pub mod small_flat_set;
pub mod static_unordered_flat_set;

use core::borrow::Borrow;
use core::slice;

/// Iterator over the keys of a set, in storage order.
pub type Iter<'a, K> = slice::Iter<'a, K>;

/// Projects a stored key onto its borrowed form.
#[inline(always)]
pub(crate) fn key<K: Borrow<Q>, Q: ?Sized>(stored: &K) -> &Q {
    stored.borrow()
}
