//! Map containers and the borrowing iterators they share.
//!
//! Every map stores its entries as `(K, V)` tuples in one contiguous run, so iteration is a
//! slice walk that splits each tuple into a key reference and a value reference.

pub mod entry;
pub mod small_flat_map;
pub mod small_unordered_flat_map;
pub mod static_unordered_flat_multimap;

use core::borrow::Borrow;
use core::iter::FusedIterator;
use core::slice;

/// Projects a stored entry onto the borrowed form of its key.
#[inline(always)]
pub(crate) fn key_of<K: Borrow<Q>, V, Q: ?Sized>(entry: &(K, V)) -> &Q {
    entry.0.borrow()
}

macro_rules! entry_iterator {
    ($(#[$meta:meta])* $name:ident<$lt:lifetime>, $inner:ty, $item:ty, |$e:ident| $map:expr) => {
        $(#[$meta])*
        pub struct $name<$lt, K, V> {
            pub(crate) inner: $inner,
        }

        impl<$lt, K, V> Iterator for $name<$lt, K, V> {
            type Item = $item;

            #[inline]
            fn next(&mut self) -> Option<Self::Item> {
                self.inner.next().map(|$e| $map)
            }

            #[inline]
            fn size_hint(&self) -> (usize, Option<usize>) {
                self.inner.size_hint()
            }
        }

        impl<$lt, K, V> DoubleEndedIterator for $name<$lt, K, V> {
            #[inline]
            fn next_back(&mut self) -> Option<Self::Item> {
                self.inner.next_back().map(|$e| $map)
            }
        }

        impl<$lt, K, V> ExactSizeIterator for $name<$lt, K, V> {}
        impl<$lt, K, V> FusedIterator for $name<$lt, K, V> {}
    };
}

entry_iterator!(
    /// Iterator over `(&K, &V)` in storage order.
    Iter<'a>, slice::Iter<'a, (K, V)>, (&'a K, &'a V), |e| (&e.0, &e.1)
);
entry_iterator!(
    /// Iterator over `(&K, &mut V)` in storage order. Keys stay immutable.
    IterMut<'a>, slice::IterMut<'a, (K, V)>, (&'a K, &'a mut V), |e| (&e.0, &mut e.1)
);
entry_iterator!(
    /// Iterator over the keys.
    Keys<'a>, slice::Iter<'a, (K, V)>, &'a K, |e| &e.0
);
entry_iterator!(
    /// Iterator over the values.
    Values<'a>, slice::Iter<'a, (K, V)>, &'a V, |e| &e.1
);
entry_iterator!(
    /// Iterator over mutable references to the values.
    ValuesMut<'a>, slice::IterMut<'a, (K, V)>, &'a mut V, |e| &mut e.1
);

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(entries: &'a [(K, V)]) -> Self {
        Self {
            inner: entries.iter(),
        }
    }
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(entries: &'a mut [(K, V)]) -> Self {
        Self {
            inner: entries.iter_mut(),
        }
    }
}
