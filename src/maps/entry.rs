//! In-place manipulation of a single map slot.
//!
//! An [`Entry`] is produced by `entry(key)` on
//! [`SmallFlatMap`](super::small_flat_map::SmallFlatMap)
//! and [`SmallUnorderedFlatMap`](super::small_unordered_flat_map::SmallUnorderedFlatMap).
//! The lookup has already happened: an occupied entry knows the position of its key and a
//! vacant one knows where the key has to go, so finishing the operation never searches again.

use core::fmt;
use core::mem;

use allocator_api2::alloc::Global;

use crate::alloc::FlatAllocator;
use crate::error::{Result, infallible};
use crate::raw::RawFlat;

/// Which erase a map uses for its occupied entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    /// Shift the tail left; sorted maps.
    Shift,
    /// Move the last entry into the hole; unordered maps.
    SwapLast,
}

/// A view into a single slot of a flat map, either occupied or vacant.
pub enum Entry<'a, K, V, const N: usize, A: FlatAllocator = Global> {
    Occupied(OccupiedEntry<'a, K, V, N, A>),
    Vacant(VacantEntry<'a, K, V, N, A>),
}

/// A slot holding an entry.
pub struct OccupiedEntry<'a, K, V, const N: usize, A: FlatAllocator = Global> {
    pub(crate) raw: &'a mut RawFlat<(K, V), N, A>,
    pub(crate) index: usize,
    pub(crate) removal: Removal,
}

/// A position where a missing key would be inserted.
pub struct VacantEntry<'a, K, V, const N: usize, A: FlatAllocator = Global> {
    pub(crate) raw: &'a mut RawFlat<(K, V), N, A>,
    pub(crate) key: K,
    pub(crate) index: usize,
}

impl<'a, K, V, const N: usize, A: FlatAllocator> Entry<'a, K, V, N, A> {
    /// Returns the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(e) => e.key(),
            Entry::Vacant(e) => e.key(),
        }
    }

    /// Ensures a value is present by inserting `default` if the slot is vacant.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default),
        }
    }

    /// Ensures a value is present by inserting the result of `default` if the slot is vacant.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(default()),
        }
    }

    /// Like [`or_insert_with`](Self::or_insert_with), with the key passed to `default`.
    pub fn or_insert_with_key<F: FnOnce(&K) -> V>(self, default: F) -> &'a mut V {
        match self {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let value = default(&e.key);
                e.insert(value)
            }
        }
    }

    /// Applies `f` to the value if the slot is occupied.
    pub fn and_modify<F: FnOnce(&mut V)>(self, f: F) -> Self {
        match self {
            Entry::Occupied(mut e) => {
                f(e.get_mut());
                Entry::Occupied(e)
            }
            vacant => vacant,
        }
    }
}

impl<'a, K, V: Default, const N: usize, A: FlatAllocator> Entry<'a, K, V, N, A> {
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(V::default)
    }
}

impl<'a, K, V, const N: usize, A: FlatAllocator> OccupiedEntry<'a, K, V, N, A> {
    pub fn key(&self) -> &K {
        &self.raw.as_slice()[self.index].0
    }

    /// Position of the entry in storage order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self) -> &V {
        &self.raw.as_slice()[self.index].1
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.raw.as_mut_slice()[self.index].1
    }

    /// Converts the entry into a reference bound to the map's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        let Self { raw, index, .. } = self;
        &mut raw.as_mut_slice()[index].1
    }

    /// Replaces the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the map.
    ///
    /// In an unordered map the last entry takes the removed one's place.
    pub fn remove_entry(self) -> (K, V) {
        match self.removal {
            Removal::Shift => self.raw.remove(self.index),
            Removal::SwapLast => self.raw.swap_remove(self.index),
        }
    }

    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}

impl<'a, K, V, const N: usize, A: FlatAllocator> VacantEntry<'a, K, V, N, A> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes back the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Position the entry will occupy once inserted.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Inserts the entry, returning a reference to its value.
    ///
    /// # Panics
    /// If the map cannot grow; see [`try_insert`](Self::try_insert).
    pub fn insert(self, value: V) -> &'a mut V {
        infallible(self.try_insert(value))
    }

    /// Inserts the entry, reporting a failure to grow instead of panicking. On error the map
    /// is unchanged.
    pub fn try_insert(self, value: V) -> Result<&'a mut V> {
        let Self { raw, key, index } = self;
        raw.try_insert(index, (key, value))?;
        Ok(&mut raw.as_mut_slice()[index].1)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize, A: FlatAllocator> fmt::Debug
    for Entry<'_, K, V, N, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Occupied(e) => f.debug_tuple("Entry").field(e).finish(),
            Entry::Vacant(e) => f.debug_tuple("Entry").field(e).finish(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, const N: usize, A: FlatAllocator> fmt::Debug
    for OccupiedEntry<'_, K, V, N, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish()
    }
}

impl<K: fmt::Debug, V, const N: usize, A: FlatAllocator> fmt::Debug
    for VacantEntry<'_, K, V, N, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}
