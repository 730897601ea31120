//! Binary search over a sorted run of entries.
//!
//! Every function takes the entries, the key being looked for, the comparator and a
//! projection from an entry to its key. The entries must be sorted by the comparator applied
//! to the projected keys.

use core::cmp::Ordering;
use core::ops::Range;

use super::Compare;

/// First position whose key is not less than `key`.
#[inline]
pub(crate) fn lower_bound<E, Q, C, P>(entries: &[E], key: &Q, cmp: &C, project: P) -> usize
where
    Q: ?Sized,
    C: Compare<Q>,
    P: Fn(&E) -> &Q,
{
    entries.partition_point(|e| cmp.compare(project(e), key) == Ordering::Less)
}

/// First position whose key is greater than `key`.
#[inline]
pub(crate) fn upper_bound<E, Q, C, P>(entries: &[E], key: &Q, cmp: &C, project: P) -> usize
where
    Q: ?Sized,
    C: Compare<Q>,
    P: Fn(&E) -> &Q,
{
    entries.partition_point(|e| cmp.compare(key, project(e)) != Ordering::Less)
}

/// The run of entries whose key is equivalent to `key`.
pub(crate) fn equal_range<E, Q, C, P>(entries: &[E], key: &Q, cmp: &C, project: P) -> Range<usize>
where
    Q: ?Sized,
    C: Compare<Q>,
    P: Fn(&E) -> &Q,
{
    let start = lower_bound(entries, key, cmp, &project);
    let end = start + upper_bound(&entries[start..], key, cmp, &project);
    start..end
}

/// Position of the first entry equivalent to `key`.
#[inline]
pub(crate) fn find<E, Q, C, P>(entries: &[E], key: &Q, cmp: &C, project: P) -> Option<usize>
where
    Q: ?Sized,
    C: Compare<Q>,
    P: Fn(&E) -> &Q,
{
    let pos = lower_bound(entries, key, cmp, &project);
    match entries.get(pos) {
        Some(e) if !cmp.less(key, project(e)) => Some(pos),
        _ => None,
    }
}

/// Where `key` goes in a container with unique keys: `Ok(pos)` to insert at `pos`, or
/// `Err(pos)` when an equivalent key already sits at `pos`.
///
/// A valid `hint` saves the search. A hint is valid when the entry before it is strictly
/// less than `key` and the entry at it is strictly greater; anything else, including an
/// out-of-range hint, falls back to the full search.
pub(crate) fn insert_position<E, Q, C, P>(
    entries: &[E],
    key: &Q,
    cmp: &C,
    project: P,
    hint: Option<usize>,
) -> Result<usize, usize>
where
    Q: ?Sized,
    C: Compare<Q>,
    P: Fn(&E) -> &Q,
{
    if let Some(h) = hint {
        if h <= entries.len()
            && (h == 0 || cmp.less(project(&entries[h - 1]), key))
            && (h == entries.len() || cmp.less(key, project(&entries[h])))
        {
            return Ok(h);
        }
    }
    let pos = lower_bound(entries, key, cmp, &project);
    match entries.get(pos) {
        Some(e) if !cmp.less(key, project(e)) => Err(pos),
        _ => Ok(pos),
    }
}

/// Where `key` goes in a container that allows equivalent keys. New keys go in front of
/// their equal run.
///
/// A hint is valid when the entry before it is not greater than `key` and the entry at it
/// is not less; otherwise the full search is used.
pub(crate) fn insert_position_multi<E, Q, C, P>(
    entries: &[E],
    key: &Q,
    cmp: &C,
    project: P,
    hint: Option<usize>,
) -> usize
where
    Q: ?Sized,
    C: Compare<Q>,
    P: Fn(&E) -> &Q,
{
    if let Some(h) = hint {
        if h <= entries.len()
            && (h == 0 || !cmp.less(key, project(&entries[h - 1])))
            && (h == entries.len() || !cmp.less(project(&entries[h]), key))
        {
            return h;
        }
    }
    lower_bound(entries, key, cmp, project)
}
