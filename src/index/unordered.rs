//! Linear scan over an unsorted run of entries.

use super::Equivalence;

/// Position of the first entry equivalent to `key`, scanning from the front.
#[inline]
pub(crate) fn find<E, Q, M, P>(entries: &[E], key: &Q, eq: &M, project: P) -> Option<usize>
where
    Q: ?Sized,
    M: Equivalence<Q>,
    P: Fn(&E) -> &Q,
{
    entries.iter().position(|e| eq.equivalent(project(e), key))
}

/// Position of the next entry equivalent to `key` at or after `from`.
#[inline]
pub(crate) fn find_from<E, Q, M, P>(
    entries: &[E],
    from: usize,
    key: &Q,
    eq: &M,
    project: P,
) -> Option<usize>
where
    Q: ?Sized,
    M: Equivalence<Q>,
    P: Fn(&E) -> &Q,
{
    find(entries.get(from..)?, key, eq, project).map(|i| i + from)
}

/// Number of entries equivalent to `key`.
#[inline]
pub(crate) fn count<E, Q, M, P>(entries: &[E], key: &Q, eq: &M, project: P) -> usize
where
    Q: ?Sized,
    M: Equivalence<Q>,
    P: Fn(&E) -> &Q,
{
    entries
        .iter()
        .filter(|e| eq.equivalent(project(*e), key))
        .count()
}

/// Whether `b` holds the same values as `a`, with the same multiplicities, in any order.
pub(crate) fn is_permutation<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().enumerate().all(|(i, x)| {
        // Each distinct value is counted once, at its first occurrence.
        a[..i].contains(x)
            || a.iter().filter(|y| *y == x).count() == b.iter().filter(|y| *y == x).count()
    })
}
