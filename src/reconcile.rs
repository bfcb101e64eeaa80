//! Set-difference pass shared by every component that tracks endpoints.
//!
//! Each pass compares the keys a component already knows about with an
//! ordered input list, then reports every item as added, retained, or
//! removed through one callback.

use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Change<T, K> {
    /// First pass in which this key is present.
    Added(T),
    /// Present in this pass and the previous one.
    Retained(T),
    /// Known before but absent from this pass.
    Removed(K),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub added: usize,
    pub retained: usize,
    pub removed: usize,
}

/// Diff `current` against `previous` and feed every change to `apply`.
///
/// Added and retained items arrive in input order. Removed keys follow, in
/// key order. A key repeated in `current` is only reported the first time.
pub fn reconcile_keys<T, K, P, C, F, A>(
    previous: P,
    current: C,
    key_of: F,
    mut apply: A,
) -> PassSummary
where
    K: Ord + Clone,
    P: IntoIterator<Item = K>,
    C: IntoIterator<Item = T>,
    F: Fn(&T) -> K,
    A: FnMut(Change<T, K>),
{
    let mut stale: BTreeSet<K> = previous.into_iter().collect();
    let mut seen: BTreeSet<K> = BTreeSet::new();
    let mut summary = PassSummary::default();

    for item in current {
        let key = key_of(&item);
        if !seen.insert(key.clone()) {
            continue;
        }
        if stale.remove(&key) {
            summary.retained += 1;
            apply(Change::Retained(item));
        } else {
            summary.added += 1;
            apply(Change::Added(item));
        }
    }

    for key in stale {
        summary.removed += 1;
        apply(Change::Removed(key));
    }

    summary
}
