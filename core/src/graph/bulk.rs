//! Bulk operations on persistent maps, executed as a parallel fold.

use im::{OrdMap, OrdSet};

use crate::util::parallel;

/// Combine two partial results, entries of `right` replace those of `left`.
pub(crate) fn last_wins<K, X>(left: OrdMap<K, X>, right: OrdMap<K, X>) -> OrdMap<K, X>
where
    K: Ord + Clone,
    X: Clone,
{
    right.union(left)
}

/// Combine two partial results, sets for the same key are merged.
pub(crate) fn union_sets<K, X>(
    left: OrdMap<K, OrdSet<X>>,
    right: OrdMap<K, OrdSet<X>>,
) -> OrdMap<K, OrdSet<X>>
where
    K: Ord + Clone,
    X: Ord + Clone,
{
    left.union_with(right, |a, b| a.union(b))
}

/// Insert or replace all `entries` in `prior`.
pub(crate) fn upsert<K, X>(prior: &OrdMap<K, X>, entries: Vec<(K, X)>) -> OrdMap<K, X>
where
    K: Ord + Clone + Send + Sync,
    X: Clone + Send + Sync,
{
    let added = parallel::fold(
        entries,
        OrdMap::new,
        |mut acc, (key, value)| {
            acc.insert(key, value);
            acc
        },
        last_wins,
    );
    added.union(prior.clone())
}

pub(crate) fn filter_entries<K, X, F>(map: &OrdMap<K, X>, keep: F) -> OrdMap<K, X>
where
    K: Ord + Clone + Send + Sync,
    X: Clone + Send + Sync,
    F: Fn(&K, &X) -> bool + Send + Sync,
{
    let entries: Vec<(&K, &X)> = map.iter().collect();
    parallel::fold(
        entries,
        OrdMap::new,
        |mut acc, (key, value)| {
            if keep(key, value) {
                acc.insert(key.clone(), value.clone());
            }
            acc
        },
        last_wins,
    )
}

pub(crate) fn map_values<K, X, Y, F>(map: &OrdMap<K, X>, f: F) -> OrdMap<K, Y>
where
    K: Ord + Clone + Send + Sync,
    X: Clone + Send + Sync,
    Y: Clone + Send + Sync,
    F: Fn(&K, &X) -> Y + Send + Sync,
{
    let entries: Vec<(&K, &X)> = map.iter().collect();
    parallel::fold(
        entries,
        OrdMap::new,
        |mut acc, (key, value)| {
            acc.insert(key.clone(), f(key, value));
            acc
        },
        last_wins,
    )
}

/// Replace each entry with the entries produced by `f`. If several entries
/// are produced for the same key, the last one wins.
pub(crate) fn flat_map_entries<K, X, K2, Y, I, F>(map: &OrdMap<K, X>, f: F) -> OrdMap<K2, Y>
where
    K: Ord + Clone + Send + Sync,
    X: Clone + Send + Sync,
    K2: Ord + Clone + Send + Sync,
    Y: Clone + Send + Sync,
    I: IntoIterator<Item = (K2, Y)>,
    F: Fn(&K, &X) -> I + Send + Sync,
{
    let entries: Vec<(&K, &X)> = map.iter().collect();
    parallel::fold(
        entries,
        OrdMap::new,
        |mut acc, (key, value)| {
            for (new_key, new_value) in f(key, value) {
                acc.insert(new_key, new_value);
            }
            acc
        },
        last_wins,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use im::{ordmap, ordset};

    #[test]
    fn upsert_replaces_with_last_entry() {
        let prior = ordmap! {1 => "a", 2 => "b"};
        let result = upsert(&prior, vec![(2, "x"), (3, "c"), (2, "y")]);
        assert_eq!(ordmap! {1 => "a", 2 => "y", 3 => "c"}, result);
        // the input is not changed
        assert_eq!(ordmap! {1 => "a", 2 => "b"}, prior);
    }

    #[test]
    fn union_of_sets() {
        let left = ordmap! {1 => ordset!["a"], 2 => ordset!["b"]};
        let right = ordmap! {2 => ordset!["c"], 3 => ordset!["d"]};
        assert_eq!(
            ordmap! {1 => ordset!["a"], 2 => ordset!["b", "c"], 3 => ordset!["d"]},
            union_sets(left, right)
        );
    }

    #[test]
    fn flat_map_last_wins() {
        let map = ordmap! {1 => 10, 2 => 20};
        let result = flat_map_entries(&map, |k, v| vec![(k * 2, *v), (0, *v)]);
        assert_eq!(ordmap! {0 => 20, 2 => 10, 4 => 20}, result);
    }
}
