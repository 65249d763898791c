use im::OrdMap;

use crate::types::{Point, PointPair};

pub mod parallel;

#[cfg(test)]
pub(crate) mod example_graphs;

/// Returns `true` if both endpoints of `pair` have a vertex.
pub fn endpoints_present<P: Point, V: Clone>(vertices: &OrdMap<P, V>, pair: &PointPair<P>) -> bool {
    vertices.contains_key(&pair.source) && vertices.contains_key(&pair.target)
}

/// Collect all pairs with at least one endpoint that has no vertex.
///
/// The result is sorted and free of duplicates.
pub fn dangling_pairs<'a, P, V, I>(vertices: &OrdMap<P, V>, pairs: I) -> Vec<PointPair<P>>
where
    P: Point,
    V: Clone,
    I: IntoIterator<Item = &'a PointPair<P>>,
{
    let mut result: Vec<PointPair<P>> = pairs
        .into_iter()
        .filter(|pair| !endpoints_present(vertices, pair))
        .cloned()
        .collect();
    result.sort_unstable();
    result.dedup();
    result
}

/// Check the referential integrity of a vertex map and a set of edge
/// locations.
pub fn is_consistent<'a, P, V, I>(vertices: &OrdMap<P, V>, pairs: I) -> bool
where
    P: Point,
    V: Clone,
    I: IntoIterator<Item = &'a PointPair<P>>,
{
    pairs
        .into_iter()
        .all(|pair| endpoints_present(vertices, pair))
}
