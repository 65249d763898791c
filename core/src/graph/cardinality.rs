//! Conversion between one edge and a set of edges per point pair.

use im::{OrdMap, OrdSet};

use super::bulk;
use crate::{
    types::{EdgePayload, Payload, Point, PointPair},
    util::{endpoints_present, parallel},
};

/// Turns the edge set of a single point pair into the edge payload of
/// another representation.
pub trait CardinalityAdapter<E: EdgePayload> {
    type Output: Clone + Send + Sync + 'static;

    /// Collapse the set of one pair. `None` removes the pair.
    fn collapse(edges: OrdSet<E>) -> Option<Self::Output>;

    /// Convert all edge sets, leaving out pairs with a missing endpoint.
    fn adapt<P: Point, V: Payload>(
        vertices: &OrdMap<P, V>,
        edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
    ) -> OrdMap<PointPair<P>, Self::Output> {
        Self::adapt_counted(vertices, edge_sets).0
    }

    /// Like [`adapt`](CardinalityAdapter::adapt), but also returns the number
    /// of pairs that were left out because of a missing endpoint.
    fn adapt_counted<P: Point, V: Payload>(
        vertices: &OrdMap<P, V>,
        edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
    ) -> (OrdMap<PointPair<P>, Self::Output>, usize) {
        let entries: Vec<(PointPair<P>, OrdSet<E>)> = edge_sets.into_iter().collect();
        parallel::fold(
            entries,
            || (OrdMap::new(), 0),
            |(mut acc, mut omitted), (pair, edges)| {
                if !endpoints_present(vertices, &pair) {
                    omitted += 1;
                } else if let Some(output) = Self::collapse(edges) {
                    acc.insert(pair, output);
                }
                (acc, omitted)
            },
            |(left, left_omitted), (right, right_omitted)| {
                (bulk::last_wins(left, right), left_omitted + right_omitted)
            },
        )
    }
}

/// Keeps the greatest edge of each set.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManyToOne;

impl<E: EdgePayload> CardinalityAdapter<E> for ManyToOne {
    type Output = E;

    fn collapse(edges: OrdSet<E>) -> Option<E> {
        edges.get_max().cloned()
    }
}

/// Keeps each set as it is, empty sets are removed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManyToMany;

impl<E: EdgePayload> CardinalityAdapter<E> for ManyToMany {
    type Output = OrdSet<E>;

    fn collapse(edges: OrdSet<E>) -> Option<OrdSet<E>> {
        if edges.is_empty() {
            None
        } else {
            Some(edges)
        }
    }
}

/// Wrap every edge into a singleton set, leaving out pairs with a missing
/// endpoint. Returns the sets and the number of left out edges.
pub fn one_to_many<P: Point, V: Payload, E: EdgePayload>(
    vertices: &OrdMap<P, V>,
    edges: OrdMap<PointPair<P>, E>,
) -> (OrdMap<PointPair<P>, OrdSet<E>>, usize) {
    let entries: Vec<(PointPair<P>, E)> = edges.into_iter().collect();
    parallel::fold(
        entries,
        || (OrdMap::new(), 0),
        |(mut acc, mut omitted): (OrdMap<PointPair<P>, OrdSet<E>>, usize), (pair, edge)| {
            if endpoints_present(vertices, &pair) {
                acc.insert(pair, OrdSet::unit(edge));
            } else {
                omitted += 1;
            }
            (acc, omitted)
        },
        |(left, left_omitted), (right, right_omitted)| {
            (bulk::union_sets(left, right), left_omitted + right_omitted)
        },
    )
}
