use std::fmt::Debug;
use std::hash::Hash;

/// Identifier of a graph location.
///
/// Points are supplied by the caller; containers only compare, hash and
/// order them. The total order is what makes iteration over materialized
/// containers deterministic.
pub trait Point: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> Point for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

/// Payload attached to a vertex.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + Send + Sync + 'static {}

/// Payload attached to an edge.
///
/// Edge payloads must be ordered: the multi-edge representation keeps them in
/// an ordered set and collapsing such a set to a single edge picks its
/// greatest element.
pub trait EdgePayload: Payload + Ord {}

impl<T> EdgePayload for T where T: Payload + Ord {}

/// Ordered pair of points which identifies the location of an edge.
#[derive(
    Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Default,
)]
pub struct PointPair<P> {
    pub source: P,
    pub target: P,
}

impl<P> PointPair<P> {
    pub fn new(source: P, target: P) -> PointPair<P> {
        PointPair { source, target }
    }
}

impl<P: Clone> PointPair<P> {
    pub fn inverse(&self) -> PointPair<P> {
        PointPair {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

impl<P> From<(P, P)> for PointPair<P> {
    fn from((source, target): (P, P)) -> Self {
        PointPair { source, target }
    }
}

impl<P: std::fmt::Display> std::fmt::Display for PointPair<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
