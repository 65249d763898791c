//! Persistent graph containers.
//!
//! A [`Graph`] maps points to vertex payloads and ordered point pairs to edge
//! payloads. Which storage is used is selected by the representation tag `R`,
//! a type that only exists at compile time:
//!
//! - [`SingleEdge`]: one edge payload per ordered pair,
//! - [`MultiEdge`]: a non-empty set of edge payloads per ordered pair,
//! - [`Deferred`]: vertices and edges as lazily produced
//!   [`Stream`](crate::stream::Stream)s.
//!
//! All representations implement the same [`GraphTemplate`] operations. No
//! operation changes an existing graph, each one returns a new value that
//! shares unchanged structure with its input.
//!
//! Edges are only ever stored if both of their endpoints have a vertex. Every
//! operation that would introduce an edge with a missing endpoint leaves that
//! edge out instead of failing.

mod bulk;
pub mod cardinality;
pub mod deferred;
pub mod multi;
pub mod single;

use im::{OrdMap, OrdSet};

use crate::types::{EdgePayload, Payload, Point, PointPair};

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::SingleEdge {}
    impl Sealed for super::MultiEdge {}
    impl Sealed for super::Deferred {}
}

/// Selects the storage of a [`Graph`].
///
/// This trait is sealed, the representations of this crate are the only
/// implementations.
pub trait Representation: sealed::Sealed + Send + Sync + 'static {
    /// Name of the representation used in log output.
    const NAME: &'static str;

    type Vertices<P: Point, V: Payload>: Clone;
    type Edges<P: Point, E: EdgePayload>: Clone;
}

/// One edge payload per ordered point pair. Adding an edge for a pair that
/// already has one replaces it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SingleEdge;

/// A set of edge payloads per ordered point pair. Adding an edge for a pair
/// that already has edges adds it to the set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MultiEdge;

/// Vertices and edges are lazily produced, replayable sequences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deferred;

impl Representation for SingleEdge {
    const NAME: &'static str = "single-edge";

    type Vertices<P: Point, V: Payload> = OrdMap<P, V>;
    type Edges<P: Point, E: EdgePayload> = OrdMap<PointPair<P>, E>;
}

impl Representation for MultiEdge {
    const NAME: &'static str = "multi-edge";

    type Vertices<P: Point, V: Payload> = OrdMap<P, V>;
    type Edges<P: Point, E: EdgePayload> = OrdMap<PointPair<P>, OrdSet<E>>;
}

impl Representation for Deferred {
    const NAME: &'static str = "deferred";

    type Vertices<P: Point, V: Payload> = deferred::DeferredVertices<P, V>;
    type Edges<P: Point, E: EdgePayload> = deferred::DeferredEdges<P, E>;
}

/// An immutable graph value in the representation `R`.
pub struct Graph<P: Point, V: Payload, E: EdgePayload, R: Representation> {
    vertices: R::Vertices<P, V>,
    edges: R::Edges<P, E>,
}

pub type SingleEdgeGraph<P, V, E> = Graph<P, V, E, SingleEdge>;
pub type MultiEdgeGraph<P, V, E> = Graph<P, V, E, MultiEdge>;
pub type DeferredGraph<P, V, E> = Graph<P, V, E, Deferred>;

impl<P: Point, V: Payload, E: EdgePayload, R: Representation> Graph<P, V, E, R> {
    pub(crate) fn from_parts(vertices: R::Vertices<P, V>, edges: R::Edges<P, E>) -> Self {
        Graph { vertices, edges }
    }
}

impl<P: Point, V: Payload, E: EdgePayload, R: Representation> Clone for Graph<P, V, E, R> {
    fn clone(&self) -> Self {
        Graph {
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
        }
    }
}

impl<P, V, E, R> PartialEq for Graph<P, V, E, R>
where
    P: Point,
    V: Payload,
    E: EdgePayload,
    R: Representation,
    R::Vertices<P, V>: PartialEq,
    R::Edges<P, E>: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices && self.edges == other.edges
    }
}

impl<P, V, E, R> std::fmt::Debug for Graph<P, V, E, R>
where
    P: Point,
    V: Payload,
    E: EdgePayload,
    R: Representation,
    R::Vertices<P, V>: std::fmt::Debug,
    R::Edges<P, E>: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("representation", &R::NAME)
            .field("vertices", &self.vertices)
            .field("edges", &self.edges)
            .finish()
    }
}

/// The operations every representation provides.
///
/// Caller supplied functions must be `Send + Sync + 'static`: materialized
/// representations call them from worker threads and the deferred
/// representation stores them in its lazy pipelines. A panic in a caller
/// supplied function is propagated to the caller.
///
/// When a bulk operation assigns two values to the same key, the later one in
/// the input wins.
pub trait GraphTemplate<P: Point, V: Payload, E: EdgePayload>: Sized {
    /// The same representation with a different vertex payload.
    type WithVertices<V2: Payload>: GraphTemplate<P, V2, E>;
    /// The same representation with a different edge payload.
    type WithEdges<E2: EdgePayload>: GraphTemplate<P, V, E2>;

    /// Create a graph from a vertex map and one edge per pair.
    fn from_vertices_and_edges(vertices: OrdMap<P, V>, edges: OrdMap<PointPair<P>, E>) -> Self;

    /// Create a graph from a vertex map and a set of edges per pair.
    fn from_vertices_and_edge_sets(
        vertices: OrdMap<P, V>,
        edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
    ) -> Self;

    /// Create a graph from sequences of vertex and edge entries.
    ///
    /// Materialized representations consume both sequences immediately.
    fn from_vertex_and_edge_streams<VI, EI>(vertices: VI, edges: EI) -> Self
    where
        VI: IntoIterator<Item = (P, V)>,
        VI::IntoIter: Send + 'static,
        EI: IntoIterator<Item = (PointPair<P>, E)>,
        EI::IntoIter: Send + 'static;

    /// Insert or replace the vertex for `point`. Edges are never removed.
    fn put_vertex(&self, point: P, vertex: V) -> Self {
        self.put_all_vertices(std::iter::once((point, vertex)))
    }

    /// Add an edge from `source` to `target`.
    ///
    /// If one of the two points has no vertex, the graph is returned
    /// unchanged.
    fn put_edge(&self, source: P, target: P, edge: E) -> Self {
        self.put_all_edges(std::iter::once((PointPair::new(source, target), edge)))
    }

    fn put_all_vertices<I>(&self, vertices: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        I::IntoIter: Send + 'static;

    /// Add all edges whose endpoints both have a vertex, the others are left
    /// out.
    fn put_all_edges<I>(&self, edges: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, E)>,
        I::IntoIter: Send + 'static;

    /// Add all edge sets whose endpoints both have a vertex, the others are
    /// left out.
    fn put_all_edge_sets<I>(&self, edge_sets: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, OrdSet<E>)>,
        I::IntoIter: Send + 'static;

    /// Keep only the vertices matching the predicate. Edges that lose an
    /// endpoint are removed as well.
    fn filter_vertices<F>(&self, predicate: F) -> Self
    where
        F: Fn(&P, &V) -> bool + Send + Sync + 'static;

    /// Keep only the individual edges matching the predicate. Vertices are not
    /// changed.
    fn filter_edges<F>(&self, predicate: F) -> Self
    where
        F: Fn(&PointPair<P>, &E) -> bool + Send + Sync + 'static;

    fn map_vertices<V2, F>(&self, f: F) -> Self::WithVertices<V2>
    where
        V2: Payload,
        F: Fn(&P, &V) -> V2 + Send + Sync + 'static;

    fn map_edges<E2, F>(&self, f: F) -> Self::WithEdges<E2>
    where
        E2: EdgePayload,
        F: Fn(&PointPair<P>, &E) -> E2 + Send + Sync + 'static;

    /// Replace each vertex with zero or more new vertices. Edges that lose an
    /// endpoint are removed.
    fn flat_map_vertices<V2, I, F>(&self, f: F) -> Self::WithVertices<V2>
    where
        V2: Payload,
        I: IntoIterator<Item = (P, V2)>,
        I::IntoIter: Send + 'static,
        F: Fn(&P, &V) -> I + Send + Sync + 'static;

    /// Replace each individual edge with zero or more new edges. New edges
    /// with a missing endpoint are left out.
    fn flat_map_edges<E2, I, F>(&self, f: F) -> Self::WithEdges<E2>
    where
        E2: EdgePayload,
        I: IntoIterator<Item = (PointPair<P>, E2)>,
        I::IntoIter: Send + 'static,
        F: Fn(&PointPair<P>, &E) -> I + Send + Sync + 'static;
}

fn log_omitted<R: Representation>(omitted: usize) {
    if omitted > 0 {
        debug!(
            "{}: left out {} edges with a missing endpoint",
            R::NAME,
            omitted
        );
    }
}
