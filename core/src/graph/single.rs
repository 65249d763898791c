use im::{OrdMap, OrdSet};

use super::{
    bulk,
    cardinality::{self, CardinalityAdapter, ManyToOne},
    log_omitted, DeferredGraph, Graph, GraphTemplate, MultiEdgeGraph, SingleEdge,
};
use crate::{
    types::{EdgePayload, Payload, Point, PointPair},
    util::{endpoints_present, parallel},
};

/// Fold edge entries produced by `expand` into a map, leaving out every edge
/// with a missing endpoint. Returns the map and the number of left out edges.
fn collect_edges<P, V, E, T, I, F>(
    vertices: &OrdMap<P, V>,
    items: Vec<T>,
    expand: F,
) -> (OrdMap<PointPair<P>, E>, usize)
where
    P: Point,
    V: Payload,
    E: EdgePayload,
    T: Send,
    I: IntoIterator<Item = (PointPair<P>, E)>,
    F: Fn(T) -> I + Send + Sync,
{
    parallel::fold(
        items,
        || (OrdMap::new(), 0),
        |(mut acc, mut omitted), item| {
            for (pair, edge) in expand(item) {
                if endpoints_present(vertices, &pair) {
                    acc.insert(pair, edge);
                } else {
                    trace!("leaving out edge {:?} with a missing endpoint", pair);
                    omitted += 1;
                }
            }
            (acc, omitted)
        },
        |(left, left_omitted), (right, right_omitted)| {
            (bulk::last_wins(left, right), left_omitted + right_omitted)
        },
    )
}

impl<P: Point, V: Payload, E: EdgePayload> Graph<P, V, E, SingleEdge> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Graph::from_parts(OrdMap::new(), OrdMap::new())
    }

    pub fn vertices(&self) -> &OrdMap<P, V> {
        &self.vertices
    }

    pub fn edges(&self) -> &OrdMap<PointPair<P>, E> {
        &self.edges
    }

    pub fn vertex(&self, point: &P) -> Option<&V> {
        self.vertices.get(point)
    }

    pub fn contains_vertex(&self, point: &P) -> bool {
        self.vertices.contains_key(point)
    }

    pub fn edge(&self, source: &P, target: &P) -> Option<&E> {
        self.edges
            .get(&PointPair::new(source.clone(), target.clone()))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Like [`put_all_edges`](GraphTemplate::put_all_edges), but also
    /// returns the number of edges that were left out because of a missing
    /// endpoint.
    pub fn put_all_edges_counted<I>(&self, edges: I) -> (Self, usize)
    where
        I: IntoIterator<Item = (PointPair<P>, E)>,
    {
        let entries: Vec<(PointPair<P>, E)> = edges.into_iter().collect();
        let (added, omitted) = collect_edges(&self.vertices, entries, std::iter::once);
        let edges = added.union(self.edges.clone());
        (Graph::from_parts(self.vertices.clone(), edges), omitted)
    }

    /// Convert into the multi-edge representation, each edge becomes a
    /// singleton set.
    pub fn to_multi_edge(&self) -> MultiEdgeGraph<P, V, E> {
        let (edge_sets, _) = cardinality::one_to_many(&self.vertices, self.edges.clone());
        Graph::from_parts(self.vertices.clone(), edge_sets)
    }

    /// Convert into the deferred representation.
    pub fn to_deferred(&self) -> DeferredGraph<P, V, E> {
        DeferredGraph::from_vertices_and_edges(self.vertices.clone(), self.edges.clone())
    }
}

impl<P: Point, V: Payload, E: EdgePayload> Default for Graph<P, V, E, SingleEdge> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Point, V: Payload, E: EdgePayload> GraphTemplate<P, V, E> for Graph<P, V, E, SingleEdge> {
    type WithVertices<V2: Payload> = Graph<P, V2, E, SingleEdge>;
    type WithEdges<E2: EdgePayload> = Graph<P, V, E2, SingleEdge>;

    fn from_vertices_and_edges(vertices: OrdMap<P, V>, edges: OrdMap<PointPair<P>, E>) -> Self {
        let entries: Vec<(PointPair<P>, E)> = edges.into_iter().collect();
        let (edges, omitted) = collect_edges(&vertices, entries, std::iter::once);
        log_omitted::<SingleEdge>(omitted);
        Graph::from_parts(vertices, edges)
    }

    fn from_vertices_and_edge_sets(
        vertices: OrdMap<P, V>,
        edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
    ) -> Self {
        let (edges, omitted) = ManyToOne::adapt_counted(&vertices, edge_sets);
        log_omitted::<SingleEdge>(omitted);
        Graph::from_parts(vertices, edges)
    }

    fn from_vertex_and_edge_streams<VI, EI>(vertices: VI, edges: EI) -> Self
    where
        VI: IntoIterator<Item = (P, V)>,
        VI::IntoIter: Send + 'static,
        EI: IntoIterator<Item = (PointPair<P>, E)>,
        EI::IntoIter: Send + 'static,
    {
        let vertices: OrdMap<P, V> = vertices.into_iter().collect();
        let entries: Vec<(PointPair<P>, E)> = edges.into_iter().collect();
        let (edges, omitted) = collect_edges(&vertices, entries, std::iter::once);
        log_omitted::<SingleEdge>(omitted);
        Graph::from_parts(vertices, edges)
    }

    fn put_vertex(&self, point: P, vertex: V) -> Self {
        Graph::from_parts(self.vertices.update(point, vertex), self.edges.clone())
    }

    fn put_edge(&self, source: P, target: P, edge: E) -> Self {
        let pair = PointPair::new(source, target);
        if endpoints_present(&self.vertices, &pair) {
            Graph::from_parts(self.vertices.clone(), self.edges.update(pair, edge))
        } else {
            trace!("leaving out edge {:?} with a missing endpoint", pair);
            self.clone()
        }
    }

    fn put_all_vertices<I>(&self, vertices: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        I::IntoIter: Send + 'static,
    {
        let entries: Vec<(P, V)> = vertices.into_iter().collect();
        Graph::from_parts(bulk::upsert(&self.vertices, entries), self.edges.clone())
    }

    fn put_all_edges<I>(&self, edges: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, E)>,
        I::IntoIter: Send + 'static,
    {
        let (result, omitted) = self.put_all_edges_counted(edges);
        log_omitted::<SingleEdge>(omitted);
        result
    }

    fn put_all_edge_sets<I>(&self, edge_sets: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, OrdSet<E>)>,
        I::IntoIter: Send + 'static,
    {
        let entries: Vec<(PointPair<P>, OrdSet<E>)> = edge_sets.into_iter().collect();
        let (added, omitted) = collect_edges(&self.vertices, entries, |(pair, set)| {
            ManyToOne::collapse(set).map(|edge| (pair, edge))
        });
        log_omitted::<SingleEdge>(omitted);
        Graph::from_parts(self.vertices.clone(), added.union(self.edges.clone()))
    }

    fn filter_vertices<F>(&self, predicate: F) -> Self
    where
        F: Fn(&P, &V) -> bool + Send + Sync + 'static,
    {
        let vertices = bulk::filter_entries(&self.vertices, predicate);
        let edges = bulk::filter_entries(&self.edges, |pair, _| {
            endpoints_present(&vertices, pair)
        });
        Graph::from_parts(vertices, edges)
    }

    fn filter_edges<F>(&self, predicate: F) -> Self
    where
        F: Fn(&PointPair<P>, &E) -> bool + Send + Sync + 'static,
    {
        let edges = bulk::filter_entries(&self.edges, predicate);
        Graph::from_parts(self.vertices.clone(), edges)
    }

    fn map_vertices<V2, F>(&self, f: F) -> Self::WithVertices<V2>
    where
        V2: Payload,
        F: Fn(&P, &V) -> V2 + Send + Sync + 'static,
    {
        Graph::from_parts(bulk::map_values(&self.vertices, f), self.edges.clone())
    }

    fn map_edges<E2, F>(&self, f: F) -> Self::WithEdges<E2>
    where
        E2: EdgePayload,
        F: Fn(&PointPair<P>, &E) -> E2 + Send + Sync + 'static,
    {
        Graph::from_parts(self.vertices.clone(), bulk::map_values(&self.edges, f))
    }

    fn flat_map_vertices<V2, I, F>(&self, f: F) -> Self::WithVertices<V2>
    where
        V2: Payload,
        I: IntoIterator<Item = (P, V2)>,
        I::IntoIter: Send + 'static,
        F: Fn(&P, &V) -> I + Send + Sync + 'static,
    {
        let vertices = bulk::flat_map_entries(&self.vertices, f);
        let edges = bulk::filter_entries(&self.edges, |pair, _| {
            endpoints_present(&vertices, pair)
        });
        Graph::from_parts(vertices, edges)
    }

    fn flat_map_edges<E2, I, F>(&self, f: F) -> Self::WithEdges<E2>
    where
        E2: EdgePayload,
        I: IntoIterator<Item = (PointPair<P>, E2)>,
        I::IntoIter: Send + 'static,
        F: Fn(&PointPair<P>, &E) -> I + Send + Sync + 'static,
    {
        let entries: Vec<(&PointPair<P>, &E)> = self.edges.iter().collect();
        let (edges, omitted) =
            collect_edges(&self.vertices, entries, |(pair, edge)| f(pair, edge));
        log_omitted::<SingleEdge>(omitted);
        Graph::from_parts(self.vertices.clone(), edges)
    }
}
