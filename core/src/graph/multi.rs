use im::{OrdMap, OrdSet};

use super::{
    bulk,
    cardinality::{self, CardinalityAdapter, ManyToMany, ManyToOne},
    log_omitted, DeferredGraph, Graph, GraphTemplate, MultiEdge, SingleEdgeGraph,
};
use crate::{
    types::{EdgePayload, Payload, Point, PointPair},
    util::{endpoints_present, parallel},
};

/// Group all individual edges produced by `expand` into sets per pair,
/// leaving out every edge with a missing endpoint. Returns the grouped edges
/// and the number of left out edges.
fn regroup<P, V, E, T, I, F>(
    vertices: &OrdMap<P, V>,
    items: Vec<T>,
    expand: F,
) -> (OrdMap<PointPair<P>, OrdSet<E>>, usize)
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
        |(mut acc, mut omitted): (OrdMap<PointPair<P>, OrdSet<E>>, usize), item| {
            for (pair, edge) in expand(item) {
                if endpoints_present(vertices, &pair) {
                    let mut set = acc.remove(&pair).unwrap_or_else(OrdSet::new);
                    set.insert(edge);
                    acc.insert(pair, set);
                } else {
                    trace!("leaving out edge {:?} with a missing endpoint", pair);
                    omitted += 1;
                }
            }
            (acc, omitted)
        },
        |(left, left_omitted), (right, right_omitted)| {
            (bulk::union_sets(left, right), left_omitted + right_omitted)
        },
    )
}

/// All individual edges of `edge_sets` as entries of a flat list.
fn flatten<P: Point, E: EdgePayload>(
    edge_sets: &OrdMap<PointPair<P>, OrdSet<E>>,
) -> Vec<(&PointPair<P>, &E)> {
    edge_sets
        .iter()
        .flat_map(|(pair, set)| set.iter().map(move |edge| (pair, edge)))
        .collect()
}

impl<P: Point, V: Payload, E: EdgePayload> Graph<P, V, E, MultiEdge> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Graph::from_parts(OrdMap::new(), OrdMap::new())
    }

    pub fn vertices(&self) -> &OrdMap<P, V> {
        &self.vertices
    }

    pub fn edge_sets(&self) -> &OrdMap<PointPair<P>, OrdSet<E>> {
        &self.edges
    }

    pub fn vertex(&self, point: &P) -> Option<&V> {
        self.vertices.get(point)
    }

    pub fn contains_vertex(&self, point: &P) -> bool {
        self.vertices.contains_key(point)
    }

    /// The edges from `source` to `target`. Pairs without edges have no set.
    pub fn edge_set(&self, source: &P, target: &P) -> Option<&OrdSet<E>> {
        self.edges
            .get(&PointPair::new(source.clone(), target.clone()))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of individual edges over all pairs.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|set| set.len()).sum()
    }

    /// Like [`put_all_edge_sets`](GraphTemplate::put_all_edge_sets), but
    /// also returns the number of individual edges that were left out because
    /// of a missing endpoint.
    pub fn put_all_edge_sets_counted<I>(&self, edge_sets: I) -> (Self, usize)
    where
        I: IntoIterator<Item = (PointPair<P>, OrdSet<E>)>,
    {
        let entries: Vec<(PointPair<P>, OrdSet<E>)> = edge_sets.into_iter().collect();
        let (added, omitted) = regroup(&self.vertices, entries, |(pair, set)| {
            set.into_iter().map(move |edge| (pair.clone(), edge))
        });
        let edges = bulk::union_sets(self.edges.clone(), added);
        (Graph::from_parts(self.vertices.clone(), edges), omitted)
    }

    /// Convert into the single-edge representation, keeping the greatest
    /// edge of each set.
    pub fn to_single_edge(&self) -> SingleEdgeGraph<P, V, E> {
        let edges = ManyToOne::adapt(&self.vertices, self.edges.clone());
        Graph::from_parts(self.vertices.clone(), edges)
    }

    /// Convert into the deferred representation, each individual edge
    /// becomes one element of the edge stream.
    pub fn to_deferred(&self) -> DeferredGraph<P, V, E> {
        let edges: Vec<(PointPair<P>, E)> = flatten(&self.edges)
            .into_iter()
            .map(|(pair, edge)| (pair.clone(), edge.clone()))
            .collect();
        DeferredGraph::from_vertex_and_edge_streams(
            self.vertices.clone().into_iter().collect::<Vec<_>>(),
            edges,
        )
    }
}

impl<P: Point, V: Payload, E: EdgePayload> Default for Graph<P, V, E, MultiEdge> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Point, V: Payload, E: EdgePayload> GraphTemplate<P, V, E> for Graph<P, V, E, MultiEdge> {
    type WithVertices<V2: Payload> = Graph<P, V2, E, MultiEdge>;
    type WithEdges<E2: EdgePayload> = Graph<P, V, E2, MultiEdge>;

    fn from_vertices_and_edges(vertices: OrdMap<P, V>, edges: OrdMap<PointPair<P>, E>) -> Self {
        let (edge_sets, omitted) = cardinality::one_to_many(&vertices, edges);
        log_omitted::<MultiEdge>(omitted);
        Graph::from_parts(vertices, edge_sets)
    }

    fn from_vertices_and_edge_sets(
        vertices: OrdMap<P, V>,
        edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
    ) -> Self {
        let (edge_sets, omitted) = ManyToMany::adapt_counted(&vertices, edge_sets);
        log_omitted::<MultiEdge>(omitted);
        Graph::from_parts(vertices, edge_sets)
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
        let (edge_sets, omitted) = regroup(&vertices, entries, std::iter::once);
        log_omitted::<MultiEdge>(omitted);
        Graph::from_parts(vertices, edge_sets)
    }

    fn put_vertex(&self, point: P, vertex: V) -> Self {
        Graph::from_parts(self.vertices.update(point, vertex), self.edges.clone())
    }

    fn put_edge(&self, source: P, target: P, edge: E) -> Self {
        let pair = PointPair::new(source, target);
        if !endpoints_present(&self.vertices, &pair) {
            trace!("leaving out edge {:?} with a missing endpoint", pair);
            return self.clone();
        }
        let set = self
            .edges
            .get(&pair)
            .map(|set| set.update(edge.clone()))
            .unwrap_or_else(|| OrdSet::unit(edge));
        Graph::from_parts(self.vertices.clone(), self.edges.update(pair, set))
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
        let (result, omitted) = self.put_all_edge_sets_counted(
            edges
                .into_iter()
                .map(|(pair, edge)| (pair, OrdSet::unit(edge))),
        );
        log_omitted::<MultiEdge>(omitted);
        result
    }

    fn put_all_edge_sets<I>(&self, edge_sets: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, OrdSet<E>)>,
        I::IntoIter: Send + 'static,
    {
        let (result, omitted) = self.put_all_edge_sets_counted(edge_sets);
        log_omitted::<MultiEdge>(omitted);
        result
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
        let (edges, _) = regroup(&self.vertices, flatten(&self.edges), |(pair, edge)| {
            if predicate(pair, edge) {
                Some((pair.clone(), edge.clone()))
            } else {
                None
            }
        });
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
        let (edges, _) = regroup(&self.vertices, flatten(&self.edges), |(pair, edge)| {
            std::iter::once((pair.clone(), f(pair, edge)))
        });
        Graph::from_parts(self.vertices.clone(), edges)
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
        let (edges, omitted) =
            regroup(&self.vertices, flatten(&self.edges), |(pair, edge)| f(pair, edge));
        log_omitted::<MultiEdge>(omitted);
        Graph::from_parts(self.vertices.clone(), edges)
    }
}
