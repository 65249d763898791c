//! The deferred representation.
//!
//! Vertices and edges are [`Stream`]s and every operation only adds a lazy
//! stage on top of them. Nothing is computed until a consumer pulls from one
//! of the streams, and everything is computed at most once regardless of the
//! number of consumers.
//!
//! Edge streams are always filtered against the vertex stream of the same
//! graph. That filter first pulls the *complete* vertex stream into a set of
//! points and only then starts pulling edges.
//!
//! Puts are not stacked as stages. They are collected in persistent pending
//! maps next to the unchanged base streams, and the visible streams are
//! rebuilt from the base with one stage per side on every put.

use im::{OrdMap, OrdSet, Vector};
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    log_omitted, Deferred, DeferredGraph, Graph, GraphTemplate, MultiEdgeGraph, SingleEdgeGraph,
};
use crate::{
    errors::Result,
    stream::{Duplicate, Stream},
    types::{EdgePayload, Payload, Point, PointPair},
};

/// Vertex storage of a deferred graph.
///
/// Each pending vertex remembers the put sequence number at which its point
/// was first added.
#[derive(Clone)]
pub struct DeferredVertices<P: Point, V: Payload> {
    base: Stream<(P, V)>,
    pending: OrdMap<P, (u64, V)>,
    next_seq: u64,
    resolved: Stream<(P, V)>,
}

impl<P: Point, V: Payload> DeferredVertices<P, V> {
    fn new(base: Stream<(P, V)>) -> Self {
        DeferredVertices {
            resolved: base.clone(),
            base,
            pending: OrdMap::new(),
            next_seq: 0,
        }
    }

    fn upsert(&self, entries: impl IntoIterator<Item = (P, V)>) -> Self {
        let seq = self.next_seq;
        let mut pending = self.pending.clone();
        for (point, vertex) in entries {
            let since = pending.get(&point).map_or(seq, |(since, _)| *since);
            pending.insert(point, (since, vertex));
        }
        let overlay = pending.clone();
        let resolved = self.base.derive(move |existing| UpsertVertices {
            existing,
            pending: overlay,
            tail: None,
            failed: false,
        });
        DeferredVertices {
            base: self.base.clone(),
            pending,
            next_seq: seq + 1,
            resolved,
        }
    }

    fn advance(&self) -> Self {
        DeferredVertices {
            next_seq: self.next_seq + 1,
            ..self.clone()
        }
    }
}

impl<P: Point, V: Payload> std::fmt::Debug for DeferredVertices<P, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DeferredVertices")
            .field("pending", &self.pending.len())
            .field("resolved", &self.resolved)
            .finish()
    }
}

/// Edge storage of a deferred graph.
#[derive(Clone)]
pub struct DeferredEdges<P: Point, E: EdgePayload> {
    base: Stream<(PointPair<P>, E)>,
    /// Put edges tagged with the sequence number of their put.
    pending: Vector<(u64, PointPair<P>, E)>,
    resolved: Stream<(PointPair<P>, E)>,
}

impl<P: Point, E: EdgePayload> DeferredEdges<P, E> {
    fn new(base: Stream<(PointPair<P>, E)>) -> Self {
        DeferredEdges {
            resolved: base.clone(),
            base,
            pending: Vector::new(),
        }
    }

    fn append<V: Payload>(
        &self,
        vertices: &DeferredVertices<P, V>,
        entries: impl IntoIterator<Item = (PointPair<P>, E)>,
    ) -> Self {
        let seq = vertices.next_seq;
        let mut pending = self.pending.clone();
        for (pair, edge) in entries {
            pending.push_back((seq, pair, edge));
        }
        let added = PendingEdges {
            vertices: Some(vertices.base.iter()),
            overlay: vertices.pending.clone(),
            points: FxHashSet::default(),
            pending: pending.clone(),
            omitted: 0,
            failed: false,
        };
        let resolved = self.base.derive(move |existing| existing.chain(added));
        DeferredEdges {
            base: self.base.clone(),
            pending,
            resolved,
        }
    }
}

impl<P: Point, E: EdgePayload> std::fmt::Debug for DeferredEdges<P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DeferredEdges")
            .field("pending", &self.pending.len())
            .field("resolved", &self.resolved)
            .finish()
    }
}

fn collect_points<P: Point, V: Payload>(
    vertices: Duplicate<(P, V)>,
    points: &mut FxHashSet<P>,
) -> Result<()> {
    for entry in vertices {
        let (point, _) = entry?;
        points.insert(point);
    }
    trace!("collected {} points to filter edges", points.len());
    Ok(())
}

/// Edges whose endpoints both occur in a vertex stream.
struct ConnectedEdges<P: Point, V: Payload, E: EdgePayload> {
    /// Taken on the first call to `next`.
    vertices: Option<Duplicate<(P, V)>>,
    points: FxHashSet<P>,
    edges: Duplicate<(PointPair<P>, E)>,
    omitted: usize,
    failed: bool,
}

impl<P: Point, V: Payload, E: EdgePayload> Iterator for ConnectedEdges<P, V, E> {
    type Item = Result<(PointPair<P>, E)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(vertices) = self.vertices.take() {
            if let Err(e) = collect_points(vertices, &mut self.points) {
                self.failed = true;
                return Some(Err(e));
            }
        }
        for entry in self.edges.by_ref() {
            match entry {
                Ok((pair, edge)) => {
                    if self.points.contains(&pair.source) && self.points.contains(&pair.target) {
                        return Some(Ok((pair, edge)));
                    }
                    trace!("leaving out edge {:?} with a missing endpoint", pair);
                    self.omitted += 1;
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        log_omitted::<Deferred>(self.omitted);
        self.omitted = 0;
        None
    }
}

/// Restrict `edges` to the pairs whose endpoints occur in `vertices`.
fn connect<P: Point, V: Payload, E: EdgePayload>(
    vertices: &Stream<(P, V)>,
    edges: &Stream<(PointPair<P>, E)>,
) -> Stream<(PointPair<P>, E)> {
    let vertices = vertices.iter();
    edges.derive(move |edges| ConnectedEdges {
        vertices: Some(vertices),
        points: FxHashSet::default(),
        edges,
        omitted: 0,
        failed: false,
    })
}

/// The put edges whose endpoints were present when they were put.
///
/// A point counts as present for an edge if it is in the base vertex stream
/// or if it was first put with a smaller sequence number than the edge.
struct PendingEdges<P: Point, V: Payload, E: EdgePayload> {
    /// Taken on the first call to `next`.
    vertices: Option<Duplicate<(P, V)>>,
    overlay: OrdMap<P, (u64, V)>,
    points: FxHashSet<P>,
    pending: Vector<(u64, PointPair<P>, E)>,
    omitted: usize,
    failed: bool,
}

impl<P: Point, V: Payload, E: EdgePayload> PendingEdges<P, V, E> {
    fn present(&self, point: &P, seq: u64) -> bool {
        self.points.contains(point)
            || self
                .overlay
                .get(point)
                .map_or(false, |(since, _)| *since < seq)
    }
}

impl<P: Point, V: Payload, E: EdgePayload> Iterator for PendingEdges<P, V, E> {
    type Item = Result<(PointPair<P>, E)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(vertices) = self.vertices.take() {
            if let Err(e) = collect_points(vertices, &mut self.points) {
                self.failed = true;
                return Some(Err(e));
            }
        }
        while let Some((seq, pair, edge)) = self.pending.pop_front() {
            if self.present(&pair.source, seq) && self.present(&pair.target, seq) {
                return Some(Ok((pair, edge)));
            }
            trace!("leaving out edge {:?} with a missing endpoint", pair);
            self.omitted += 1;
        }
        log_omitted::<Deferred>(self.omitted);
        self.omitted = 0;
        None
    }
}

/// Replaces the vertices of an existing stream.
///
/// A replaced vertex keeps its position. Vertices for new points follow after
/// the existing ones, ordered by point.
struct UpsertVertices<P: Point, V: Payload> {
    existing: Duplicate<(P, V)>,
    pending: OrdMap<P, (u64, V)>,
    tail: Option<std::vec::IntoIter<(P, V)>>,
    failed: bool,
}

impl<P: Point, V: Payload> Iterator for UpsertVertices<P, V> {
    type Item = Result<(P, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.tail.is_none() {
            if let Some(entry) = self.existing.next() {
                return match entry {
                    Ok((point, vertex)) => match self.pending.remove(&point) {
                        Some((_, replacement)) => Some(Ok((point, replacement))),
                        None => Some(Ok((point, vertex))),
                    },
                    Err(e) => {
                        self.failed = true;
                        Some(Err(e))
                    }
                };
            }
            let added: Vec<(P, V)> = std::mem::take(&mut self.pending)
                .into_iter()
                .map(|(point, (_, vertex))| (point, vertex))
                .collect();
            self.tail = Some(added.into_iter());
        }
        self.tail.as_mut().and_then(|tail| tail.next()).map(Ok)
    }
}

/// Resolves repeated points of a vertex sequence.
///
/// The whole upstream is read on the first call to `next`. Each point is
/// emitted once, at the position of its first occurrence and with the vertex
/// of its last occurrence.
struct DistinctPoints<P: Point, V: Payload, I> {
    upstream: Option<I>,
    resolved: std::vec::IntoIter<(P, V)>,
}

impl<P, V, I> DistinctPoints<P, V, I>
where
    P: Point,
    V: Payload,
    I: Iterator<Item = Result<(P, V)>>,
{
    fn new(upstream: I) -> Self {
        DistinctPoints {
            upstream: Some(upstream),
            resolved: Vec::new().into_iter(),
        }
    }

    fn resolve(upstream: I) -> Result<Vec<(P, V)>> {
        let mut entries: Vec<(P, V)> = Vec::new();
        let mut index: FxHashMap<P, usize> = FxHashMap::default();
        for entry in upstream {
            let (point, vertex) = entry?;
            if let Some(&i) = index.get(&point) {
                entries[i].1 = vertex;
            } else {
                index.insert(point.clone(), entries.len());
                entries.push((point, vertex));
            }
        }
        Ok(entries)
    }
}

impl<P, V, I> Iterator for DistinctPoints<P, V, I>
where
    P: Point,
    V: Payload,
    I: Iterator<Item = Result<(P, V)>>,
{
    type Item = Result<(P, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(upstream) = self.upstream.take() {
            match Self::resolve(upstream) {
                Ok(entries) => self.resolved = entries.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        self.resolved.next().map(Ok)
    }
}

fn flatten_edge_sets<P: Point, E: EdgePayload>(
    edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
) -> Vec<(PointPair<P>, E)> {
    edge_sets
        .into_iter()
        .flat_map(|(pair, set)| set.into_iter().map(move |edge| (pair.clone(), edge)))
        .collect()
}

fn assemble<P: Point, V: Payload, E: EdgePayload>(
    vertices: Stream<(P, V)>,
    edges: Stream<(PointPair<P>, E)>,
) -> DeferredGraph<P, V, E> {
    Graph::from_parts(DeferredVertices::new(vertices), DeferredEdges::new(edges))
}

impl<P: Point, V: Payload, E: EdgePayload> Graph<P, V, E, Deferred> {
    /// Create an empty graph.
    pub fn new() -> Self {
        assemble(Stream::empty(), Stream::empty())
    }

    /// All vertices, one entry per point.
    pub fn vertices(&self) -> &Stream<(P, V)> {
        &self.vertices.resolved
    }

    /// All individual edges. A pair can occur more than once.
    pub fn edges(&self) -> &Stream<(PointPair<P>, E)> {
        &self.edges.resolved
    }

    /// Pull both streams and materialize them in the single-edge
    /// representation. Later entries for the same key replace earlier ones.
    pub fn to_single_edge(&self) -> Result<SingleEdgeGraph<P, V, E>> {
        let vertices: OrdMap<P, V> = self.vertices().iter().collect::<Result<_>>()?;
        let edges = self.edges().collect_vec()?;
        Ok(SingleEdgeGraph::from_vertex_and_edge_streams(vertices, edges))
    }

    /// Pull both streams and materialize them in the multi-edge
    /// representation.
    pub fn to_multi_edge(&self) -> Result<MultiEdgeGraph<P, V, E>> {
        let vertices: OrdMap<P, V> = self.vertices().iter().collect::<Result<_>>()?;
        let edges = self.edges().collect_vec()?;
        Ok(MultiEdgeGraph::from_vertex_and_edge_streams(vertices, edges))
    }
}

impl<P: Point, V: Payload, E: EdgePayload> Default for Graph<P, V, E, Deferred> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Point, V: Payload, E: EdgePayload> GraphTemplate<P, V, E> for Graph<P, V, E, Deferred> {
    type WithVertices<V2: Payload> = Graph<P, V2, E, Deferred>;
    type WithEdges<E2: EdgePayload> = Graph<P, V, E2, Deferred>;

    fn from_vertices_and_edges(vertices: OrdMap<P, V>, edges: OrdMap<PointPair<P>, E>) -> Self {
        Self::from_vertex_and_edge_streams(vertices, edges)
    }

    fn from_vertices_and_edge_sets(
        vertices: OrdMap<P, V>,
        edge_sets: OrdMap<PointPair<P>, OrdSet<E>>,
    ) -> Self {
        Self::from_vertex_and_edge_streams(vertices, flatten_edge_sets(edge_sets))
    }

    fn from_vertex_and_edge_streams<VI, EI>(vertices: VI, edges: EI) -> Self
    where
        VI: IntoIterator<Item = (P, V)>,
        VI::IntoIter: Send + 'static,
        EI: IntoIterator<Item = (PointPair<P>, E)>,
        EI::IntoIter: Send + 'static,
    {
        let vertices = Stream::from_results(DistinctPoints::new(vertices.into_iter().map(Ok)));
        let edges = connect(&vertices, &Stream::new(edges));
        assemble(vertices, edges)
    }

    /// The vertices are read immediately and kept pending until one of the
    /// streams is consumed.
    fn put_all_vertices<I>(&self, vertices: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        I::IntoIter: Send + 'static,
    {
        Graph::from_parts(self.vertices.upsert(vertices), self.edges.clone())
    }

    /// The edges are read immediately. Whether an endpoint is present is
    /// decided for the graph at the time of this call, but only checked when
    /// the edge stream is consumed.
    fn put_all_edges<I>(&self, edges: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, E)>,
        I::IntoIter: Send + 'static,
    {
        let edges = self.edges.append(&self.vertices, edges);
        Graph::from_parts(self.vertices.advance(), edges)
    }

    fn put_all_edge_sets<I>(&self, edge_sets: I) -> Self
    where
        I: IntoIterator<Item = (PointPair<P>, OrdSet<E>)>,
        I::IntoIter: Send + 'static,
    {
        self.put_all_edges(
            edge_sets
                .into_iter()
                .flat_map(|(pair, set)| set.into_iter().map(move |edge| (pair.clone(), edge))),
        )
    }

    fn filter_vertices<F>(&self, predicate: F) -> Self
    where
        F: Fn(&P, &V) -> bool + Send + Sync + 'static,
    {
        let vertices = self
            .vertices()
            .filter(move |(point, vertex)| predicate(point, vertex));
        let edges = connect(&vertices, self.edges());
        assemble(vertices, edges)
    }

    fn filter_edges<F>(&self, predicate: F) -> Self
    where
        F: Fn(&PointPair<P>, &E) -> bool + Send + Sync + 'static,
    {
        let edges = self.edges().filter(move |(pair, edge)| predicate(pair, edge));
        Graph::from_parts(self.vertices.clone(), DeferredEdges::new(edges))
    }

    fn map_vertices<V2, F>(&self, f: F) -> Self::WithVertices<V2>
    where
        V2: Payload,
        F: Fn(&P, &V) -> V2 + Send + Sync + 'static,
    {
        let vertices = self.vertices().map(move |(point, vertex)| {
            let mapped = f(&point, &vertex);
            (point, mapped)
        });
        assemble(vertices, self.edges().clone())
    }

    fn map_edges<E2, F>(&self, f: F) -> Self::WithEdges<E2>
    where
        E2: EdgePayload,
        F: Fn(&PointPair<P>, &E) -> E2 + Send + Sync + 'static,
    {
        let edges = self.edges().map(move |(pair, edge)| {
            let mapped = f(&pair, &edge);
            (pair, mapped)
        });
        Graph::from_parts(self.vertices.clone(), DeferredEdges::new(edges))
    }

    fn flat_map_vertices<V2, I, F>(&self, f: F) -> Self::WithVertices<V2>
    where
        V2: Payload,
        I: IntoIterator<Item = (P, V2)>,
        I::IntoIter: Send + 'static,
        F: Fn(&P, &V) -> I + Send + Sync + 'static,
    {
        let vertices = self.vertices().derive(move |it| {
            DistinctPoints::new(
                it.map_ok(move |(point, vertex)| f(&point, &vertex).into_iter())
                    .flatten_ok(),
            )
        });
        let edges = connect(&vertices, self.edges());
        assemble(vertices, edges)
    }

    fn flat_map_edges<E2, I, F>(&self, f: F) -> Self::WithEdges<E2>
    where
        E2: EdgePayload,
        I: IntoIterator<Item = (PointPair<P>, E2)>,
        I::IntoIter: Send + 'static,
        F: Fn(&PointPair<P>, &E) -> I + Send + Sync + 'static,
    {
        let expanded = self.edges().flat_map(move |(pair, edge)| f(&pair, &edge));
        let edges = connect(self.vertices(), &expanded);
        Graph::from_parts(self.vertices.clone(), DeferredEdges::new(edges))
    }
}

#[cfg(test)]
mod tests;
