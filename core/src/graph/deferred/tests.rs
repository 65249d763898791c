use super::*;
use crate::util::example_graphs::{alternative_roads, dangling_roads, roads, towns};
use im::ordmap;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn road_network() -> DeferredGraph<u32, String, u32> {
    DeferredGraph::from_vertices_and_edges(towns(), roads())
}

fn small_graph() -> DeferredGraph<&'static str, i32, &'static str> {
    DeferredGraph::from_vertex_and_edge_streams(
        vec![("a", 1), ("b", 2)],
        vec![(PointPair::new("a", "b"), "e1")],
    )
}

#[test]
fn stream_duplication() {
    let g = small_graph();
    let mut first = g.vertices().iter();
    let mut second = g.vertices().iter();

    let mut collected_first = Vec::new();
    let mut collected_second = Vec::new();
    collected_second.push(second.next().unwrap().unwrap());
    collected_first.push(first.next().unwrap().unwrap());
    collected_first.push(first.next().unwrap().unwrap());
    collected_second.push(second.next().unwrap().unwrap());
    assert!(first.next().is_none());
    assert!(second.next().is_none());

    assert_eq!(vec![("a", 1), ("b", 2)], collected_first);
    assert_eq!(vec![("a", 1), ("b", 2)], collected_second);
}

#[test]
fn independent_pipelines_share_source() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let pulled_by_source = pulled.clone();
    let g: DeferredGraph<u32, String, u32> = DeferredGraph::from_vertex_and_edge_streams(
        towns().into_iter().map(move |entry| {
            pulled_by_source.fetch_add(1, Ordering::SeqCst);
            entry
        }),
        roads(),
    );

    let vertex_count = g.vertices().iter().count();
    let short_roads = g.filter_edges(|_, distance| *distance < 3);

    assert_eq!(4, vertex_count);
    assert_eq!(
        vec![(PointPair::new(2, 4), 2), (PointPair::new(4, 3), 1)],
        short_roads.edges().collect_vec().unwrap()
    );
    assert_eq!(4, pulled.load(Ordering::SeqCst));
}

#[test]
fn operations_are_lazy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_map = calls.clone();
    let g = road_network().map_vertices(move |_, name| {
        calls_in_map.fetch_add(1, Ordering::SeqCst);
        name.len()
    });
    let filtered = g.filter_vertices(|_, len| *len > 4);
    assert_eq!(0, calls.load(Ordering::SeqCst));

    assert_eq!(
        vec![(1, 6), (3, 5), (4, 6)],
        filtered.vertices().collect_vec().unwrap()
    );
    assert_eq!(4, calls.load(Ordering::SeqCst));

    // consuming again does not call the function again
    filtered.edges().collect_vec().unwrap();
    g.vertices().collect_vec().unwrap();
    assert_eq!(4, calls.load(Ordering::SeqCst));
}

#[test]
fn vertices_resolved_before_edges() {
    let predicate_calls = Arc::new(AtomicUsize::new(0));
    let calls_at_edge = Arc::new(std::sync::Mutex::new(Vec::new()));

    let observed_calls = predicate_calls.clone();
    let observations = calls_at_edge.clone();
    let g: DeferredGraph<u32, String, u32> = DeferredGraph::from_vertex_and_edge_streams(
        towns(),
        roads().into_iter().map(move |entry| {
            observations
                .lock()
                .unwrap()
                .push(observed_calls.load(Ordering::SeqCst));
            entry
        }),
    );

    let counting_calls = predicate_calls.clone();
    let filtered = g.filter_vertices(move |p, _| {
        counting_calls.fetch_add(1, Ordering::SeqCst);
        *p != 2
    });

    let edges = filtered.edges().collect_vec().unwrap();
    assert_eq!(3, edges.len());
    assert_eq!(vec![4; 5], *calls_at_edge.lock().unwrap());
}

#[test]
fn cascading_deletion() {
    let g = small_graph().filter_vertices(|p, _| *p == "a");
    assert_eq!(vec![("a", 1)], g.vertices().collect_vec().unwrap());
    assert!(g.edges().collect_vec().unwrap().is_empty());
}

#[test]
fn dangling_edges_are_left_out() {
    let g = road_network().put_all_edges(dangling_roads());
    assert_eq!(
        roads().into_iter().collect::<Vec<_>>(),
        g.edges().collect_vec().unwrap()
    );

    let g = small_graph();
    let same = g.put_edge("c", "a", "e2");
    assert_eq!(
        g.edges().collect_vec().unwrap(),
        same.edges().collect_vec().unwrap()
    );
}

#[test]
fn put_vertex_replaces_in_place() {
    let g = small_graph()
        .put_vertex("c", 3)
        .put_vertex("a", 10)
        .put_all_vertices(vec![("d", 4), ("b", 20), ("d", 40)]);
    assert_eq!(
        vec![("a", 10), ("b", 20), ("c", 3), ("d", 40)],
        g.vertices().collect_vec().unwrap()
    );
    assert_eq!(1, g.edges().collect_vec().unwrap().len());
}

#[test]
fn put_edge_after_put_vertex() {
    let g = small_graph().put_vertex("c", 3).put_edge("b", "c", "e2");
    assert_eq!(
        vec![
            (PointPair::new("a", "b"), "e1"),
            (PointPair::new("b", "c"), "e2")
        ],
        g.edges().collect_vec().unwrap()
    );
}

#[test]
fn edge_sets_are_flattened() {
    let g = DeferredGraph::from_vertices_and_edge_sets(towns(), alternative_roads());
    assert_eq!(8, g.edges().collect_vec().unwrap().len());
    assert_eq!(
        MultiEdgeGraph::from_vertices_and_edge_sets(towns(), alternative_roads()),
        g.to_multi_edge().unwrap()
    );
    assert_eq!(Some(&9), g.to_single_edge().unwrap().edge(&3, &1));
}

#[test]
fn map_and_flat_map_edges() {
    let g = road_network()
        .map_edges(|_, distance| distance * 1000)
        .flat_map_edges(|pair, distance| vec![(pair.inverse(), *distance), (PointPair::new(9, 9), 0)]);
    let single = g.to_single_edge().unwrap();
    assert_eq!(5, single.edge_count());
    assert_eq!(Some(&5000), single.edge(&2, &1));
}

#[test]
fn flat_map_vertices_cascades() {
    let g = road_network().flat_map_vertices(|p, name| {
        if *p == 1 {
            vec![]
        } else {
            vec![(*p, name.clone()), (p + 10, name.clone())]
        }
    });
    assert_eq!(6, g.vertices().collect_vec().unwrap().len());
    assert_eq!(
        vec![(PointPair::new(2, 4), 2), (PointPair::new(4, 3), 1)],
        g.edges().collect_vec().unwrap()
    );
}

#[test]
fn materialize_last_write_wins() {
    let g = DeferredGraph::new()
        .put_all_vertices(vec![(1, "a"), (2, "b")])
        .put_edge(1, 2, 1)
        .put_edge(1, 2, 2);
    let single = g.to_single_edge().unwrap();
    assert_eq!(&ordmap! {PointPair::new(1, 2) => 2}, single.edges());
    let multi = g.to_multi_edge().unwrap();
    assert_eq!(2, multi.edge_count());
}

#[test]
fn convert_from_materialized() {
    let single = SingleEdgeGraph::from_vertices_and_edges(towns(), roads());
    assert_eq!(single, single.to_deferred().to_single_edge().unwrap());

    let multi = MultiEdgeGraph::from_vertices_and_edge_sets(towns(), alternative_roads());
    assert_eq!(multi, multi.to_deferred().to_multi_edge().unwrap());
}

#[test]
fn thousands_of_puts() {
    let mut g: DeferredGraph<u32, u32, u32> = DeferredGraph::new();
    for i in 0..5000u32 {
        g = g.put_vertex(i, i);
        if i > 0 {
            g = g.put_edge(i - 1, i, i);
        }
    }
    assert_eq!(5000, g.vertices().iter().count());
    let edges = g.edges().collect_vec().unwrap();
    assert_eq!(4999, edges.len());
    assert_eq!(Some(&(PointPair::new(4998, 4999), 4999)), edges.last());

    let single = g.to_single_edge().unwrap();
    assert_eq!(5000, single.vertex_count());
    assert_eq!(Some(&17), single.edge(&16, &17));
}

#[test]
fn repeated_puts_of_one_point() {
    let mut g = small_graph();
    for i in 0..3000 {
        g = g.put_vertex("a", i);
    }
    assert_eq!(
        vec![("a", 2999), ("b", 2)],
        g.vertices().collect_vec().unwrap()
    );
    assert_eq!(1, g.edges().collect_vec().unwrap().len());
}

#[test]
fn edge_put_before_its_vertex_stays_out() {
    let g = small_graph().put_edge("a", "c", "e2").put_vertex("c", 3);
    assert_eq!(
        vec![(PointPair::new("a", "b"), "e1")],
        g.edges().collect_vec().unwrap()
    );

    let g = g.put_edge("a", "c", "e3");
    assert_eq!(
        vec![
            (PointPair::new("a", "b"), "e1"),
            (PointPair::new("a", "c"), "e3")
        ],
        g.edges().collect_vec().unwrap()
    );
}

#[test]
fn pending_edges_survive_vertex_transformations() {
    let g = small_graph()
        .put_edge("b", "c", "e2")
        .put_vertex("c", 3)
        .map_vertices(|_, v| v * 10)
        .put_edge("c", "a", "e3");
    assert_eq!(
        vec![("a", 10), ("b", 20), ("c", 30)],
        g.vertices().collect_vec().unwrap()
    );
    assert_eq!(
        vec![
            (PointPair::new("a", "b"), "e1"),
            (PointPair::new("c", "a"), "e3")
        ],
        g.edges().collect_vec().unwrap()
    );
}

#[test]
fn flat_map_vertices_keeps_one_entry_per_point() {
    let g = small_graph().flat_map_vertices(|p, v| vec![(*p, *v), (*p, v * 100), ("z", *v)]);
    assert_eq!(
        vec![("a", 100), ("z", 2), ("b", 200)],
        g.vertices().collect_vec().unwrap()
    );
    assert_eq!(1, g.edges().collect_vec().unwrap().len());

    let only_small = g.filter_vertices(|_, v| *v < 100);
    assert_eq!(vec![("z", 2)], only_small.vertices().collect_vec().unwrap());
    assert!(only_small.edges().collect_vec().unwrap().is_empty());
}

#[test]
fn vertex_streams_with_repeated_points() {
    let g: DeferredGraph<&str, i32, &str> = DeferredGraph::from_vertex_and_edge_streams(
        vec![("a", 1), ("b", 2), ("a", 3)],
        vec![(PointPair::new("b", "a"), "e1")],
    );
    assert_eq!(
        vec![("a", 3), ("b", 2)],
        g.vertices().collect_vec().unwrap()
    );
    assert_eq!(Some(&3), g.to_multi_edge().unwrap().vertex(&"a"));
}
