use super::*;

use crate::ConjugateGraph;
use crate::internal;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use std::sync::atomic::{AtomicUsize, Ordering};

//-----------------------------------------------------------------------------

// A random graph where some vertex pairs have been deleted.
fn sparse_graph(seed: u64) -> ConjugateGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = internal::random_graph(3, 30, 40, &mut rng);
    let vertices: Vec<VertexId> = graph.canonical_vertices().collect();
    for vertex in vertices {
        if graph.is_isolated(vertex) || rng.gen_bool(0.1) {
            let edges: Vec<EdgeId> = graph.outgoing_edges(vertex).iter()
                .chain(graph.outgoing_edges(graph.conjugate(vertex)).iter())
                .copied()
                .collect();
            for edge in edges {
                // A hairpin edge may already be gone as the conjugate of another one.
                if graph.contains_edge(edge) {
                    graph.delete_edge(edge);
                }
            }
            graph.delete_vertex(vertex);
        }
    }
    graph
}

fn check_vertex_chunks<V: VertexData>(helper: &ParallelIterationHelper<V>, graph: &GraphCore<V>, n: usize) {
    let chunks = helper.vertex_chunks(n);
    let total = graph.size();
    assert_eq!(chunks.len(), n + 1, "Wrong number of boundaries for {} chunks", n);
    assert_eq!(chunks[n], VertexCursor::End, "The last boundary is not the end for {} chunks", n);
    match graph.vertices().next() {
        Some(first) => assert_eq!(chunks[0], VertexCursor::At(first), "The first boundary is not the first vertex for {} chunks", n),
        None => assert_eq!(chunks[0], VertexCursor::End, "Non-empty chunk in an empty graph"),
    }

    let mut found: Vec<VertexId> = Vec::new();
    for (i, bounds) in chunks.windows(2).enumerate() {
        assert!(bounds[0] <= bounds[1], "Boundaries {} and {} are not in order for {} chunks", i, i + 1, n);
        let chunk: Vec<VertexId> = helper.vertices_between(bounds[0], bounds[1]).collect();
        let expected_len = if i == 0 { total / n + total % n } else { total / n };
        assert_eq!(chunk.len(), expected_len, "Wrong size for chunk {} of {}", i, n);
        found.extend(chunk);
    }
    let expected: Vec<VertexId> = graph.vertices().collect();
    assert_eq!(found, expected, "Chunks do not partition the vertices for {} chunks", n);
}

//-----------------------------------------------------------------------------

#[test]
fn vertex_chunks_partition() {
    let graph = sparse_graph(21);
    let helper = ParallelIterationHelper::new(graph.core());
    assert!(graph.size() > 10, "The test graph is too small");
    for n in 1..=graph.size() {
        check_vertex_chunks(&helper, graph.core(), n);
    }
}

#[test]
fn more_chunks_than_vertices() {
    let mut graph: ConjugateGraph = ConjugateGraph::new(2);
    graph.add_vertex(());
    graph.add_vertex(());
    let helper = ParallelIterationHelper::new(graph.core());
    for n in [5, 8, 100] {
        check_vertex_chunks(&helper, graph.core(), n);
        let chunks = helper.vertex_chunks(n);
        assert!(chunks[1..].iter().all(|cursor| *cursor == VertexCursor::End), "Trailing chunks should be empty for {} chunks", n);
    }
}

#[test]
fn empty_graph() {
    let graph: ConjugateGraph = ConjugateGraph::new(2);
    let helper = ParallelIterationHelper::new(graph.core());
    check_vertex_chunks(&helper, graph.core(), 4);
    assert_eq!(helper.edge_chunks(4, false), vec![EdgeCursor::END; 5], "Wrong edge chunks for an empty graph");
    assert_eq!(helper.process_vertices(4, |_| ()), 0, "Processed vertices in an empty graph");
    assert_eq!(helper.process_edges(4, true, |_| ()), 0, "Processed edges in an empty graph");
}

#[test]
#[should_panic]
fn zero_chunks() {
    let graph: ConjugateGraph = ConjugateGraph::new(2);
    let helper = ParallelIterationHelper::new(graph.core());
    let _ = helper.vertex_chunks(0);
}

//-----------------------------------------------------------------------------

#[test]
fn edge_chunks_partition() {
    let graph = sparse_graph(22);
    let helper = ParallelIterationHelper::new(graph.core());
    for canonical_only in [false, true] {
        let mut expected: Vec<EdgeId> = graph.edges(canonical_only).collect();
        expected.sort();
        for n in [1, 2, 3, 7, 16, 100] {
            let chunks = helper.edge_chunks(n, canonical_only);
            assert_eq!(chunks.len(), n + 1, "Wrong number of edge boundaries for {} chunks", n);
            assert_eq!(chunks[n], EdgeCursor::END, "The last edge boundary is not the end for {} chunks", n);
            let mut found: Vec<EdgeId> = Vec::new();
            for bounds in chunks.windows(2) {
                assert!(bounds[0] <= bounds[1], "Edge boundaries are not in order for {} chunks", n);
                found.extend(helper.edges_between(bounds[0], bounds[1], canonical_only));
            }
            found.sort();
            assert_eq!(found, expected, "Edge chunks do not partition the edges (n = {}, canonical_only = {})", n, canonical_only);
        }
    }
}

#[test]
fn edge_boundaries_point_to_edges() {
    let graph = sparse_graph(23);
    let helper = ParallelIterationHelper::new(graph.core());
    for canonical_only in [false, true] {
        for cursor in helper.edge_chunks(5, canonical_only) {
            if let VertexCursor::At(vertex) = cursor.vertex {
                let edge = graph.outgoing_edges(vertex)[cursor.offset];
                assert!(!canonical_only || graph.is_canonical(edge), "Boundary {:?} points to a non-canonical edge", cursor);
            } else {
                assert_eq!(cursor, EdgeCursor::END, "Invalid end boundary {:?}", cursor);
            }
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn process_in_parallel() {
    let graph = sparse_graph(24);
    let helper = ParallelIterationHelper::new(graph.core());
    let core = graph.core();

    for threads in [1, 2, 4, 7] {
        let sum = AtomicUsize::new(0);
        let processed = helper.process_vertices(threads, |vertex| {
            sum.fetch_add(vertex.id(), Ordering::Relaxed);
        });
        let expected: usize = core.vertices().map(|vertex| vertex.id()).sum();
        assert_eq!(processed, core.size(), "Wrong number of processed vertices with {} threads", threads);
        assert_eq!(sum.into_inner(), expected, "Wrong vertex sum with {} threads", threads);

        let length = AtomicUsize::new(0);
        let processed = helper.process_edges(threads, true, |edge| {
            length.fetch_add(core.length(edge), Ordering::Relaxed);
        });
        let expected: usize = core.edges(true).map(|edge| core.length(edge)).sum();
        assert_eq!(processed, core.edge_count() / 2, "Wrong number of processed canonical edges with {} threads", threads);
        assert_eq!(length.into_inner(), expected, "Wrong total length with {} threads", threads);

        let processed = helper.process_edges(threads, false, |_| ());
        assert_eq!(processed, core.edge_count(), "Wrong number of processed edges with {} threads", threads);
    }
}

#[test]
#[should_panic]
fn worker_panic() {
    let graph = sparse_graph(25);
    let helper = ParallelIterationHelper::new(graph.core());
    helper.process_vertices(3, |vertex| {
        if vertex.id() % 2 == 0 {
            panic!("Worker failed at vertex {}", vertex);
        }
    });
}

//-----------------------------------------------------------------------------
