use crate::{ActionHandler, ConjugateGraph, EdgeId, GraphCore, HandlerLevel, RestoredIds, VertexData, VertexId};

use rand::Rng;
use rand::rngs::StdRng;

use std::cell::RefCell;
use std::rc::Rc;

//-----------------------------------------------------------------------------

// Graph builders.

pub(crate) fn random_sequence(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

// A path of edges with the given lengths over a random sequence, so that consecutive edges overlap by `k` bases.
// Returns the graph, the vertices on the path, and the edges.
pub(crate) fn path_graph(k: usize, lengths: &[usize], rng: &mut StdRng) -> (ConjugateGraph, Vec<VertexId>, Vec<EdgeId>) {
    let total: usize = lengths.iter().sum();
    let sequence = random_sequence(rng, total + k);

    let mut graph = ConjugateGraph::new(k);
    let mut vertices = vec![graph.add_vertex(())];
    let mut edges = Vec::new();
    let mut offset = 0;
    for len in lengths.iter() {
        let next = graph.add_vertex(());
        let edge = graph.add_edge(*vertices.last().unwrap(), next, &sequence[offset..offset + len + k]);
        vertices.push(next);
        edges.push(edge);
        offset += len;
    }

    (graph, vertices, edges)
}

// A random graph with the given numbers of vertex pairs and edge pairs.
// Edges may start or end at either half of a vertex pair.
pub(crate) fn random_graph(k: usize, vertex_pairs: usize, edge_pairs: usize, rng: &mut StdRng) -> ConjugateGraph {
    let mut graph = ConjugateGraph::new(k);
    let mut vertices = Vec::with_capacity(2 * vertex_pairs);
    for _ in 0..vertex_pairs {
        let vertex = graph.add_vertex(());
        vertices.push(vertex);
        vertices.push(graph.conjugate(vertex));
    }
    if vertices.is_empty() {
        return graph;
    }
    for _ in 0..edge_pairs {
        let from = vertices[rng.gen_range(0..vertices.len())];
        let to = vertices[rng.gen_range(0..vertices.len())];
        let len = rng.gen_range(1..20);
        let sequence = random_sequence(rng, len + k);
        graph.add_edge(from, to, &sequence);
    }
    graph
}

//-----------------------------------------------------------------------------

// Graph comparisons.

// Checks that the restored graph has the same elements as the original under the mappings.
pub(crate) fn check_restored<V: VertexData>(original: &GraphCore<V>, restored: &GraphCore<V>, ids: &RestoredIds) {
    assert_eq!(restored.size(), original.size(), "Wrong number of vertices");
    assert_eq!(restored.edge_count(), original.edge_count(), "Wrong number of edges");
    assert_eq!(ids.vertices.len(), original.size(), "Wrong number of vertex mappings");
    assert_eq!(ids.edges.len(), original.edge_count(), "Wrong number of edge mappings");
    assert!(restored.max_id() >= original.max_id(), "Restored maximum identifier is too small");
    restored.check_invariants();

    for vertex in original.vertices() {
        let mapped = ids.vertices.get(vertex.id());
        assert_eq!(mapped, Some(vertex), "Wrong mapping for vertex {}", vertex);
        assert_eq!(restored.conjugate(vertex), original.conjugate(vertex), "Wrong conjugate for vertex {}", vertex);
        let mut expected: Vec<EdgeId> = original.outgoing_edges(vertex).to_vec();
        let mut found: Vec<EdgeId> = restored.outgoing_edges(vertex).to_vec();
        expected.sort();
        found.sort();
        assert_eq!(found, expected, "Wrong outgoing edges for vertex {}", vertex);
    }

    for edge in original.edges(false) {
        let mapped = ids.edges.get(edge.id());
        assert_eq!(mapped, Some(edge), "Wrong mapping for edge {}", edge);
        assert_eq!(restored.conjugate(edge), original.conjugate(edge), "Wrong conjugate for edge {}", edge);
        assert_eq!(restored.edge_start(edge), original.edge_start(edge), "Wrong start for edge {}", edge);
        assert_eq!(restored.edge_end(edge), original.edge_end(edge), "Wrong end for edge {}", edge);
        assert_eq!(restored.sequence(edge), original.sequence(edge), "Wrong sequence for edge {}", edge);
    }
}

//-----------------------------------------------------------------------------

// An observer that records the events it receives.

pub(crate) struct RecordingHandler {
    name: String,
    pub(crate) events: Vec<String>,
}

impl RecordingHandler {
    pub(crate) fn attach<V: VertexData>(graph: &ConjugateGraph<V>, name: &str, level: HandlerLevel) -> Rc<RefCell<Self>> {
        let handler = Rc::new(RefCell::new(RecordingHandler {
            name: name.to_string(),
            events: Vec::new(),
        }));
        graph.add_action_handler(&handler, level);
        handler
    }

    pub(crate) fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }
}

fn edge_list(edges: &[EdgeId]) -> String {
    let edges: Vec<String> = edges.iter().map(|edge| edge.to_string()).collect();
    edges.join(",")
}

impl<V: VertexData> ActionHandler<V> for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_add_vertex(&mut self, _graph: &ConjugateGraph<V>, vertex: VertexId) {
        self.events.push(format!("add {}", vertex));
    }

    fn handle_delete_vertex(&mut self, graph: &ConjugateGraph<V>, vertex: VertexId) {
        assert!(graph.contains_vertex(vertex), "Vertex {} was deleted before the event", vertex);
        self.events.push(format!("delete {}", vertex));
    }

    fn handle_add_edge(&mut self, graph: &ConjugateGraph<V>, edge: EdgeId) {
        assert!(graph.contains_edge(edge), "Edge {} was not created before the event", edge);
        self.events.push(format!("add {}", edge));
    }

    fn handle_delete_edge(&mut self, graph: &ConjugateGraph<V>, edge: EdgeId) {
        assert!(graph.contains_edge(edge), "Edge {} was deleted before the event", edge);
        self.events.push(format!("delete {}", edge));
    }

    fn handle_merge(&mut self, _graph: &ConjugateGraph<V>, old_edges: &[EdgeId], new_edge: EdgeId) {
        self.events.push(format!("merge {} -> {}", edge_list(old_edges), new_edge));
    }

    fn handle_glue(&mut self, _graph: &ConjugateGraph<V>, new_edge: EdgeId, edge1: EdgeId, edge2: EdgeId) {
        self.events.push(format!("glue {},{} -> {}", edge1, edge2, new_edge));
    }

    fn handle_split(&mut self, _graph: &ConjugateGraph<V>, old_edge: EdgeId, new_edge1: EdgeId, new_edge2: EdgeId) {
        self.events.push(format!("split {} -> {},{}", old_edge, new_edge1, new_edge2));
    }
}

//-----------------------------------------------------------------------------
