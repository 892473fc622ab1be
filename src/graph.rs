//! A conjugate-symmetric de Bruijn graph.
//!
//! Every vertex and every edge has a conjugate (reverse complement) counterpart, and conjugate pairs are always created and destroyed together.
//! If edge `e` goes from `u` to `v` with sequence `s`, its conjugate goes from `conjugate(v)` to `conjugate(u)` with the reverse complement of `s`.
//!
//! The graph is split into two layers:
//!
//! * [`GraphCore`] stores the elements and answers queries.
//!   It is `Sync` and can be shared between threads for read-only traversal.
//! * [`ConjugateGraph`] owns a core and a registry of [`ActionHandler`] observers.
//!   All structural edits go through it, and every edit is broadcast to the observers synchronously.
//!
//! Queries on [`GraphCore`] are available directly on [`ConjugateGraph`] through `Deref`.

use crate::handlers::{ActionHandler, HandlerId, HandlerLevel, HandlerRegistry};
use crate::ids::{EdgeId, IdAllocator, IdDistributor, ReservedIds, VertexId};
use crate::utils;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Deref, RangeBounds};
use std::rc::Rc;

use gbwt::support;


//-----------------------------------------------------------------------------

/// Payload stored in graph vertices.
///
/// The payload of the conjugate vertex is derived with [`VertexData::conjugate`].
/// New vertices created by graph operations (e.g. splitting an edge) use the default payload.
pub trait VertexData: Clone + Default + 'static {
    /// Returns the payload for the conjugate vertex.
    fn conjugate(&self) -> Self {
        self.clone()
    }
}

impl VertexData for () {}

/// A vertex or an edge identifier.
pub trait GraphElement: Copy + Ord + Hash + Debug + 'static {
    /// Returns the conjugate of this element in the graph.
    ///
    /// # Panics
    ///
    /// Panics if the element does not exist.
    fn conjugate_in<V: VertexData>(self, graph: &GraphCore<V>) -> Self;

    /// Returns `true` if the element exists in the graph.
    fn exists_in<V: VertexData>(self, graph: &GraphCore<V>) -> bool;
}

impl GraphElement for VertexId {
    fn conjugate_in<V: VertexData>(self, graph: &GraphCore<V>) -> Self {
        graph.vertex(self).conjugate
    }

    fn exists_in<V: VertexData>(self, graph: &GraphCore<V>) -> bool {
        graph.contains_vertex(self)
    }
}

impl GraphElement for EdgeId {
    fn conjugate_in<V: VertexData>(self, graph: &GraphCore<V>) -> Self {
        graph.edge(self).conjugate
    }

    fn exists_in<V: VertexData>(self, graph: &GraphCore<V>) -> bool {
        graph.contains_edge(self)
    }
}

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
struct Vertex<V> {
    data: V,
    conjugate: VertexId,
    // Outgoing edges in insertion order.
    outgoing: Vec<EdgeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Edge {
    start: VertexId,
    end: VertexId,
    conjugate: EdgeId,
    sequence: Vec<u8>,
}

/// Storage and queries for a conjugate-symmetric graph.
///
/// Vertices are iterated in increasing identifier order, and the outgoing edges of a vertex are iterated in insertion order.
/// The order is therefore deterministic for a given sequence of operations.
///
/// Queries panic if the element does not exist.
/// The incoming edges of a vertex are the conjugates of the outgoing edges of its conjugate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphCore<V> {
    k: usize,
    vertices: BTreeMap<VertexId, Vertex<V>>,
    edges: BTreeMap<EdgeId, Edge>,
    ids: IdAllocator,
}

/// Queries.
impl<V: VertexData> GraphCore<V> {
    fn new(k: usize) -> Self {
        GraphCore {
            k,
            vertices: BTreeMap::new(),
            edges: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }

    fn vertex(&self, vertex: VertexId) -> &Vertex<V> {
        match self.vertices.get(&vertex) {
            Some(v) => v,
            None => panic!("Vertex {} does not exist", vertex),
        }
    }

    fn edge(&self, edge: EdgeId) -> &Edge {
        match self.edges.get(&edge) {
            Some(e) => e,
            None => panic!("Edge {} does not exist", edge),
        }
    }

    /// Returns the order of the graph.
    ///
    /// Consecutive edges overlap by `k` bases.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the number of vertices, counting both halves of each conjugate pair.
    #[inline]
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of edges, counting both halves of each conjugate pair.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the largest identifier allocated so far.
    #[inline]
    pub fn max_id(&self) -> usize {
        self.ids.max_id()
    }

    /// Returns `true` if the vertex exists.
    #[inline]
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains_key(&vertex)
    }

    /// Returns `true` if the edge exists.
    #[inline]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains_key(&edge)
    }

    /// Returns `true` if a vertex or an edge uses the given integer identifier.
    pub fn contains_id(&self, id: usize) -> bool {
        self.contains_vertex(VertexId::new(id)) || self.contains_edge(EdgeId::new(id))
    }

    /// Returns the conjugate of a vertex or an edge.
    #[inline]
    pub fn conjugate<T: GraphElement>(&self, element: T) -> T {
        element.conjugate_in(self)
    }

    /// Returns `true` if the element is the canonical representative of its conjugate pair.
    ///
    /// The canonical element is the one with the smaller identifier.
    #[inline]
    pub fn is_canonical<T: GraphElement>(&self, element: T) -> bool {
        element <= self.conjugate(element)
    }

    /// Returns the payload of the vertex.
    pub fn data(&self, vertex: VertexId) -> &V {
        &self.vertex(vertex).data
    }

    /// Returns the start vertex of the edge.
    #[inline]
    pub fn edge_start(&self, edge: EdgeId) -> VertexId {
        self.edge(edge).start
    }

    /// Returns the end vertex of the edge.
    #[inline]
    pub fn edge_end(&self, edge: EdgeId) -> VertexId {
        self.edge(edge).end
    }

    /// Returns the sequence of the edge.
    pub fn sequence(&self, edge: EdgeId) -> &[u8] {
        &self.edge(edge).sequence
    }

    /// Returns the length of the edge in (k+1)-mers.
    pub fn length(&self, edge: EdgeId) -> usize {
        self.edge(edge).sequence.len() - self.k
    }

    /// Returns the outgoing edges of the vertex in insertion order.
    pub fn outgoing_edges(&self, vertex: VertexId) -> &[EdgeId] {
        &self.vertex(vertex).outgoing
    }

    /// Returns an iterator over the incoming edges of the vertex.
    pub fn incoming_edges(&self, vertex: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        let conjugate = self.conjugate(vertex);
        self.outgoing_edges(conjugate).iter().map(move |edge| self.conjugate(*edge))
    }

    /// Returns the number of outgoing edges.
    #[inline]
    pub fn out_degree(&self, vertex: VertexId) -> usize {
        self.vertex(vertex).outgoing.len()
    }

    /// Returns the number of incoming edges.
    #[inline]
    pub fn in_degree(&self, vertex: VertexId) -> usize {
        self.out_degree(self.conjugate(vertex))
    }

    /// Returns `true` if the vertex has no incident edges.
    pub fn is_isolated(&self, vertex: VertexId) -> bool {
        self.out_degree(vertex) == 0 && self.in_degree(vertex) == 0
    }

    /// Returns an iterator over all vertices in increasing identifier order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys().copied()
    }

    /// Returns an iterator over the vertices with identifiers in the given range.
    pub fn vertices_in<R: RangeBounds<VertexId>>(&self, range: R) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.range(range).map(|(vertex, _)| *vertex)
    }

    /// Returns an iterator over the canonical vertices in increasing identifier order.
    pub fn canonical_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().filter(|(id, v)| **id < v.conjugate).map(|(id, _)| *id)
    }

    /// Returns an iterator over all edges.
    ///
    /// The edges are listed by traversing the outgoing edges of each vertex.
    /// If `canonical_only` is set, only the canonical half of each conjugate pair is listed.
    pub fn edges(&self, canonical_only: bool) -> impl Iterator<Item = EdgeId> + '_ {
        self.vertices.values()
            .flat_map(|v| v.outgoing.iter().copied())
            .filter(move |edge| !canonical_only || self.is_canonical(*edge))
    }

    /// Checks the conjugate and adjacency invariants of the entire graph.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found.
    pub fn check_invariants(&self) {
        for (id, vertex) in self.vertices.iter() {
            assert_ne!(*id, vertex.conjugate, "Vertex {} is its own conjugate", id);
            let conjugate = self.vertices.get(&vertex.conjugate);
            assert!(conjugate.is_some(), "Conjugate {} of vertex {} does not exist", vertex.conjugate, id);
            assert_eq!(conjugate.unwrap().conjugate, *id, "Vertex conjugation is not an involution at {}", id);
            for edge in vertex.outgoing.iter() {
                assert!(self.contains_edge(*edge), "Vertex {} lists a missing edge {}", id, edge);
                assert_eq!(self.edge_start(*edge), *id, "Edge {} is listed at vertex {} but starts elsewhere", edge, id);
            }
        }

        for (id, edge) in self.edges.iter() {
            assert_ne!(*id, edge.conjugate, "Edge {} is its own conjugate", id);
            let conjugate = self.edges.get(&edge.conjugate);
            assert!(conjugate.is_some(), "Conjugate {} of edge {} does not exist", edge.conjugate, id);
            let conjugate = conjugate.unwrap();
            assert_eq!(conjugate.conjugate, *id, "Edge conjugation is not an involution at {}", id);
            assert!(self.contains_vertex(edge.start), "Edge {} starts at a missing vertex {}", id, edge.start);
            assert!(self.contains_vertex(edge.end), "Edge {} ends at a missing vertex {}", id, edge.end);
            assert_eq!(conjugate.start, self.conjugate(edge.end), "Conjugate of edge {} starts at a wrong vertex", id);
            assert_eq!(conjugate.end, self.conjugate(edge.start), "Conjugate of edge {} ends at a wrong vertex", id);
            assert_eq!(conjugate.sequence, support::reverse_complement(&edge.sequence), "Conjugate of edge {} has a wrong sequence", id);
            assert!(edge.sequence.len() > self.k, "Edge {} is too short for k = {}", id, self.k);
            let listed = self.outgoing_edges(edge.start).iter().filter(|x| **x == *id).count();
            assert_eq!(listed, 1, "Edge {} is listed {} times at its start vertex", id, listed);
            assert!(self.ids.max_id() >= id.id(), "Edge {} is beyond the maximum identifier", id);
        }
    }
}

//-----------------------------------------------------------------------------

/// Structural changes without notifications.
impl<V: VertexData> GraphCore<V> {
    // Takes a pair of identifiers from the distributor or from the internal allocator.
    fn take_pair(&mut self, ids: Option<&mut dyn IdDistributor>) -> (usize, usize) {
        let (id, conjugate) = match ids {
            Some(distributor) => {
                let id = distributor.next_id();
                (id, distributor.next_id())
            },
            None => (self.ids.next_id(), self.ids.next_id()),
        };
        assert!(id > 0 && conjugate > 0, "Identifier 0 is reserved");
        assert_ne!(id, conjugate, "An element cannot be its own conjugate");
        assert!(!self.contains_id(id), "Identifier {} is already in use", id);
        assert!(!self.contains_id(conjugate), "Identifier {} is already in use", conjugate);
        self.ids.record(id);
        self.ids.record(conjugate);
        (id, conjugate)
    }

    fn insert_vertex(&mut self, data: V, ids: Option<&mut dyn IdDistributor>) -> VertexId {
        let (id, conjugate) = self.take_pair(ids);
        let (id, conjugate) = (VertexId::new(id), VertexId::new(conjugate));
        let conjugate_data = data.conjugate();
        self.vertices.insert(id, Vertex { data, conjugate, outgoing: Vec::new() });
        self.vertices.insert(conjugate, Vertex { data: conjugate_data, conjugate: id, outgoing: Vec::new() });
        id
    }

    fn insert_edge(&mut self, from: VertexId, to: VertexId, sequence: Vec<u8>, ids: Option<&mut dyn IdDistributor>) -> EdgeId {
        assert!(self.contains_vertex(from), "Vertex {} does not exist", from);
        assert!(self.contains_vertex(to), "Vertex {} does not exist", to);
        assert!(sequence.len() > self.k, "Edge sequence of length {} is too short for k = {}", sequence.len(), self.k);

        let (id, conjugate) = self.take_pair(ids);
        let (id, conjugate) = (EdgeId::new(id), EdgeId::new(conjugate));
        let (conjugate_from, conjugate_to) = (self.conjugate(to), self.conjugate(from));
        let sequence = utils::normalize_sequence(&sequence);
        let conjugate_sequence = support::reverse_complement(&sequence);
        self.edges.insert(id, Edge { start: from, end: to, conjugate, sequence });
        self.edges.insert(conjugate, Edge { start: conjugate_from, end: conjugate_to, conjugate: id, sequence: conjugate_sequence });
        self.vertices.get_mut(&from).unwrap().outgoing.push(id);
        self.vertices.get_mut(&conjugate_from).unwrap().outgoing.push(conjugate);
        id
    }

    fn remove_edge(&mut self, edge: EdgeId) {
        let conjugate = self.conjugate(edge);
        for id in [edge, conjugate] {
            if let Some(removed) = self.edges.remove(&id) {
                let outgoing = &mut self.vertices.get_mut(&removed.start).unwrap().outgoing;
                outgoing.retain(|x| *x != id);
            }
        }
    }

    fn remove_vertex(&mut self, vertex: VertexId) {
        let conjugate = self.conjugate(vertex);
        self.vertices.remove(&vertex);
        self.vertices.remove(&conjugate);
    }
}

//-----------------------------------------------------------------------------

/// A conjugate-symmetric graph with observers.
///
/// Structural edits are broadcast to the registered [`ActionHandler`]s on the calling thread.
/// Each event is delivered for both halves of the conjugate pair: first for the element returned to the caller, then for its conjugate.
/// Creation events are delivered after the elements exist, and deletion events before the elements are removed.
///
/// Invariant violations are programming errors and cause a panic.
///
/// # Examples
///
/// ```
/// use cdbg_base::ConjugateGraph;
///
/// let mut graph: ConjugateGraph = ConjugateGraph::new(3);
/// let u = graph.add_vertex(());
/// let v = graph.add_vertex(());
/// let edge = graph.add_edge(u, v, b"GATTACA");
///
/// let conjugate = graph.conjugate(edge);
/// assert_eq!(graph.edge_start(conjugate), graph.conjugate(v));
/// assert_eq!(graph.edge_end(conjugate), graph.conjugate(u));
/// assert_eq!(graph.sequence(conjugate), b"TGTAATC");
/// assert_eq!(graph.length(edge), 4);
///
/// graph.delete_edge(edge);
/// assert_eq!(graph.edge_count(), 0);
/// ```
pub struct ConjugateGraph<V: VertexData = ()> {
    core: GraphCore<V>,
    handlers: HandlerRegistry<V>,
}

impl<V: VertexData> Deref for ConjugateGraph<V> {
    type Target = GraphCore<V>;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// Construction and observers.
impl<V: VertexData> ConjugateGraph<V> {
    /// Creates an empty graph of order `k`.
    pub fn new(k: usize) -> Self {
        ConjugateGraph {
            core: GraphCore::new(k),
            handlers: HandlerRegistry::new(),
        }
    }

    /// Returns the read-only core of the graph.
    ///
    /// The core can be shared between threads.
    #[inline]
    pub fn core(&self) -> &GraphCore<V> {
        &self.core
    }

    /// Registers an observer and returns an identifier for removing it.
    ///
    /// Handlers at [`HandlerLevel::High`] are notified before handlers at [`HandlerLevel::Low`].
    /// Within a level, handlers are notified in registration order.
    /// The graph keeps only a weak reference, and the handler is detached when the last strong reference is dropped.
    pub fn add_action_handler<H: ActionHandler<V> + 'static>(&self, handler: &Rc<RefCell<H>>, level: HandlerLevel) -> HandlerId {
        let handler: Rc<RefCell<dyn ActionHandler<V>>> = handler.clone();
        self.handlers.register(&handler, level)
    }

    /// Removes an observer.
    ///
    /// Returns `false` if the handler was not registered.
    /// This can be called from within another handler.
    /// A handler removed during an event will not receive the rest of that event.
    pub fn remove_action_handler(&self, handler: HandlerId) -> bool {
        self.handlers.remove(handler)
    }

    /// Returns the number of live registered observers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Returns the names of the live registered observers in notification order.
    pub fn handler_names(&self) -> Vec<String> {
        self.handlers.names()
    }

    /// Reserves identifiers up to `max_id` for restoring a graph.
    ///
    /// # Panics
    ///
    /// Panics if the graph is not empty.
    pub fn reserve_ids(&mut self, max_id: usize) -> ReservedIds {
        assert!(self.core.is_empty(), "Cannot reserve identifiers in a non-empty graph");
        self.core.ids = IdAllocator::new();
        self.core.ids.reserve(max_id)
    }
}

//-----------------------------------------------------------------------------

/// Notifications.
impl<V: VertexData> ConjugateGraph<V> {
    fn notify_add_vertex(&self, vertex: VertexId) {
        let conjugate = self.conjugate(vertex);
        self.handlers.dispatch(|handler| {
            handler.handle_add_vertex(self, vertex);
            handler.handle_add_vertex(self, conjugate);
        });
    }

    fn notify_delete_vertex(&self, vertex: VertexId) {
        let conjugate = self.conjugate(vertex);
        self.handlers.dispatch(|handler| {
            handler.handle_delete_vertex(self, vertex);
            handler.handle_delete_vertex(self, conjugate);
        });
    }

    fn notify_add_edge(&self, edge: EdgeId) {
        let conjugate = self.conjugate(edge);
        self.handlers.dispatch(|handler| {
            handler.handle_add_edge(self, edge);
            handler.handle_add_edge(self, conjugate);
        });
    }

    fn notify_delete_edge(&self, edge: EdgeId) {
        let conjugate = self.conjugate(edge);
        self.handlers.dispatch(|handler| {
            handler.handle_delete_edge(self, edge);
            handler.handle_delete_edge(self, conjugate);
        });
    }

    fn notify_merge(&self, old_edges: &[EdgeId], new_edge: EdgeId) {
        let conjugate_old: Vec<EdgeId> = old_edges.iter().rev().map(|edge| self.conjugate(*edge)).collect();
        let conjugate_new = self.conjugate(new_edge);
        self.handlers.dispatch(|handler| {
            handler.handle_merge(self, old_edges, new_edge);
            handler.handle_merge(self, &conjugate_old, conjugate_new);
        });
    }

    fn notify_glue(&self, new_edge: EdgeId, edge1: EdgeId, edge2: EdgeId) {
        let conjugates = (self.conjugate(new_edge), self.conjugate(edge1), self.conjugate(edge2));
        self.handlers.dispatch(|handler| {
            handler.handle_glue(self, new_edge, edge1, edge2);
            handler.handle_glue(self, conjugates.0, conjugates.1, conjugates.2);
        });
    }

    fn notify_split(&self, old_edge: EdgeId, new_edge1: EdgeId, new_edge2: EdgeId) {
        // The conjugate of the old edge is split into the conjugate of the second part followed by the conjugate of the first part.
        let conjugates = (self.conjugate(old_edge), self.conjugate(new_edge2), self.conjugate(new_edge1));
        self.handlers.dispatch(|handler| {
            handler.handle_split(self, old_edge, new_edge1, new_edge2);
            handler.handle_split(self, conjugates.0, conjugates.1, conjugates.2);
        });
    }
}

//-----------------------------------------------------------------------------

/// Structural edits.
impl<V: VertexData> ConjugateGraph<V> {
    /// Adds a vertex and its conjugate with fresh identifiers and returns the vertex.
    pub fn add_vertex(&mut self, data: V) -> VertexId {
        let vertex = self.core.insert_vertex(data, None);
        self.notify_add_vertex(vertex);
        vertex
    }

    /// Adds a vertex and its conjugate with identifiers from the given distributor.
    ///
    /// The first identifier is used for the returned vertex and the second one for its conjugate.
    ///
    /// # Panics
    ///
    /// Panics if an identifier is 0 or already in use.
    pub fn add_vertex_with(&mut self, data: V, ids: &mut dyn IdDistributor) -> VertexId {
        let vertex = self.core.insert_vertex(data, Some(ids));
        self.notify_add_vertex(vertex);
        vertex
    }

    /// Adds an edge and its conjugate with fresh identifiers and returns the edge.
    ///
    /// The sequence is stored as [`utils::normalize_sequence`] returns it: uppercase, with anything outside `ACGT` as `N`.
    ///
    /// # Panics
    ///
    /// Panics if either vertex does not exist or if the sequence is not longer than `k`.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, sequence: &[u8]) -> EdgeId {
        let edge = self.core.insert_edge(from, to, sequence.to_vec(), None);
        self.notify_add_edge(edge);
        edge
    }

    /// Adds an edge and its conjugate with identifiers from the given distributor.
    ///
    /// # Panics
    ///
    /// Panics if either vertex does not exist, if the sequence is not longer than `k`, or if an identifier is 0 or already in use.
    pub fn add_edge_with(&mut self, from: VertexId, to: VertexId, sequence: &[u8], ids: &mut dyn IdDistributor) -> EdgeId {
        let edge = self.core.insert_edge(from, to, sequence.to_vec(), Some(ids));
        self.notify_add_edge(edge);
        edge
    }

    /// Deletes an edge and its conjugate.
    ///
    /// # Panics
    ///
    /// Panics if the edge does not exist.
    pub fn delete_edge(&mut self, edge: EdgeId) {
        assert!(self.contains_edge(edge), "Cannot delete edge {}: it does not exist", edge);
        self.notify_delete_edge(edge);
        self.core.remove_edge(edge);
    }

    /// Deletes a vertex and its conjugate.
    ///
    /// # Panics
    ///
    /// Panics if the vertex does not exist or if it still has incident edges.
    pub fn delete_vertex(&mut self, vertex: VertexId) {
        assert!(self.contains_vertex(vertex), "Cannot delete vertex {}: it does not exist", vertex);
        assert!(self.is_isolated(vertex), "Cannot delete vertex {}: it has incident edges", vertex);
        self.notify_delete_vertex(vertex);
        self.core.remove_vertex(vertex);
    }

    /// Replaces a path of consecutive edges with a single edge and returns the new edge.
    ///
    /// The sequences are concatenated with `k`-base overlaps.
    /// The intermediate vertices are deleted.
    /// Observers receive the merge event first, then the new edge, then the deletions.
    ///
    /// # Panics
    ///
    /// Panics if the path is empty, if the edges are not consecutive, if an edge or its conjugate occurs twice, or if an intermediate vertex has other incident edges or coincides with an endpoint.
    pub fn merge_path(&mut self, path: &[EdgeId]) -> EdgeId {
        assert!(!path.is_empty(), "Cannot merge an empty path");
        let mut seen: HashSet<EdgeId> = HashSet::with_capacity(2 * path.len());
        for edge in path.iter() {
            assert!(self.contains_edge(*edge), "Cannot merge path: edge {} does not exist", edge);
            assert!(seen.insert(*edge), "Cannot merge path: edge {} occurs twice", edge);
            assert!(seen.insert(self.conjugate(*edge)), "Cannot merge path: edge {} and its conjugate both occur", edge);
        }

        let start = self.edge_start(path[0]);
        let end = self.edge_end(path[path.len() - 1]);
        let endpoints = [start, end, self.conjugate(start), self.conjugate(end)];
        let mut intermediate: Vec<VertexId> = Vec::with_capacity(path.len() - 1);
        for window in path.windows(2) {
            let vertex = self.edge_end(window[0]);
            assert_eq!(vertex, self.edge_start(window[1]), "Cannot merge path: edges {} and {} are not consecutive", window[0], window[1]);
            assert!(
                self.out_degree(vertex) == 1 && self.in_degree(vertex) == 1,
                "Cannot merge path: vertex {} has other incident edges", vertex
            );
            assert!(!endpoints.contains(&vertex), "Cannot merge path: vertex {} is also an endpoint", vertex);
            intermediate.push(vertex);
        }

        let mut sequence = self.sequence(path[0]).to_vec();
        for edge in path[1..].iter() {
            sequence.extend_from_slice(&self.sequence(*edge)[self.k()..]);
        }
        let new_edge = self.core.insert_edge(start, end, sequence, None);

        self.notify_merge(path, new_edge);
        self.notify_add_edge(new_edge);
        for edge in path.iter() {
            self.delete_edge(*edge);
        }
        for vertex in intermediate {
            if self.contains_vertex(vertex) {
                self.delete_vertex(vertex);
            }
        }

        new_edge
    }

    /// Merges the only incoming edge and the only outgoing edge of the vertex and returns the new edge.
    ///
    /// # Panics
    ///
    /// Panics if the vertex does not have exactly one incoming and one outgoing edge, or if the merge is otherwise invalid (see [`ConjugateGraph::merge_path`]).
    pub fn compress_vertex(&mut self, vertex: VertexId) -> EdgeId {
        assert!(
            self.out_degree(vertex) == 1 && self.in_degree(vertex) == 1,
            "Cannot compress vertex {}: it must have exactly one incoming and one outgoing edge", vertex
        );
        let incoming = self.incoming_edges(vertex).next().unwrap();
        let outgoing = self.outgoing_edges(vertex)[0];
        self.merge_path(&[incoming, outgoing])
    }

    /// Glues `edge1` onto `edge2` and returns the edge replacing them.
    ///
    /// The new edge is parallel to `edge2` and has the same sequence.
    /// Both old edges are deleted, and the endpoints of `edge1` are deleted if they become isolated.
    /// Observers receive the glue event first, then the new edge, then the deletions.
    ///
    /// # Panics
    ///
    /// Panics if either edge does not exist or if the edges are equal or conjugates of each other.
    pub fn glue_edges(&mut self, edge1: EdgeId, edge2: EdgeId) -> EdgeId {
        assert!(self.contains_edge(edge1), "Cannot glue: edge {} does not exist", edge1);
        assert!(self.contains_edge(edge2), "Cannot glue: edge {} does not exist", edge2);
        assert!(edge1 != edge2 && edge1 != self.conjugate(edge2), "Cannot glue edge {} onto itself or its conjugate", edge1);

        let sequence = self.sequence(edge2).to_vec();
        let new_edge = self.core.insert_edge(self.edge_start(edge2), self.edge_end(edge2), sequence, None);
        let old_endpoints = [self.edge_start(edge1), self.edge_end(edge1)];

        self.notify_glue(new_edge, edge1, edge2);
        self.notify_add_edge(new_edge);
        self.delete_edge(edge1);
        self.delete_edge(edge2);
        for vertex in old_endpoints {
            if self.contains_vertex(vertex) && self.is_isolated(vertex) {
                self.delete_vertex(vertex);
            }
        }

        new_edge
    }

    /// Splits the edge after `position` (k+1)-mers and returns the two new edges.
    ///
    /// A new vertex is created between the parts.
    /// The first part has sequence `sequence[..position + k]` and the second part `sequence[position..]`.
    /// Observers receive the split event first, then the new vertex and edges, then the deletion of the old edge.
    ///
    /// # Panics
    ///
    /// Panics if the edge does not exist or if `position` is not strictly inside the edge.
    pub fn split_edge(&mut self, edge: EdgeId, position: usize) -> (EdgeId, EdgeId) {
        assert!(self.contains_edge(edge), "Cannot split: edge {} does not exist", edge);
        let length = self.length(edge);
        assert!(position > 0 && position < length, "Cannot split edge {} of length {} at position {}", edge, length, position);

        let (start, end, k) = (self.edge_start(edge), self.edge_end(edge), self.k());
        let sequence = self.sequence(edge).to_vec();
        let middle = self.core.insert_vertex(V::default(), None);
        let first = self.core.insert_edge(start, middle, sequence[..position + k].to_vec(), None);
        let second = self.core.insert_edge(middle, end, sequence[position..].to_vec(), None);

        self.notify_split(edge, first, second);
        self.notify_add_vertex(middle);
        self.notify_add_edge(first);
        self.notify_add_edge(second);
        self.delete_edge(edge);

        (first, second)
    }

    /// Deletes all edges and vertices, notifying the observers, and resets identifier allocation.
    pub fn clear(&mut self) {
        let edges: Vec<EdgeId> = self.core.edges.iter()
            .filter(|(id, edge)| **id < edge.conjugate)
            .map(|(id, _)| *id)
            .collect();
        for edge in edges {
            self.delete_edge(edge);
        }
        let vertices: Vec<VertexId> = self.canonical_vertices().collect();
        for vertex in vertices {
            self.delete_vertex(vertex);
        }
        self.core.ids = IdAllocator::new();
    }
}

//-----------------------------------------------------------------------------
