//! Per-edge coverage kept consistent with structural edits.
//!
//! The index stores the raw number of (k+1)-mer occurrences on each edge.
//! Coverage is the raw count divided by the length of the edge.
//! Both halves of a conjugate pair always have the same raw count.

use crate::graph::{ConjugateGraph, GraphCore, VertexData};
use crate::handlers::{ActionHandler, HandlerId, HandlerLevel};
use crate::ids::EdgeId;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;


//-----------------------------------------------------------------------------

/// Raw edge coverage that follows the graph through merges, glues, splits, and deletions.
///
/// The index is a high-level observer, so it has been updated before any low-level observers (such as smart iterators) see an event.
/// Compound events are handled once per conjugate pair, when the primary edge of the event is canonical.
///
/// * Merge: the new edge gets the sum of the old raw counts.
/// * Glue: the new edge gets the sum of the raw counts of the glued edges.
/// * Split: the raw count is divided in proportion to the lengths of the parts, giving each part at least 1 if the old edge had any coverage.
/// * Delete: the entry is removed.
///
/// # Examples
///
/// ```
/// use cdbg_base::{ConjugateGraph, CoverageIndex};
///
/// let mut graph: ConjugateGraph = ConjugateGraph::new(2);
/// let u = graph.add_vertex(());
/// let v = graph.add_vertex(());
/// let w = graph.add_vertex(());
/// let first = graph.add_edge(u, v, b"ACGTA");
/// let second = graph.add_edge(v, w, b"TACC");
///
/// let index = CoverageIndex::attach(&graph);
/// index.borrow_mut().set_raw(&graph, first, 30);
/// index.borrow_mut().set_raw(&graph, second, 10);
///
/// let merged = graph.merge_path(&[first, second]);
/// assert_eq!(index.borrow().raw_coverage(merged), 40);
/// assert_eq!(index.borrow().raw_coverage(graph.conjugate(merged)), 40);
/// assert_eq!(index.borrow().coverage(&graph, merged), 8.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageIndex {
    raw: HashMap<EdgeId, usize>,
    handler: Option<HandlerId>,
}

impl CoverageIndex {
    /// Creates an index for the graph and registers it as a [`HandlerLevel::High`] observer.
    ///
    /// The index is detached when the returned reference is dropped.
    pub fn attach<V: VertexData>(graph: &ConjugateGraph<V>) -> Rc<RefCell<Self>> {
        let index = Rc::new(RefCell::new(CoverageIndex::default()));
        let handler = graph.add_action_handler(&index, HandlerLevel::High);
        index.borrow_mut().handler = Some(handler);
        index
    }

    /// Returns the observer identifier of the index, if it has been attached to a graph.
    pub fn handler_id(&self) -> Option<HandlerId> {
        self.handler
    }

    /// Returns the number of edges with a coverage entry, counting both halves of each pair.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if no edge has a coverage entry.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the raw count for the edge, or 0 if there is none.
    #[inline]
    pub fn raw_coverage(&self, edge: EdgeId) -> usize {
        self.raw.get(&edge).copied().unwrap_or(0)
    }

    /// Returns the raw count divided by the length of the edge.
    pub fn coverage<V: VertexData>(&self, graph: &GraphCore<V>, edge: EdgeId) -> f64 {
        self.raw_coverage(edge) as f64 / graph.length(edge) as f64
    }

    /// Sets the raw count for the edge and its conjugate.
    pub fn set_raw<V: VertexData>(&mut self, graph: &GraphCore<V>, edge: EdgeId, value: usize) {
        self.raw.insert(edge, value);
        self.raw.insert(graph.conjugate(edge), value);
    }

    /// Adds to the raw count of the edge and its conjugate.
    pub fn increment_raw<V: VertexData>(&mut self, graph: &GraphCore<V>, edge: EdgeId, count: usize) {
        let value = self.raw_coverage(edge) + count;
        self.set_raw(graph, edge, value);
    }
}

//-----------------------------------------------------------------------------

impl<V: VertexData> ActionHandler<V> for CoverageIndex {
    fn name(&self) -> &str {
        "CoverageIndex"
    }

    fn handle_delete_edge(&mut self, _graph: &ConjugateGraph<V>, edge: EdgeId) {
        self.raw.remove(&edge);
    }

    fn handle_merge(&mut self, graph: &ConjugateGraph<V>, old_edges: &[EdgeId], new_edge: EdgeId) {
        if !graph.is_canonical(new_edge) {
            return;
        }
        let total = old_edges.iter().map(|edge| self.raw_coverage(*edge)).sum();
        self.set_raw(graph, new_edge, total);
    }

    fn handle_glue(&mut self, graph: &ConjugateGraph<V>, new_edge: EdgeId, edge1: EdgeId, edge2: EdgeId) {
        if !graph.is_canonical(new_edge) {
            return;
        }
        let total = self.raw_coverage(edge1) + self.raw_coverage(edge2);
        self.set_raw(graph, new_edge, total);
    }

    fn handle_split(&mut self, graph: &ConjugateGraph<V>, old_edge: EdgeId, new_edge1: EdgeId, new_edge2: EdgeId) {
        if !graph.is_canonical(old_edge) {
            return;
        }
        let total = self.raw_coverage(old_edge);
        let (first_len, second_len) = (graph.length(new_edge1), graph.length(new_edge2));
        let (first, second) = if total == 0 {
            (0, 0)
        } else {
            let first = (total * first_len / (first_len + second_len)).max(1);
            (first, total.saturating_sub(first).max(1))
        };
        self.set_raw(graph, new_edge1, first);
        self.set_raw(graph, new_edge2, second);
    }
}

//-----------------------------------------------------------------------------
