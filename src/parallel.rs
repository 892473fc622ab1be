//! Balanced chunks for read-only parallel traversal of a graph.
//!
//! The vertices are split into consecutive identifier ranges of roughly equal size.
//! Edge chunks are derived from the vertex ranges, so that each edge belongs to the chunk of its start vertex.
//! Workers run on scoped threads and only see a shared [`GraphCore`], which makes structural edits during the traversal impossible.

use crate::graph::{GraphCore, VertexData};
use crate::ids::{EdgeId, VertexId};

use std::ops::Bound;
use std::{panic, thread};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A chunk boundary in the vertex order.
///
/// `End` is past the last vertex and compares greater than any vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexCursor {
    /// The first vertex of the chunk.
    At(VertexId),
    /// Past the last vertex.
    End,
}

/// A chunk boundary in the edge order.
///
/// Edges are ordered by start vertex and then by position in the outgoing edges of that vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeCursor {
    /// Start vertex of the edge.
    pub vertex: VertexCursor,
    /// Position of the edge in the outgoing edges of the vertex.
    pub offset: usize,
}

impl EdgeCursor {
    /// A cursor past the last edge.
    pub const END: EdgeCursor = EdgeCursor { vertex: VertexCursor::End, offset: 0 };

    /// Returns a cursor at the first outgoing edge of the vertex.
    pub fn at(vertex: VertexCursor) -> Self {
        EdgeCursor { vertex, offset: 0 }
    }
}

//-----------------------------------------------------------------------------

/// Splits a graph into chunks for parallel processing.
///
/// # Examples
///
/// ```
/// use cdbg_base::{ConjugateGraph, ParallelIterationHelper};
///
/// let mut graph: ConjugateGraph = ConjugateGraph::new(2);
/// let u = graph.add_vertex(());
/// let v = graph.add_vertex(());
/// graph.add_edge(u, v, b"ACGT");
/// graph.add_edge(v, u, b"GTAC");
///
/// let helper = ParallelIterationHelper::new(graph.core());
/// let chunks = helper.vertex_chunks(3);
/// assert_eq!(chunks.len(), 4);
///
/// let processed = helper.process_edges(3, true, |_| ());
/// assert_eq!(processed, 2);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ParallelIterationHelper<'a, V> {
    graph: &'a GraphCore<V>,
}

impl<'a, V: VertexData> ParallelIterationHelper<'a, V> {
    /// Creates a helper for the graph.
    pub fn new(graph: &'a GraphCore<V>) -> Self {
        ParallelIterationHelper { graph }
    }

    /// Returns `n + 1` boundaries that split the vertices into `n` chunks.
    ///
    /// Chunk `i` consists of the vertices from boundary `i` (inclusive) to boundary `i + 1` (exclusive).
    /// All chunks have `size / n` vertices, except that the remainder is added to the first chunk.
    /// If there are fewer vertices than chunks, the trailing chunks are empty.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn vertex_chunks(&self, n: usize) -> Vec<VertexCursor> {
        assert!(n > 0, "Cannot split the graph into 0 chunks");
        let total = self.graph.size();
        let chunk_size = total / n;
        let first_size = chunk_size + total % n;

        let mut vertices = self.graph.vertices();
        let mut next_index = 0;
        let mut result: Vec<VertexCursor> = Vec::with_capacity(n + 1);
        let mut previous: Option<(usize, VertexCursor)> = None;
        for i in 0..=n {
            let index = if i == 0 { 0 } else { first_size + (i - 1) * chunk_size };
            let cursor = match previous {
                Some((previous_index, cursor)) if previous_index == index => cursor,
                _ if index >= total => VertexCursor::End,
                _ => {
                    let vertex = vertices.nth(index - next_index);
                    next_index = index + 1;
                    match vertex {
                        Some(vertex) => VertexCursor::At(vertex),
                        None => VertexCursor::End,
                    }
                },
            };
            previous = Some((index, cursor));
            result.push(cursor);
        }

        result
    }

    /// Returns `n + 1` boundaries that split the edges into `n` chunks.
    ///
    /// The boundaries are derived from [`ParallelIterationHelper::vertex_chunks`].
    /// Each boundary is moved to the first outgoing edge (canonical edge if `canonical_only` is set) at or after the vertex boundary.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn edge_chunks(&self, n: usize, canonical_only: bool) -> Vec<EdgeCursor> {
        self.vertex_chunks(n).into_iter().map(|boundary| {
            match self.positions(EdgeCursor::at(boundary), EdgeCursor::END, canonical_only).next() {
                Some((cursor, _)) => cursor,
                None => EdgeCursor::END,
            }
        }).collect()
    }

    /// Returns an iterator over the vertices in `start..end`.
    pub fn vertices_between(&self, start: VertexCursor, end: VertexCursor) -> impl Iterator<Item = VertexId> + 'a {
        let graph = self.graph;
        let range = match (start, end) {
            (VertexCursor::At(first), VertexCursor::At(limit)) if first < limit => Some((Bound::Included(first), Bound::Excluded(limit))),
            (VertexCursor::At(first), VertexCursor::End) => Some((Bound::Included(first), Bound::Unbounded)),
            _ => None,
        };
        range.into_iter().flat_map(move |range| graph.vertices_in(range))
    }

    // Edges in `start..end` with their positions.
    fn positions(&self, start: EdgeCursor, end: EdgeCursor, canonical_only: bool) -> impl Iterator<Item = (EdgeCursor, EdgeId)> + 'a {
        let graph = self.graph;
        let range = match (start.vertex, end.vertex) {
            (VertexCursor::At(first), VertexCursor::At(last)) if first <= last => Some((Bound::Included(first), Bound::Included(last))),
            (VertexCursor::At(first), VertexCursor::End) => Some((Bound::Included(first), Bound::Unbounded)),
            _ => None,
        };
        range.into_iter()
            .flat_map(move |range| graph.vertices_in(range))
            .flat_map(move |vertex| {
                graph.outgoing_edges(vertex).iter().enumerate().map(move |(offset, edge)| {
                    (EdgeCursor { vertex: VertexCursor::At(vertex), offset }, *edge)
                })
            })
            .skip_while(move |(cursor, _)| *cursor < start)
            .take_while(move |(cursor, _)| *cursor < end)
            .filter(move |(_, edge)| !canonical_only || graph.is_canonical(*edge))
    }

    /// Returns an iterator over the edges in `start..end`.
    ///
    /// If `canonical_only` is set, only the canonical half of each conjugate pair is listed.
    pub fn edges_between(&self, start: EdgeCursor, end: EdgeCursor, canonical_only: bool) -> impl Iterator<Item = EdgeId> + 'a {
        self.positions(start, end, canonical_only).map(|(_, edge)| edge)
    }
}

//-----------------------------------------------------------------------------

/// Parallel processing.
impl<'a, V: VertexData + Sync> ParallelIterationHelper<'a, V> {
    /// Calls `worker` for each vertex using `n` threads and returns the number of processed vertices.
    ///
    /// If a worker panics, the panic is propagated after the other threads have finished.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn process_vertices<F: Fn(VertexId) + Sync>(&self, n: usize, worker: F) -> usize {
        let chunks = self.vertex_chunks(n);
        let worker = &worker;
        thread::scope(|scope| {
            let handles: Vec<_> = chunks.windows(2).map(|bounds| {
                let (start, end) = (bounds[0], bounds[1]);
                scope.spawn(move || {
                    let mut processed = 0;
                    for vertex in self.vertices_between(start, end) {
                        worker(vertex);
                        processed += 1;
                    }
                    processed
                })
            }).collect();
            join_all(handles)
        })
    }

    /// Calls `worker` for each edge using `n` threads and returns the number of processed edges.
    ///
    /// If `canonical_only` is set, only the canonical half of each conjugate pair is processed.
    /// If a worker panics, the panic is propagated after the other threads have finished.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn process_edges<F: Fn(EdgeId) + Sync>(&self, n: usize, canonical_only: bool, worker: F) -> usize {
        let chunks = self.edge_chunks(n, canonical_only);
        let worker = &worker;
        thread::scope(|scope| {
            let handles: Vec<_> = chunks.windows(2).map(|bounds| {
                let (start, end) = (bounds[0], bounds[1]);
                scope.spawn(move || {
                    let mut processed = 0;
                    for edge in self.edges_between(start, end, canonical_only) {
                        worker(edge);
                        processed += 1;
                    }
                    processed
                })
            }).collect();
            join_all(handles)
        })
    }
}

fn join_all(handles: Vec<thread::ScopedJoinHandle<'_, usize>>) -> usize {
    let mut total = 0;
    let mut failure = None;
    for handle in handles {
        match handle.join() {
            Ok(processed) => total += processed,
            Err(payload) => {
                failure.get_or_insert(payload);
            },
        }
    }
    if let Some(payload) = failure {
        panic::resume_unwind(payload);
    }
    total
}

//-----------------------------------------------------------------------------
