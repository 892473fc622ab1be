//! # cdbg-base: a conjugate-symmetric de Bruijn graph substrate for genome assembly.
//!
//! DNA is double-stranded, so every sequence in an assembly graph has a reverse complement.
//! This crate stores the graph so that every vertex and every edge has a conjugate counterpart that is created, edited, and destroyed together with it.
//! It is intended as the shared foundation of assembly algorithms such as graph simplification and repeat resolution.
//! The algorithms themselves are not included.
//!
//! The crate builds on the [`gbwt`] crate for reverse complementation.
//!
//! See [`ConjugateGraph`] and [`GraphCore`] for the graph itself.
//! See [`ActionHandler`] for observers, [`SmartIterator`] for iterators that survive structural edits, [`binary`] for persistence, and [`ParallelIterationHelper`] for parallel traversal.
//!
//! ### Basic concepts
//!
//! Vertices and edges are accessed by [`VertexId`] and [`EdgeId`] handles.
//! Both kinds of elements share a single identifier space, and identifiers start from 1.
//! Of a conjugate pair, the element with the smaller identifier is the canonical one.
//!
//! Edges carry nucleotide sequences.
//! The graph has an order `k`, and consecutive edges overlap by `k` bases.
//! The length of an edge is the number of (k+1)-mers in it.
//!
//! Structural edits (adding and deleting elements, merging paths, gluing edges, splitting edges) are broadcast to the registered observers synchronously.
//! Observers can be ordered in two tiers with [`HandlerLevel`].
//! Domain indexes such as [`CoverageIndex`] are usually registered at the high level and smart iterators at the low level.
//!
//! The graph and its observers are single-threaded.
//! Read-only traversal can be parallelized over a shared [`GraphCore`].

pub mod binary;
pub mod coverage;
pub mod graph;
pub mod handlers;
pub mod ids;
pub mod iterators;
pub mod parallel;
pub mod utils;

#[cfg(test)]
mod internal;

pub use binary::RestoredIds;
pub use coverage::CoverageIndex;
pub use graph::{ConjugateGraph, GraphCore, GraphElement, VertexData};
pub use handlers::{ActionHandler, HandlerId, HandlerLevel};
pub use ids::{EdgeId, IdMapper, VertexId};
pub use iterators::{SmartEdgeIterator, SmartIterator, SmartVertexIterator};
pub use iterators::{ElementOrder, IdOrder, LengthOrder};
pub use parallel::{EdgeCursor, ParallelIterationHelper, VertexCursor};
