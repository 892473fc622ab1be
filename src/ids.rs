//! Element identifiers, identifier distribution, and mappings from stored identifiers.
//!
//! Vertices and edges share a single identifier space managed by an [`IdAllocator`] owned by the graph.
//! Identifiers start from 1, as 0 is used as a sentinel in the binary format.
//! Restoring a graph requires reproducing the stored identifiers exactly.
//! This is done by reserving the stored maximum with [`IdAllocator::reserve`] and then creating each conjugate pair with a [`SegmentIdDistributor`] that hands out the stored pair.

use std::collections::HashMap;
use std::fmt::Display;

//-----------------------------------------------------------------------------

/// Identifier of a vertex in a [`crate::ConjugateGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(usize);

impl VertexId {
    pub(crate) fn new(id: usize) -> Self {
        VertexId(id)
    }

    /// Returns the integer identifier.
    #[inline]
    pub fn id(&self) -> usize {
        self.0
    }
}

impl Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifier of an edge in a [`crate::ConjugateGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

impl EdgeId {
    pub(crate) fn new(id: usize) -> Self {
        EdgeId(id)
    }

    /// Returns the integer identifier.
    #[inline]
    pub fn id(&self) -> usize {
        self.0
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

//-----------------------------------------------------------------------------

/// A source of identifiers for new graph elements.
///
/// The graph asks for two identifiers for each conjugate pair: first for the element itself and then for its conjugate.
pub trait IdDistributor {
    /// Returns the next identifier.
    fn next_id(&mut self) -> usize;
}

/// Per-graph identifier state.
///
/// Fresh identifiers are allocated by incrementing the maximum identifier.
/// The allocator also records identifiers handed out by other distributors, so that fresh identifiers never collide with them.
///
/// # Examples
///
/// ```
/// use cdbg_base::ids::{IdAllocator, IdDistributor};
///
/// let mut ids = IdAllocator::new();
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(ids.next_id(), 2);
///
/// let reserved = ids.reserve(10);
/// assert_eq!(ids.max_id(), 10);
/// let mut segment = reserved.segment(7, 8);
/// assert_eq!(segment.next_id(), 7);
/// assert_eq!(segment.next_id(), 8);
/// assert_eq!(ids.next_id(), 11);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdAllocator {
    max_id: usize,
}

impl IdAllocator {
    /// Creates an allocator with no identifiers in use.
    pub fn new() -> Self {
        IdAllocator::default()
    }

    /// Returns the largest identifier allocated or recorded so far, or 0 if there are none.
    #[inline]
    pub fn max_id(&self) -> usize {
        self.max_id
    }

    /// Reserves all identifiers up to `max_id` and returns a handle for distributing them.
    ///
    /// Fresh identifiers allocated after this will be larger than `max_id`.
    pub fn reserve(&mut self, max_id: usize) -> ReservedIds {
        self.max_id = self.max_id.max(max_id);
        ReservedIds { max_id }
    }

    // Makes sure that fresh identifiers will not collide with `id`.
    pub(crate) fn record(&mut self, id: usize) {
        self.max_id = self.max_id.max(id);
    }
}

impl IdDistributor for IdAllocator {
    /// Returns a fresh identifier.
    ///
    /// # Panics
    ///
    /// Panics if the identifier space is exhausted.
    fn next_id(&mut self) -> usize {
        self.max_id = match self.max_id.checked_add(1) {
            Some(id) => id,
            None => panic!("Identifier space exhausted after {}", self.max_id),
        };
        self.max_id
    }
}

//-----------------------------------------------------------------------------

/// A range of reserved identifiers `1..=max_id`.
///
/// The identifiers are handed out one conjugate pair at a time with [`ReservedIds::segment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReservedIds {
    max_id: usize,
}

impl ReservedIds {
    /// Returns the largest reserved identifier.
    #[inline]
    pub fn max_id(&self) -> usize {
        self.max_id
    }

    /// Returns `true` if `id` is in the reserved range.
    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        id > 0 && id <= self.max_id
    }

    /// Returns a distributor that hands out `id` and then `conjugate`.
    ///
    /// # Panics
    ///
    /// Panics if either identifier is outside the reserved range or if they are equal.
    pub fn segment(&self, id: usize, conjugate: usize) -> SegmentIdDistributor {
        assert!(self.contains(id), "Identifier {} is not in the reserved range 1..={}", id, self.max_id);
        assert!(self.contains(conjugate), "Identifier {} is not in the reserved range 1..={}", conjugate, self.max_id);
        assert_ne!(id, conjugate, "An element cannot be its own conjugate");
        SegmentIdDistributor { ids: [id, conjugate], next: 0 }
    }
}

/// A distributor for a single caller-chosen conjugate pair of identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentIdDistributor {
    ids: [usize; 2],
    next: usize,
}

impl SegmentIdDistributor {
    /// Returns `true` if both identifiers have been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.next >= self.ids.len()
    }
}

impl IdDistributor for SegmentIdDistributor {
    /// Returns the next identifier in the segment.
    ///
    /// # Panics
    ///
    /// Panics if the segment is exhausted.
    fn next_id(&mut self) -> usize {
        assert!(!self.is_exhausted(), "Segment distributor {:?} is exhausted", self.ids);
        let result = self.ids[self.next];
        self.next += 1;
        result
    }
}

//-----------------------------------------------------------------------------

/// A mapping from identifiers stored in a file to live graph identifiers.
///
/// Built when restoring a graph, so that external indexes referring to the stored identifiers can be retargeted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdMapper<T> {
    map: HashMap<usize, T>,
}

impl<T> Default for IdMapper<T> {
    fn default() -> Self {
        IdMapper { map: HashMap::new() }
    }
}

impl<T: Copy> IdMapper<T> {
    /// Creates an empty mapper.
    pub fn new() -> Self {
        IdMapper::default()
    }

    pub(crate) fn insert(&mut self, raw_id: usize, id: T) {
        self.map.insert(raw_id, id);
    }

    /// Returns the live identifier for the stored identifier.
    #[inline]
    pub fn get(&self, raw_id: usize) -> Option<T> {
        self.map.get(&raw_id).copied()
    }

    /// Returns `true` if the stored identifier has been mapped.
    #[inline]
    pub fn contains(&self, raw_id: usize) -> bool {
        self.map.contains_key(&raw_id)
    }

    /// Returns the number of mapped identifiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the mapper is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over (stored identifier, live identifier) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.map.iter().map(|(raw_id, id)| (*raw_id, *id))
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
