//! Smart iterators: work queues over graph elements that stay consistent under structural edits.
//!
//! A smart iterator is both a cursor over a dynamic set of elements and an [`ActionHandler`] of the graph it iterates.
//! Deleted elements leave the queue immediately, and new elements can be added to it automatically.
//! This allows simplification algorithms to edit the graph while iterating over it.
//!
//! The elements are visited in the order of a key given by an [`ElementOrder`], with ties broken by identifier.
//! If `canonical_only` is set, an element is only accepted if it is not greater than its conjugate under the same order.
//!
//! The iterator is registered at [`HandlerLevel::Low`], so that any high-level handlers have been updated before the queue is.
//! It is detached from the graph when it is dropped.

use crate::graph::{ConjugateGraph, GraphCore, GraphElement, VertexData};
use crate::handlers::{ActionHandler, HandlerId, HandlerLevel};
use crate::ids::{EdgeId, VertexId};

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::rc::Rc;


//-----------------------------------------------------------------------------

/// An ordering of graph elements for smart iterators.
///
/// The key is computed when the element enters the queue.
pub trait ElementOrder<T: GraphElement, V: VertexData>: 'static {
    /// Sort key for the elements.
    type Key: Ord + Clone + Debug;

    /// Returns the sort key for an element that exists in the graph.
    fn key(&self, graph: &GraphCore<V>, element: T) -> Self::Key;
}

/// Identifier order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdOrder;

impl<T: GraphElement, V: VertexData> ElementOrder<T, V> for IdOrder {
    type Key = ();

    fn key(&self, _graph: &GraphCore<V>, _element: T) -> Self::Key {}
}

/// Shorter edges first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LengthOrder;

impl<V: VertexData> ElementOrder<EdgeId, V> for LengthOrder {
    type Key = usize;

    fn key(&self, graph: &GraphCore<V>, element: EdgeId) -> Self::Key {
        graph.length(element)
    }
}

//-----------------------------------------------------------------------------

// Position of the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor<T> {
    // Nothing has been pinned since the last advance.
    Free,
    // The current element is still in the queue.
    Pinned(T),
    // The current element left the queue through deletion or release.
    Gone,
}

/// Decides whether the replacement of merged edges belongs to the set.
pub type MergeCondition = Box<dyn FnMut(&[EdgeId], EdgeId) -> bool>;

// Admission rules of a conditioned set iterator.
struct Condition<T> {
    members: HashSet<T>,
    on_merge: MergeCondition,
}

/// The state of a smart iterator.
///
/// This is shared between a [`SmartIterator`] and the graph it observes.
/// It is public only because it appears in the trait bounds of [`SmartIterator`].
pub struct WorkQueue<T: GraphElement, V: VertexData, O: ElementOrder<T, V>> {
    name: String,
    queue: BTreeSet<(O::Key, T)>,
    keys: HashMap<T, O::Key>,
    cursor: Cursor<T>,
    add_new: bool,
    canonical_only: bool,
    condition: Option<Condition<T>>,
    order: O,
    _graph: PhantomData<fn(&V)>,
}

impl<T: GraphElement, V: VertexData, O: ElementOrder<T, V>> WorkQueue<T, V, O> {
    fn new(name: String, order: O, add_new: bool, canonical_only: bool) -> Self {
        WorkQueue {
            name,
            queue: BTreeSet::new(),
            keys: HashMap::new(),
            cursor: Cursor::Free,
            add_new,
            canonical_only,
            condition: None,
            order,
            _graph: PhantomData,
        }
    }

    fn push(&mut self, graph: &GraphCore<V>, element: T) -> bool {
        if self.keys.contains_key(&element) {
            return false;
        }
        assert!(element.exists_in(graph), "Cannot queue {:?}: it does not exist in the graph", element);
        let key = self.order.key(graph, element);
        if self.canonical_only {
            let conjugate = graph.conjugate(element);
            let conjugate_key = self.order.key(graph, conjugate);
            if (conjugate_key, conjugate) < (key.clone(), element) {
                return false;
            }
        }
        self.queue.insert((key.clone(), element));
        self.keys.insert(element, key);
        true
    }

    fn erase(&mut self, element: T) -> bool {
        if let Some(key) = self.keys.remove(&element) {
            self.queue.remove(&(key, element));
            if self.cursor == Cursor::Pinned(element) {
                self.cursor = Cursor::Gone;
            }
            true
        } else {
            false
        }
    }

    fn first(&self) -> Option<T> {
        self.queue.first().map(|(_, element)| *element)
    }

    fn current(&mut self) -> Option<T> {
        if let Cursor::Pinned(element) = self.cursor {
            return Some(element);
        }
        let element = self.first()?;
        self.cursor = Cursor::Pinned(element);
        Some(element)
    }

    fn advance(&mut self) {
        match self.cursor {
            Cursor::Pinned(element) => {
                self.erase(element);
            },
            Cursor::Free => {
                if let Some(element) = self.first() {
                    self.erase(element);
                }
            },
            Cursor::Gone => {},
        }
        self.cursor = Cursor::Free;
    }

    fn release_current(&mut self) {
        if let Cursor::Pinned(element) = self.cursor {
            self.erase(element);
            self.cursor = Cursor::Gone;
        }
    }

    fn next_element(&mut self) -> Option<T> {
        let element = self.current()?;
        self.advance();
        Some(element)
    }

    fn handle_add(&mut self, graph: &GraphCore<V>, element: T) {
        let admitted = match &self.condition {
            Some(condition) => condition.members.contains(&element),
            None => self.add_new,
        };
        if admitted {
            self.push(graph, element);
        }
    }

    fn handle_delete(&mut self, element: T) {
        self.erase(element);
        if let Some(condition) = self.condition.as_mut() {
            condition.members.remove(&element);
        }
    }
}

impl<V: VertexData, O: ElementOrder<VertexId, V>> ActionHandler<V> for WorkQueue<VertexId, V, O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_add_vertex(&mut self, graph: &ConjugateGraph<V>, vertex: VertexId) {
        self.handle_add(graph.core(), vertex);
    }

    fn handle_delete_vertex(&mut self, _graph: &ConjugateGraph<V>, vertex: VertexId) {
        self.handle_delete(vertex);
    }
}

impl<V: VertexData, O: ElementOrder<EdgeId, V>> ActionHandler<V> for WorkQueue<EdgeId, V, O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_add_edge(&mut self, graph: &ConjugateGraph<V>, edge: EdgeId) {
        self.handle_add(graph.core(), edge);
    }

    fn handle_delete_edge(&mut self, _graph: &ConjugateGraph<V>, edge: EdgeId) {
        self.handle_delete(edge);
    }

    fn handle_merge(&mut self, _graph: &ConjugateGraph<V>, old_edges: &[EdgeId], new_edge: EdgeId) {
        if let Some(condition) = self.condition.as_mut() {
            if (condition.on_merge)(old_edges, new_edge) {
                condition.members.insert(new_edge);
            }
        }
    }
}

//-----------------------------------------------------------------------------

/// A smart iterator over vertices or edges.
///
/// The constructor decides which elements are visited:
///
/// * [`SmartIterator::vertices`]: all vertices, including vertices added later.
/// * [`SmartIterator::edges`]: all edges, including edges added later.
/// * [`SmartIterator::set`]: the given elements only.
/// * [`SmartIterator::conditioned`]: the given edges and the replacements of merged edges accepted by a predicate.
///
/// The iterator can be used as a cursor ([`SmartIterator::is_end`], [`SmartIterator::current`], [`SmartIterator::advance`]) or as a standard [`Iterator`].
/// The standard iterator consumes each element as it is returned.
/// No borrows are held between calls, so the graph can be edited freely while iterating.
///
/// # Examples
///
/// ```
/// use cdbg_base::{ConjugateGraph, SmartEdgeIterator, IdOrder};
///
/// let mut graph: ConjugateGraph = ConjugateGraph::new(2);
/// let u = graph.add_vertex(());
/// let v = graph.add_vertex(());
/// let w = graph.add_vertex(());
/// let first = graph.add_edge(u, v, b"ACGT");
/// let second = graph.add_edge(v, w, b"GTTA");
///
/// let mut iter = SmartEdgeIterator::edges(&graph, IdOrder, true);
/// let mut visited = Vec::new();
/// while let Some(edge) = iter.next() {
///     visited.push(edge);
///     if edge == first {
///         // The second edge is replaced by the merged edge, which is visited later.
///         graph.merge_path(&[first, second]);
///     }
/// }
/// assert_eq!(visited.len(), 2);
/// assert_eq!(graph.edge_count(), 2);
/// ```
pub struct SmartIterator<T: GraphElement, V: VertexData = (), O: ElementOrder<T, V> = IdOrder> {
    queue: Rc<RefCell<WorkQueue<T, V, O>>>,
    handler: HandlerId,
}

/// A smart iterator over vertices.
pub type SmartVertexIterator<V = (), O = IdOrder> = SmartIterator<VertexId, V, O>;

/// A smart iterator over edges.
pub type SmartEdgeIterator<V = (), O = IdOrder> = SmartIterator<EdgeId, V, O>;

impl<T: GraphElement, V: VertexData, O: ElementOrder<T, V>> SmartIterator<T, V, O>
where
    WorkQueue<T, V, O>: ActionHandler<V>
{
    fn attach(graph: &ConjugateGraph<V>, queue: WorkQueue<T, V, O>) -> Self {
        let queue = Rc::new(RefCell::new(queue));
        let handler = graph.add_action_handler(&queue, HandlerLevel::Low);
        SmartIterator { queue, handler }
    }

    /// Creates an iterator over the given elements.
    ///
    /// New elements are not added to the set, but deleted elements are removed from it.
    ///
    /// # Panics
    ///
    /// Panics if an element does not exist in the graph.
    pub fn set<I: IntoIterator<Item = T>>(graph: &ConjugateGraph<V>, elements: I, order: O, canonical_only: bool) -> Self {
        let mut queue = WorkQueue::new(String::from("SmartSetIterator"), order, false, canonical_only);
        for element in elements {
            queue.push(graph.core(), element);
        }
        Self::attach(graph, queue)
    }

    /// Returns the identifier of the iterator as a graph observer.
    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }

    /// Adds an element to the queue.
    ///
    /// Returns `false` if the element was already in the queue or if it was rejected as non-canonical.
    ///
    /// # Panics
    ///
    /// Panics if the element does not exist in the graph.
    pub fn push(&self, graph: &ConjugateGraph<V>, element: T) -> bool {
        self.queue.borrow_mut().push(graph.core(), element)
    }

    /// Adds elements to the queue.
    ///
    /// # Panics
    ///
    /// Panics if an element does not exist in the graph.
    pub fn insert<I: IntoIterator<Item = T>>(&self, graph: &ConjugateGraph<V>, elements: I) {
        let mut queue = self.queue.borrow_mut();
        for element in elements {
            queue.push(graph.core(), element);
        }
    }

    /// Removes an element from the queue.
    ///
    /// Returns `false` if the element was not in the queue.
    pub fn erase(&self, element: T) -> bool {
        self.queue.borrow_mut().erase(element)
    }

    /// Returns `true` if there are no pending elements.
    pub fn is_end(&self) -> bool {
        self.queue.borrow().queue.is_empty()
    }

    /// Returns the number of pending elements.
    pub fn len(&self) -> usize {
        self.queue.borrow().queue.len()
    }

    /// Returns `true` if the element is pending.
    pub fn contains(&self, element: T) -> bool {
        self.queue.borrow().keys.contains_key(&element)
    }

    /// Returns the current element, or [`None`] if there are no pending elements.
    ///
    /// The current element is the first pending element.
    /// It stays current until the cursor is advanced, released, or the element is deleted from the graph.
    pub fn current(&self) -> Option<T> {
        self.queue.borrow_mut().current()
    }

    /// Consumes the current element.
    ///
    /// If the current element has already left the queue, this does nothing.
    pub fn advance(&self) {
        self.queue.borrow_mut().advance();
    }

    /// Removes the current element from the queue without consuming another element on the next advance.
    ///
    /// Use this when the current element is about to be replaced by code that does not notify the iterator.
    pub fn release_current(&self) {
        self.queue.borrow_mut().release_current();
    }
}

impl<V: VertexData, O: ElementOrder<VertexId, V>> SmartIterator<VertexId, V, O> {
    /// Creates an iterator over all vertices.
    ///
    /// Vertices added to the graph are added to the queue.
    pub fn vertices(graph: &ConjugateGraph<V>, order: O, canonical_only: bool) -> Self {
        let mut queue = WorkQueue::new(String::from("SmartVertexIterator"), order, true, canonical_only);
        for vertex in graph.vertices() {
            queue.push(graph.core(), vertex);
        }
        Self::attach(graph, queue)
    }
}

impl<V: VertexData, O: ElementOrder<EdgeId, V>> SmartIterator<EdgeId, V, O> {
    /// Creates an iterator over all edges.
    ///
    /// The queue is seeded by traversing the outgoing edges of each vertex.
    /// Edges added to the graph are added to the queue.
    pub fn edges(graph: &ConjugateGraph<V>, order: O, canonical_only: bool) -> Self {
        let mut queue = WorkQueue::new(String::from("SmartEdgeIterator"), order, true, canonical_only);
        for edge in graph.edges(false) {
            queue.push(graph.core(), edge);
        }
        Self::attach(graph, queue)
    }

    /// Creates an iterator over the given edges that can absorb merged replacements.
    ///
    /// An added edge enters the queue only if it belongs to the set.
    /// The set initially contains the given edges.
    /// When a path of edges is merged, `on_merge` is called with the old edges and the new edge.
    /// If it returns `true`, the new edge becomes a member of the set and enters the queue when it is added to the graph.
    ///
    /// # Panics
    ///
    /// Panics if an edge does not exist in the graph.
    pub fn conditioned<I, F>(graph: &ConjugateGraph<V>, edges: I, order: O, on_merge: F) -> Self
    where
        I: IntoIterator<Item = EdgeId>,
        F: FnMut(&[EdgeId], EdgeId) -> bool + 'static,
    {
        let mut queue = WorkQueue::new(String::from("ConditionedSetIterator"), order, false, false);
        let mut members = HashSet::new();
        for edge in edges {
            members.insert(edge);
            queue.push(graph.core(), edge);
        }
        queue.condition = Some(Condition { members, on_merge: Box::new(on_merge) });
        Self::attach(graph, queue)
    }
}

impl<T: GraphElement, V: VertexData, O: ElementOrder<T, V>> Iterator for SmartIterator<T, V, O> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.borrow_mut().next_element()
    }
}

//-----------------------------------------------------------------------------
