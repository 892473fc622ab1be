//! Observers of structural graph edits.
//!
//! Any component that must stay consistent with the graph implements [`ActionHandler`] and registers itself with [`ConjugateGraph::add_action_handler`].
//! The graph notifies the handlers synchronously on the mutating thread.
//! Handlers receive a read-only view of the graph and cannot edit it.

use crate::graph::{ConjugateGraph, VertexData};
use crate::ids::{EdgeId, VertexId};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// An observer of structural edits in a [`ConjugateGraph`].
///
/// All callbacks are no-ops by default, so an implementation only needs to handle the events it cares about.
/// Each event is delivered separately for both halves of a conjugate pair.
///
/// Creation events are delivered when the new elements already exist.
/// Deletion events are delivered when the elements still exist.
/// For compound edits (merge, glue, split), the compound event comes first while the old edges still exist and the new ones already exist.
/// It is followed by the individual creation and deletion events.
pub trait ActionHandler<V: VertexData = ()> {
    /// Returns a name for the handler.
    fn name(&self) -> &str;

    /// A vertex was added.
    fn handle_add_vertex(&mut self, _graph: &ConjugateGraph<V>, _vertex: VertexId) {}

    /// A vertex is about to be deleted.
    fn handle_delete_vertex(&mut self, _graph: &ConjugateGraph<V>, _vertex: VertexId) {}

    /// An edge was added.
    fn handle_add_edge(&mut self, _graph: &ConjugateGraph<V>, _edge: EdgeId) {}

    /// An edge is about to be deleted.
    fn handle_delete_edge(&mut self, _graph: &ConjugateGraph<V>, _edge: EdgeId) {}

    /// A path of edges is being replaced with a single edge.
    fn handle_merge(&mut self, _graph: &ConjugateGraph<V>, _old_edges: &[EdgeId], _new_edge: EdgeId) {}

    /// Edges `edge1` and `edge2` are being replaced with `new_edge`.
    fn handle_glue(&mut self, _graph: &ConjugateGraph<V>, _new_edge: EdgeId, _edge1: EdgeId, _edge2: EdgeId) {}

    /// An edge is being split into two consecutive edges.
    fn handle_split(&mut self, _graph: &ConjugateGraph<V>, _old_edge: EdgeId, _new_edge1: EdgeId, _new_edge2: EdgeId) {}
}

//-----------------------------------------------------------------------------

/// Notification tier of a handler.
///
/// Structures that other handlers may depend on (e.g. an index keyed by biological meaning) should be registered at `High`.
/// Generic structures such as smart iterators are registered at `Low`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerLevel {
    /// Notified first.
    High,
    /// Notified after all `High` handlers.
    Low,
}

/// Identifier of a registered handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(usize);

struct HandlerEntry<V: VertexData> {
    id: HandlerId,
    level: HandlerLevel,
    handler: Weak<RefCell<dyn ActionHandler<V>>>,
}

// Handlers in notification order.
// Interior mutability allows handlers to be added and removed through a shared reference to the graph, including from within a callback.
pub(crate) struct HandlerRegistry<V: VertexData> {
    entries: RefCell<Vec<HandlerEntry<V>>>,
    next_id: Cell<usize>,
}

impl<V: VertexData> HandlerRegistry<V> {
    pub(crate) fn new() -> Self {
        HandlerRegistry {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub(crate) fn register(&self, handler: &Rc<RefCell<dyn ActionHandler<V>>>, level: HandlerLevel) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let mut entries = self.entries.borrow_mut();
        let position = entries.iter().position(|entry| entry.level > level).unwrap_or(entries.len());
        entries.insert(position, HandlerEntry { id, level, handler: Rc::downgrade(handler) });
        id
    }

    pub(crate) fn remove(&self, id: HandlerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let len = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() < len
    }

    fn contains(&self, id: HandlerId) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().iter().filter(|entry| entry.handler.strong_count() > 0).count()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.entries.borrow().iter()
            .filter_map(|entry| entry.handler.upgrade())
            .map(|handler| handler.borrow().name().to_string())
            .collect()
    }

    // Calls `event` for each live handler in notification order.
    // Handlers removed during the dispatch are skipped if they have not been called yet.
    // Dropped handlers are pruned afterwards.
    pub(crate) fn dispatch<F: FnMut(&mut dyn ActionHandler<V>)>(&self, mut event: F) {
        let snapshot: Vec<(HandlerId, Rc<RefCell<dyn ActionHandler<V>>>)> = self.entries.borrow().iter()
            .filter_map(|entry| entry.handler.upgrade().map(|handler| (entry.id, handler)))
            .collect();
        for (id, handler) in snapshot {
            if !self.contains(id) {
                continue;
            }
            let mut handler = handler.borrow_mut();
            event(&mut *handler);
        }
        self.entries.borrow_mut().retain(|entry| entry.handler.strong_count() > 0);
    }
}

//-----------------------------------------------------------------------------
