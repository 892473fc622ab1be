use super::*;

use crate::internal::RecordingHandler;

use std::cell::Cell;

//-----------------------------------------------------------------------------

// Appends its name to a shared log for every vertex event.
struct LoggingHandler {
    name: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl LoggingHandler {
    fn attach(graph: &ConjugateGraph, name: &str, level: HandlerLevel, log: &Rc<RefCell<Vec<String>>>) -> (Rc<RefCell<Self>>, HandlerId) {
        let handler = Rc::new(RefCell::new(LoggingHandler { name: name.to_string(), log: log.clone() }));
        let id = graph.add_action_handler(&handler, level);
        (handler, id)
    }
}

impl ActionHandler for LoggingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_add_vertex(&mut self, _graph: &ConjugateGraph, _vertex: VertexId) {
        self.log.borrow_mut().push(self.name.clone());
    }
}

// Removes another handler when it sees a vertex being added.
struct RemovingHandler {
    target: Cell<Option<HandlerId>>,
    calls: usize,
}

impl ActionHandler for RemovingHandler {
    fn name(&self) -> &str {
        "remover"
    }

    fn handle_add_vertex(&mut self, graph: &ConjugateGraph, _vertex: VertexId) {
        self.calls += 1;
        if let Some(target) = self.target.take() {
            assert!(graph.remove_action_handler(target), "Failed to remove handler {:?} during dispatch", target);
        }
    }
}

//-----------------------------------------------------------------------------

#[test]
fn notification_order() {
    let mut graph: ConjugateGraph = ConjugateGraph::new(2);
    let log = Rc::new(RefCell::new(Vec::new()));
    let (_a, _) = LoggingHandler::attach(&graph, "a", HandlerLevel::Low, &log);
    let (_b, _) = LoggingHandler::attach(&graph, "b", HandlerLevel::High, &log);
    let (_c, _) = LoggingHandler::attach(&graph, "c", HandlerLevel::Low, &log);
    let (_d, _) = LoggingHandler::attach(&graph, "d", HandlerLevel::High, &log);
    assert_eq!(graph.handler_count(), 4, "Wrong number of handlers");
    assert_eq!(graph.handler_names(), vec!["b", "d", "a", "c"], "Wrong notification order");

    graph.add_vertex(());
    assert_eq!(
        *log.borrow(),
        vec!["b", "b", "d", "d", "a", "a", "c", "c"],
        "Each handler should receive both halves before the next handler"
    );
}

#[test]
fn remove_handler() {
    let mut graph: ConjugateGraph = ConjugateGraph::new(2);
    let log = Rc::new(RefCell::new(Vec::new()));
    let (_a, a_id) = LoggingHandler::attach(&graph, "a", HandlerLevel::Low, &log);
    let (_b, b_id) = LoggingHandler::attach(&graph, "b", HandlerLevel::Low, &log);
    assert_ne!(a_id, b_id, "Handlers got the same identifier");

    assert!(graph.remove_action_handler(a_id), "Failed to remove a registered handler");
    assert!(!graph.remove_action_handler(a_id), "Removed the same handler twice");
    assert_eq!(graph.handler_names(), vec!["b"], "Wrong handlers after removal");

    graph.add_vertex(());
    assert_eq!(*log.borrow(), vec!["b", "b"], "A removed handler was notified");
}

#[test]
fn remove_during_dispatch() {
    let mut graph: ConjugateGraph = ConjugateGraph::new(2);
    let remover = Rc::new(RefCell::new(RemovingHandler { target: Cell::new(None), calls: 0 }));
    graph.add_action_handler(&remover, HandlerLevel::High);
    let victim = RecordingHandler::attach(&graph, "victim", HandlerLevel::Low);
    let survivor = RecordingHandler::attach(&graph, "survivor", HandlerLevel::Low);

    // The victim is the first low-level handler, so its identifier follows that of the remover.
    let names = graph.handler_names();
    assert_eq!(names, vec!["remover", "victim", "survivor"], "Wrong initial handlers");
    let victim_id = HandlerId(1);
    remover.borrow().target.set(Some(victim_id));

    let vertex = graph.add_vertex(());
    assert_eq!(remover.borrow().calls, 2, "The remover should receive both halves");
    assert!(victim.borrow().events.is_empty(), "A handler removed during dispatch received the event");
    assert_eq!(survivor.borrow().events.len(), 2, "The other handlers should still receive the event");
    assert_eq!(graph.handler_names(), vec!["remover", "survivor"], "Wrong handlers after removal during dispatch");

    graph.delete_vertex(vertex);
    assert!(victim.borrow().events.is_empty(), "A removed handler received a later event");
    assert_eq!(survivor.borrow().events.len(), 4, "Wrong number of events for the surviving handler");
}

#[test]
fn dropped_handler_detaches() {
    let mut graph: ConjugateGraph = ConjugateGraph::new(2);
    let kept = RecordingHandler::attach(&graph, "kept", HandlerLevel::Low);
    let dropped = RecordingHandler::attach(&graph, "dropped", HandlerLevel::High);
    assert_eq!(graph.handler_count(), 2, "Wrong number of handlers");

    drop(dropped);
    assert_eq!(graph.handler_count(), 1, "A dropped handler is still counted");
    assert_eq!(graph.handler_names(), vec!["kept"], "A dropped handler is still listed");

    graph.add_vertex(());
    assert_eq!(kept.borrow().events.len(), 2, "The remaining handler was not notified");
}

#[test]
fn default_callbacks() {
    struct Silent;
    impl ActionHandler for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }

    let mut graph: ConjugateGraph = ConjugateGraph::new(1);
    let silent = Rc::new(RefCell::new(Silent));
    graph.add_action_handler(&silent, HandlerLevel::Low);
    let u = graph.add_vertex(());
    let v = graph.add_vertex(());
    let edge = graph.add_edge(u, v, b"ACGTAC");
    let (first, second) = graph.split_edge(edge, 2);
    let merged = graph.merge_path(&[first, second]);
    let other = graph.add_edge(u, v, b"ACGAAC");
    graph.glue_edges(other, merged);
    graph.clear();
    assert_eq!(graph.handler_names(), vec!["silent"], "A handler with default callbacks was lost");
}

//-----------------------------------------------------------------------------
