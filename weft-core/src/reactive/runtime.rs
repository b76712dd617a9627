//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It owns the dependency graph, the registry that resolves node
//! ids to live nodes, and the pending-effect queue that `flush_effects`
//! drains.
//!
//! # How It Works
//!
//! 1. When a memo or effect is created, it registers with the runtime.
//!
//! 2. When a node is read inside a tracking context, the runtime records the
//!    `source -> dependent` edge.
//!
//! 3. When a signal's value changes, the runtime invalidates the signal's
//!    dependents: memos flip to invalid and propagate further, effects are
//!    enqueued for the next flush. Memos are lazy - they recompute on the
//!    next read, not here.
//!
//! 4. `flush_effects` pops pending effects until the queue reaches a fixed
//!    point. Effects re-enqueued by their own writes keep the loop going.
//!
//! # Threading
//!
//! All runtime state is thread-local. The engine is single-threaded and
//! cooperative: keeping the registry, graph, and queue in thread-local
//! storage means no synchronization at all, and each thread that touches the
//! reactive API gets an independent engine. The registry holds `Weak`
//! references so it never keeps a node alive; ownership stays with the host.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::graph::{DependencyGraph, NodeId, NodeKind};

use super::context::ReactiveContext;

thread_local! {
    static REGISTRY: RefCell<HashMap<NodeId, Weak<dyn Reactive>>> =
        RefCell::new(HashMap::new());
    static GRAPH: RefCell<DependencyGraph> = RefCell::new(DependencyGraph::new());
    static PENDING: RefCell<VecDeque<NodeId>> = RefCell::new(VecDeque::new());
    static FLUSHING: Cell<bool> = Cell::new(false);
}

/// What an invalidated node asks the runtime to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateAction {
    /// The node went stale just now; push the invalidation on to its
    /// dependents.
    Propagate,
    /// The node wants to run on the next flush; append it to the queue.
    Schedule,
    /// Nothing to do - the node was already stale, already queued, or
    /// disposed. Invalidation is idempotent.
    Ignore,
}

/// Node behavior the runtime dispatches through.
///
/// Memos and effects implement this; signals never receive invalidations and
/// stay out of the registry.
pub trait Reactive {
    /// The node's graph identity.
    fn node_id(&self) -> NodeId;

    /// What kind of node this is.
    fn kind(&self) -> NodeKind;

    /// React to an invalidation and tell the runtime how to continue.
    fn on_invalidate(&self) -> InvalidateAction;

    /// Evaluate if still pending. Called only for queued nodes during flush.
    fn run_pending(&self);
}

/// The reactive runtime for the current thread.
pub struct Runtime;

impl Runtime {
    /// Register a node so invalidations can reach it.
    ///
    /// The runtime keeps only a weak reference; the node unregisters itself
    /// when the host drops its last handle.
    pub fn register(node: Rc<dyn Reactive>) {
        REGISTRY.with(|registry| {
            registry
                .borrow_mut()
                .insert(node.node_id(), Rc::downgrade(&node));
        });
    }

    /// Remove a node from the registry and strip its edges.
    ///
    /// Uses `try_with` because node drops can run during thread teardown,
    /// after the thread-local state is gone.
    pub(crate) fn release(id: NodeId) {
        let _ = REGISTRY.try_with(|registry| {
            registry.borrow_mut().remove(&id);
        });
        let _ = GRAPH.try_with(|graph| {
            graph.borrow_mut().remove_node(id);
        });
    }

    /// Record a read of `source` against the current tracker, if any.
    pub(crate) fn track_read(source: NodeId) {
        if let Some(tracker) = ReactiveContext::current_tracker() {
            GRAPH.with(|graph| graph.borrow_mut().add_edge(source, tracker));
        }
    }

    /// Drop every incoming edge of `dependent` ahead of a re-evaluation.
    pub(crate) fn clear_sources(dependent: NodeId) {
        GRAPH.with(|graph| graph.borrow_mut().clear_sources(dependent));
    }

    /// Whether `id` registered itself as one of its own sources during its
    /// most recent run.
    pub(crate) fn reads_itself(id: NodeId) -> bool {
        GRAPH.with(|graph| graph.borrow().has_edge(id, id))
    }

    /// Invalidate every current dependent of `source`.
    ///
    /// This is the entry point of a write: the signal has already stored the
    /// new value, and the wave spreads from its direct dependents.
    pub(crate) fn invalidate_dependents(source: NodeId) {
        for dependent in Self::dependents_of(source) {
            Self::invalidate(dependent);
        }
    }

    /// Invalidate one node, continuing as the node directs.
    ///
    /// Invalidation never evaluates anything: memos are marked stale and the
    /// wave continues through them, effects are enqueued at most once.
    pub(crate) fn invalidate(id: NodeId) {
        let Some(node) = Self::lookup(id) else {
            return;
        };
        match node.on_invalidate() {
            InvalidateAction::Propagate => {
                trace!(node = id.raw(), kind = ?node.kind(), "invalidated, propagating");
                for dependent in Self::dependents_of(id) {
                    Self::invalidate(dependent);
                }
            }
            InvalidateAction::Schedule => {
                trace!(node = id.raw(), "scheduled for flush");
                PENDING.with(|queue| queue.borrow_mut().push_back(id));
            }
            InvalidateAction::Ignore => {}
        }
    }

    /// Invalidate the dependents of a memo whose recomputed value changed.
    ///
    /// Dependents whose tracking frame is on the evaluation stack are
    /// skipped: they are consuming the fresh result in this very run, and
    /// scheduling them again would re-run every puller once more. A write
    /// reaching the same dependents goes through [`Self::invalidate`], which
    /// does not skip them.
    pub(crate) fn propagate_change(source: NodeId) {
        for dependent in Self::dependents_of(source) {
            if !ReactiveContext::is_tracking(dependent) {
                Self::invalidate(dependent);
            }
        }
    }

    /// Diagnostic: how many dependents `id` currently has.
    pub(crate) fn dependent_count(id: NodeId) -> usize {
        GRAPH.with(|graph| graph.borrow().dependent_count(id))
    }

    /// Diagnostic: how many sources `id` read in its last evaluation.
    pub(crate) fn source_count(id: NodeId) -> usize {
        GRAPH.with(|graph| graph.borrow().source_count(id))
    }

    fn dependents_of(id: NodeId) -> Vec<NodeId> {
        GRAPH.with(|graph| graph.borrow().dependents_of(id))
    }

    fn lookup(id: NodeId) -> Option<Rc<dyn Reactive>> {
        let weak = REGISTRY.with(|registry| registry.borrow().get(&id).cloned());
        match weak {
            Some(weak) => match weak.upgrade() {
                Some(node) => Some(node),
                None => {
                    // The host dropped the node; sweep the stale entry.
                    Self::release(id);
                    None
                }
            },
            None => None,
        }
    }
}

/// Drain the pending-effect queue to a fixed point.
///
/// Effects run in FIFO order by enqueue time. An effect whose body (or whose
/// memo dependencies) writes to one of its own sources is re-enqueued and
/// runs again within the same flush; the loop ends when the queue empties.
/// The engine imposes no iteration bound - a graph whose writes never
/// stabilize will not terminate.
///
/// Calling `flush_effects` from inside a running effect is a no-op; the
/// outer loop picks up whatever was enqueued.
///
/// If an effect panics, the panic propagates to the caller; the queue and
/// context stack stay consistent, and the failing effect is re-enqueued so
/// the next flush retries it.
pub fn flush_effects() {
    let already_flushing = FLUSHING.with(|flag| flag.replace(true));
    if already_flushing {
        return;
    }
    // Reset the flag even when an effect panics out of the loop.
    let _reset = FlushReset;

    trace!("flush started");
    loop {
        let next = PENDING.with(|queue| queue.borrow_mut().pop_front());
        let Some(id) = next else {
            break;
        };
        match Runtime::lookup(id) {
            Some(node) => node.run_pending(),
            // Dropped between enqueue and flush; lookup already swept it.
            None => {}
        }
    }
    trace!("flush reached fixed point");
}

/// Whether any effect is waiting for the next flush.
pub fn has_pending_effects() -> bool {
    PENDING.with(|queue| !queue.borrow().is_empty())
}

struct FlushReset;

impl Drop for FlushReset {
    fn drop(&mut self) {
        let _ = FLUSHING.try_with(|flag| flag.set(false));
    }
}
