//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs when its
//! dependencies change. Effects are the leaves of the graph and the only
//! nodes the flush queue holds.
//!
//! # How Effects Work
//!
//! 1. Creation invalidates the effect, so it runs on the next
//!    [`flush_effects`](super::runtime::flush_effects) - not inline.
//!
//! 2. When any dependency changes, the effect goes pending and joins the
//!    queue; while pending, further invalidations are no-ops, so it holds at
//!    most one queue entry.
//!
//! 3. Evaluation drops the pending flag *first*, then clears the old source
//!    edges and runs the body under a tracking frame. A body that writes to
//!    one of its own sources therefore re-enqueues itself, and the flush
//!    loop runs it again until the graph stabilizes.
//!
//! # Differences from Memo
//!
//! - Memos return a value; effects do not, and nothing depends on them.
//! - Memos are pull-driven (recompute on read); effects are queue-driven.

use std::cell::Cell;
use std::rc::Rc;

use tracing::trace;

use crate::graph::{NodeId, NodeKind};

use super::context::ReactiveContext;
use super::runtime::{InvalidateAction, Reactive, Runtime};

/// A side-effecting computation scheduled by the flush engine.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let count_in_effect = count.clone();
/// let effect = Effect::new(move || {
///     println!("count is {}", count_in_effect.get());
/// });
///
/// flush_effects(); // prints "count is 0"
/// count.set(5);
/// flush_effects(); // prints "count is 5"
/// ```
pub struct Effect {
    inner: Rc<EffectInner>,
}

struct EffectInner {
    id: NodeId,
    run: Box<dyn Fn()>,
    pending: Cell<bool>,
    disposed: Cell<bool>,
    run_count: Cell<u64>,
}

impl Effect {
    /// Create a new effect.
    ///
    /// The effect is immediately invalidated and first runs on the next
    /// flush.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + 'static,
    {
        let inner = Rc::new(EffectInner {
            id: NodeId::new(),
            run: Box::new(run),
            pending: Cell::new(false),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
        });
        Runtime::register(inner.clone());
        Runtime::invalidate(inner.id);
        Self { inner }
    }

    /// Get the effect's node id.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// How many times the body has run.
    pub fn run_count(&self) -> u64 {
        self.inner.run_count.get()
    }

    /// Dispose of the effect.
    ///
    /// A disposed effect is skipped by the queue, ignores invalidations, and
    /// no longer holds edges.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        Runtime::clear_sources(self.inner.id);
    }

    /// Whether the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Diagnostic: number of sources read during the last run.
    pub fn dependency_count(&self) -> usize {
        Runtime::source_count(self.inner.id)
    }
}

impl EffectInner {
    fn execute(&self) {
        trace!(effect = self.id.raw(), "running effect");
        Runtime::clear_sources(self.id);

        {
            let mut guard = RunGuard {
                id: self.id,
                armed: true,
            };
            let _frame = ReactiveContext::enter(self.id);
            (self.run)();
            guard.armed = false;
        }

        self.run_count.set(self.run_count.get() + 1);
    }
}

/// Restores a consistent state when a body panics: the edges captured so far
/// are discarded and the effect re-schedules itself, so the next flush
/// retries it while the panic unwinds to the flush caller.
struct RunGuard {
    id: NodeId,
    armed: bool,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.armed {
            Runtime::clear_sources(self.id);
            Runtime::invalidate(self.id);
        }
    }
}

impl Reactive for EffectInner {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Effect
    }

    fn on_invalidate(&self) -> InvalidateAction {
        if self.disposed.get() || self.pending.replace(true) {
            InvalidateAction::Ignore
        } else {
            InvalidateAction::Schedule
        }
    }

    fn run_pending(&self) {
        // The pending flag drops before the body runs: a self-write during
        // the run must be able to re-enqueue this effect.
        if !self.pending.replace(false) || self.disposed.get() {
            return;
        }
        self.execute();
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        Runtime::release(self.id);
    }
}
