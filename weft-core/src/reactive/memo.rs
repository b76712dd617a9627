//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when read while
//! stale.
//!
//! # How Memos Work
//!
//! 1. A memo starts invalid; its computation runs on first read, not at
//!    creation.
//!
//! 2. Read while valid: return the cached value (and register the reader as
//!    a dependent).
//!
//! 3. Read while invalid: drop the old source edges, run the computation
//!    under a fresh tracking frame, cache the result. If the result differs
//!    from the previous one (by `PartialEq`), invalidate dependents; if it
//!    is equal, dependents are left alone.
//!
//! 4. Invalidation (from a source write) marks the memo stale and continues
//!    to its dependents. It never recomputes anything - a memo nobody reads
//!    again costs nothing.
//!
//! # Self-writes and self-reads
//!
//! A memo's body may write to a signal it also reads. The write invalidates
//! the memo mid-run (the memo is marked valid *before* the body runs so the
//! invalidation is not lost) and the cascade is resolved by the flush loop
//! pulling the memo again.
//!
//! A memo's body may also read the memo itself. The engine refuses to
//! recurse into a node that is already evaluating: such a read yields the
//! previous cached value, or [`ReactiveError::NotYetComputed`] on the very
//! first run. A memo that both writes a source and reads itself is
//! re-evaluated in place until it stops invalidating itself - its own
//! output is one of its inputs, so the read only finishes once a fixed
//! point is reached.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use tracing::trace;

use crate::graph::{NodeId, NodeKind};

use super::context::ReactiveContext;
use super::error::ReactiveError;
use super::runtime::{InvalidateAction, Reactive, Runtime};

/// Validity of a memo's cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is trusted; reads return it as-is.
    Valid,

    /// A source changed since the last run; the next read recomputes.
    Invalid,
}

/// A cached derived value that recomputes lazily when read while stale.
///
/// The `PartialEq` bound is what powers value-equality gating: a recompute
/// that lands on the same value does not wake dependents.
pub struct Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    inner: Rc<MemoInner<T>>,
}

struct MemoInner<T> {
    id: NodeId,
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    state: Cell<MemoState>,
    run_count: Cell<u64>,
}

impl<T> Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new memo with the given computation.
    ///
    /// The computation is not run here; it runs on first read.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new(MemoInner {
            id: NodeId::new(),
            compute: Box::new(compute),
            value: RefCell::new(None),
            state: Cell::new(MemoState::Invalid),
            run_count: Cell::new(0),
        });
        Runtime::register(inner.clone());
        Self { inner }
    }

    /// Get the memo's node id.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the current value, recomputing if stale.
    ///
    /// Reading a memo from inside its own evaluation yields the previous
    /// cached value rather than recursing; `Err(NotYetComputed)` means that
    /// happened before a first value existed.
    pub fn try_get(&self) -> Result<T, ReactiveError> {
        let id = self.inner.id;

        if ReactiveContext::is_tracking(id) {
            // Already evaluating on this stack: refuse to recurse, hand back
            // the previous result.
            Runtime::track_read(id);
            return self
                .inner
                .value
                .borrow()
                .clone()
                .ok_or(ReactiveError::NotYetComputed);
        }

        Runtime::track_read(id);
        if self.inner.state.get() == MemoState::Invalid {
            self.evaluate();
        }
        Ok(self
            .inner
            .value
            .borrow()
            .clone()
            .expect("valid memo should have a value"))
    }

    /// Get the current value, recomputing if stale.
    ///
    /// Panics on a first-run self-read; use [`Memo::try_get`] in bodies that
    /// may read themselves.
    pub fn get(&self) -> T {
        self.try_get().expect("memo read before its first value")
    }

    /// Run the computation, re-deriving source edges.
    fn evaluate(&self) {
        let inner = &*self.inner;
        loop {
            Runtime::clear_sources(inner.id);
            // Valid before the body runs: a write issued inside it must be
            // able to flip this node back to Invalid and reach dependents.
            inner.state.set(MemoState::Valid);

            {
                let mut guard = EvalGuard {
                    id: inner.id,
                    state: &inner.state,
                    armed: true,
                };
                let _frame = ReactiveContext::enter(inner.id);
                let new_value = (inner.compute)();
                guard.armed = false;

                inner.run_count.set(inner.run_count.get() + 1);

                let changed = inner.value.borrow().as_ref() != Some(&new_value);
                *inner.value.borrow_mut() = Some(new_value);
                if changed {
                    // Still inside our own frame: dependents consuming this
                    // result right now (ourselves included, via a self-edge)
                    // are on the stack and get skipped.
                    Runtime::propagate_change(inner.id);
                }
            }

            // A body that invalidated itself *and* read its own (now stale)
            // cache must run again: its output is one of its inputs. Without
            // the self-read the flush loop drives the cascade instead.
            if inner.state.get() == MemoState::Valid || !Runtime::reads_itself(inner.id) {
                break;
            }
            trace!(memo = inner.id.raw(), "self-referential memo went stale, re-evaluating");
        }
    }

    /// How many times the computation has run.
    pub fn run_count(&self) -> u64 {
        self.inner.run_count.get()
    }

    /// Current validity state.
    pub fn state(&self) -> MemoState {
        self.inner.state.get()
    }

    /// Whether a value has ever been computed.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Diagnostic: number of computations currently depending on this memo.
    pub fn dependent_count(&self) -> usize {
        Runtime::dependent_count(self.inner.id)
    }
}

/// Restores a consistent state when a computation panics: the memo is left
/// invalid (retried on the next read) and the partially captured source
/// edges are discarded.
struct EvalGuard<'a> {
    id: NodeId,
    state: &'a Cell<MemoState>,
    armed: bool,
}

impl Drop for EvalGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.set(MemoState::Invalid);
            Runtime::clear_sources(self.id);
        }
    }
}

impl<T> Reactive for MemoInner<T>
where
    T: Clone + PartialEq + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Derived
    }

    fn on_invalidate(&self) -> InvalidateAction {
        if self.state.get() == MemoState::Valid {
            self.state.set(MemoState::Invalid);
            InvalidateAction::Propagate
        } else {
            InvalidateAction::Ignore
        }
    }

    fn run_pending(&self) {
        debug_assert!(false, "memos are pull-based and never queued");
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .field("run_count", &self.run_count())
            .finish()
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        Runtime::release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;

    #[test]
    fn memo_computes_on_first_access() {
        let runs = Rc::new(Cell::new(0));
        let runs_in_memo = runs.clone();

        let memo = Memo::new(move || {
            runs_in_memo.set(runs_in_memo.get() + 1);
            42
        });

        assert!(!memo.has_value());
        assert_eq!(runs.get(), 0);

        assert_eq!(memo.get(), 42);
        assert_eq!(runs.get(), 1);
        assert!(memo.has_value());
    }

    #[test]
    fn memo_caches_value_when_valid() {
        let runs = Rc::new(Cell::new(0));
        let runs_in_memo = runs.clone();

        let memo = Memo::new(move || {
            runs_in_memo.set(runs_in_memo.get() + 1);
            42
        });

        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(runs.get(), 1);
        assert_eq!(memo.run_count(), 1);
    }

    #[test]
    fn memo_recomputes_after_source_change() {
        let source = Signal::new(5);

        let source_in_memo = source.clone();
        let doubled = Memo::new(move || source_in_memo.get() * 2);

        assert_eq!(doubled.get(), 10);
        assert_eq!(doubled.state(), MemoState::Valid);

        source.set(7);
        assert_eq!(doubled.state(), MemoState::Invalid);

        assert_eq!(doubled.get(), 14);
        assert_eq!(doubled.run_count(), 2);
    }

    #[test]
    fn equal_write_leaves_memo_valid() {
        let source = Signal::new(5);

        let source_in_memo = source.clone();
        let doubled = Memo::new(move || source_in_memo.get() * 2);

        assert_eq!(doubled.get(), 10);

        source.set(5);
        assert_eq!(doubled.state(), MemoState::Valid);
        assert_eq!(doubled.get(), 10);
        assert_eq!(doubled.run_count(), 1);
    }

    #[test]
    fn memo_depends_on_memo() {
        let base = Signal::new(5);

        let base_in_memo = base.clone();
        let doubled = Memo::new(move || base_in_memo.get() * 2);

        let doubled_in_memo = doubled.clone();
        let plus_ten = Memo::new(move || doubled_in_memo.get() + 10);

        assert_eq!(plus_ten.get(), 20);

        base.set(10);
        // The invalidation wave went through `doubled` to `plus_ten`.
        assert_eq!(plus_ten.state(), MemoState::Invalid);
        assert_eq!(plus_ten.get(), 30);
        assert_eq!(doubled.get(), 20);
    }

    #[test]
    fn self_read_yields_previous_value() {
        let slot: Rc<RefCell<Option<Memo<i32>>>> = Rc::new(RefCell::new(None));

        let slot_in_memo = slot.clone();
        let memo = Memo::new(move || {
            let this = slot_in_memo.borrow().clone().expect("memo stored");
            match this.try_get() {
                Ok(previous) => previous + 1,
                Err(ReactiveError::NotYetComputed) => 0,
            }
        });
        *slot.borrow_mut() = Some(memo.clone());

        // First run: the self-read has no previous value to fall back to.
        assert_eq!(memo.get(), 0);
        assert_eq!(memo.state(), MemoState::Valid);

        // Force a recompute; the self-read now sees the previous cache.
        Runtime::invalidate(memo.id());
        assert_eq!(memo.get(), 1);
        assert_eq!(memo.run_count(), 2);
    }

    #[test]
    fn memo_clone_shares_state() {
        let memo1 = Memo::new(|| 42);
        assert_eq!(memo1.get(), 42);

        let memo2 = memo1.clone();
        assert_eq!(memo1.id(), memo2.id());
        assert!(memo2.has_value());
        assert_eq!(memo2.run_count(), 1);
    }

    #[test]
    fn memo_state_transitions() {
        let source = Signal::new(1);
        let source_in_memo = source.clone();
        let memo = Memo::new(move || source_in_memo.get());

        assert_eq!(memo.state(), MemoState::Invalid);

        memo.get();
        assert_eq!(memo.state(), MemoState::Valid);

        source.set(2);
        assert_eq!(memo.state(), MemoState::Invalid);

        memo.get();
        assert_eq!(memo.state(), MemoState::Valid);
    }
}
