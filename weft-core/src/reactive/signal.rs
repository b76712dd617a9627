//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive: a cell holding a value,
//! with no sources of its own. It is the only node kind the host writes to.
//!
//! # How Signals Work
//!
//! 1. When a signal is read inside a tracking context (a memo or effect
//!    evaluation), the read registers an edge from the signal to that
//!    computation.
//!
//! 2. When a signal's value changes, its dependents are invalidated: memos
//!    go stale, effects are queued for the next flush. Nothing re-runs
//!    inline - not even when the write comes from inside a dependent's own
//!    body.
//!
//! 3. A write of a value equal to the current one (by `PartialEq`) is a
//!    no-op for propagation.
//!
//! Handles are `Clone` and share state; the signal's graph entries are
//! released when the last handle drops.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use tracing::trace;

use crate::graph::NodeId;

use super::runtime::Runtime;

/// A reactive value cell.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value (tracked inside memo/effect evaluations)
/// let value = count.get();
///
/// // Update the value (invalidates dependents)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    inner: Rc<SignalInner<T>>,
}

struct SignalInner<T> {
    id: NodeId,
    value: RefCell<T>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: NodeId::new(),
                value: RefCell::new(value),
            }),
        }
    }

    /// Get the signal's node id.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the current value.
    ///
    /// If called within a tracking context, registers the current
    /// computation as a dependent.
    pub fn get(&self) -> T {
        Runtime::track_read(self.inner.id);
        self.inner.value.borrow().clone()
    }

    /// Get the current value without tracking a dependency.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Set a new value and invalidate dependents.
    ///
    /// Writing a value equal to the current one changes nothing and wakes
    /// nobody. Writes issued from inside a running memo or effect are legal;
    /// if the writer depends on this signal it is invalidated like any other
    /// dependent, but never re-entered synchronously.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        trace!(signal = self.inner.id.raw(), "value changed");
        Runtime::invalidate_dependents(self.inner.id);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let current = self.inner.value.borrow();
            f(&current)
        };
        self.set(next);
    }

    /// Diagnostic: number of computations currently depending on this
    /// signal.
    pub fn dependent_count(&self) -> usize {
        Runtime::dependent_count(self.inner.id)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::release(self.id);
    }
}
