//! Evaluation Context
//!
//! The context stack tracks which computation is currently running. This
//! enables automatic dependency tracking: when a signal or memo is read, the
//! runtime can register the current computation as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. A frame is either *tracking* - a
//! memo or effect is evaluating, and reads should register edges against it
//! - or *untracked*, which masks registration for everything read while it
//! is topmost. Entering a context returns an RAII guard; the guard's `Drop`
//! pops the frame, so the stack stays balanced even when a computation
//! panics.
//!
//! Nested contexts work the obvious way: a memo read from inside an effect
//! pushes its own tracking frame on top, and reads inside the memo register
//! against the memo, not the effect. An untracked frame only masks the
//! frames below it - a tracking frame pushed on top of it tracks normally.

use std::cell::RefCell;

use crate::graph::NodeId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

/// An entry in the context stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// The node currently evaluating; reads register edges against it.
    Track(NodeId),
    /// Reads register nothing while this frame is topmost.
    Untrack,
}

/// Guard for a tracking frame. Popped on drop.
pub struct ReactiveContext {
    node: NodeId,
}

impl ReactiveContext {
    /// Enter a tracking context for the given node.
    ///
    /// While this context is topmost, any signal or memo that is read will
    /// register the node as a dependent.
    pub fn enter(node: NodeId) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Frame::Track(node)));
        Self { node }
    }

    /// The node reads should register against, if any.
    ///
    /// Returns the topmost frame's node, or `None` when the stack is empty
    /// or an untracked frame is on top.
    pub fn current_tracker() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| match stack.borrow().last() {
            Some(Frame::Track(node)) => Some(*node),
            _ => None,
        })
    }

    /// Whether `node` has a tracking frame anywhere on the stack.
    ///
    /// This is the cycle check: a memo whose frame is still on the stack is
    /// mid-evaluation, and reading it must not recurse into it.
    pub fn is_tracking(node: NodeId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|frame| *frame == Frame::Track(node))
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Catch mismatched enter/exit pairs early.
            debug_assert_eq!(
                popped,
                Some(Frame::Track(self.node)),
                "context stack out of balance: expected tracking frame for {:?}",
                self.node
            );
        });
    }
}

/// Guard for an untracked frame. Popped on drop.
pub struct UntrackedScope;

impl UntrackedScope {
    /// Enter an untracked scope.
    pub fn enter() -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Frame::Untrack));
        Self
    }
}

impl Drop for UntrackedScope {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(Frame::Untrack), "context stack out of balance");
        });
    }
}

/// Run `thunk` without registering dependencies.
///
/// Reads performed inside the thunk see current values but create no edges,
/// so later changes to those sources will not re-run the caller. Writes are
/// unaffected - a `set` inside `untracked` still invalidates dependents.
pub fn untracked<R>(thunk: impl FnOnce() -> R) -> R {
    let _scope = UntrackedScope::enter();
    thunk()
}
