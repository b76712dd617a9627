//! Reactive Primitives
//!
//! This module implements the reactive engine: signals, memos, and effects
//! over an automatically maintained dependency graph.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a container for mutable state. When a signal is read
//! inside a tracking context (a memo or effect evaluation), the signal
//! registers that computation as a dependent. When the signal's value
//! changes - by `PartialEq`, so writing an equal value is inert - its
//! dependents are invalidated.
//!
//! ## Memos
//!
//! A [`Memo`] is a derived value that caches its result. Invalidation only
//! marks it stale; it recomputes when read, which means a memo nothing reads
//! costs nothing, and a branch not taken this evaluation produces no edge
//! and cannot wake the computation next cycle.
//!
//! ## Effects
//!
//! An [`Effect`] is a side-effecting computation. Invalidation enqueues it
//! (at most once), and [`flush_effects`] drains the queue to a fixed point,
//! pulling stale memos along the way. Effects whose bodies write to their
//! own sources re-enqueue themselves and settle across flush iterations.
//!
//! ## Untracked reads
//!
//! [`untracked`] runs a closure whose reads register no dependencies - for
//! peeking at state without subscribing to it.
//!
//! # Implementation Notes
//!
//! Dependency detection uses a thread-local context stack: evaluating a node
//! pushes a tracking frame, and reads consult the topmost frame. This
//! "automatic dependency tracking" approach is the one used by SolidJS,
//! Vue 3, and Leptos. Edges are re-derived from scratch on every evaluation,
//! so the graph always reflects the most recent run. The whole engine is
//! single-threaded; every thread gets an independent runtime.

mod context;
mod effect;
mod error;
mod memo;
mod runtime;
mod signal;

pub use context::{untracked, ReactiveContext, UntrackedScope};
pub use effect::Effect;
pub use error::ReactiveError;
pub use memo::{Memo, MemoState};
pub use runtime::{flush_effects, has_pending_effects, InvalidateAction, Reactive, Runtime};
pub use signal::Signal;
