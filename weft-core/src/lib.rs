//! Weft Core
//!
//! This crate provides a fine-grained reactive runtime: a dependency-tracking
//! evaluator over three node kinds - mutable signals, memoized memos, and
//! side-effecting effects - that re-runs the minimum necessary set of
//! dependents when sources change.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: the reactive primitives, the evaluation context stack, and
//!   the invalidation/flush engine
//! - `graph`: node identity and the `source -> dependent` edge index
//!
//! Invalidation is push-based and cheap (flags and queue entries only);
//! recomputation is pull-based - memos re-evaluate when read, effects when
//! flushed. The combination avoids glitches and over-reaction: one write
//! reaching an effect over several paths still re-runs it once per flush.
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_core::reactive::{flush_effects, Effect, Memo, Signal};
//!
//! let count = Signal::new(1);
//!
//! let count_in_memo = count.clone();
//! let doubled = Memo::new(move || count_in_memo.get() * 2);
//!
//! let doubled_in_effect = doubled.clone();
//! let _printer = Effect::new(move || {
//!     println!("doubled = {}", doubled_in_effect.get());
//! });
//!
//! flush_effects(); // prints: doubled = 2
//!
//! count.set(5);
//! flush_effects(); // prints: doubled = 10
//! ```

pub mod graph;
pub mod reactive;
