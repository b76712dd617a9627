//! Node Identity
//!
//! Every participant in the dependency graph - signal, memo, or effect -
//! carries a [`NodeId`]. The id is the key on both sides of the edge index
//! and the handle the runtime uses to dispatch invalidations.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    ///
    /// Uses an atomic counter so ids stay unique even when several engines
    /// run on different threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A source node (signal). These are the roots of the graph.
    /// They have no sources of their own, only dependents.
    Source,

    /// A derived node (memo). These have sources and may have dependents.
    /// They cache their computed value.
    Derived,

    /// An effect node. These are leaves of the graph: they have sources but
    /// no dependents, producing side effects rather than values.
    Effect,
}
