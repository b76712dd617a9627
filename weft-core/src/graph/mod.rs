//! Dependency Graph
//!
//! This module implements the dependency graph that tracks relationships
//! between reactive values and computations.
//!
//! # Overview
//!
//! The graph is a directed graph where:
//!
//! - Nodes represent reactive values (signals) or computations (memos,
//!   effects), identified by [`NodeId`].
//! - Edges run `source -> dependent`: if A reads B, there is an edge from B
//!   to A.
//!
//! When a signal changes, the runtime walks the dependents side of the index
//! to invalidate affected nodes. When a computation re-runs, it clears its
//! sources side and the reads performed during the run re-derive the edges.
//!
//! # Design Decisions
//!
//! 1. The index is centralized rather than scattered across the nodes: both
//!    directions live in one structure keyed by id, which keeps edge removal
//!    symmetric and makes released nodes cheap to strip out.
//!
//! 2. Nothing in the graph owns a node. Ids are plain values; the runtime's
//!    registry resolves them to live nodes, and a dangling id simply resolves
//!    to nothing. This is what lets `source -> dependent` cycles exist
//!    without leaking.

mod edges;
mod node;

pub use edges::DependencyGraph;
pub use node::{NodeId, NodeKind};
