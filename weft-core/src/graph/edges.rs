//! Edge Index
//!
//! The dependency graph stores `source -> dependent` edges indexed by node
//! id on both sides, so that a write can find the dependents of a source in
//! O(1) and a re-evaluating dependent can drop its old sources in one pass.
//!
//! Neither side owns the other: the graph holds ids only, and the runtime
//! resolves ids to live nodes through its registry. Edges are re-derived on
//! every evaluation - a dependent clears its sources before running and the
//! reads performed during the run put the new edges back.

use std::collections::{HashMap, HashSet};

use super::node::NodeId;

/// Bidirectional index of `source -> dependent` edges.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// For each dependent, the set of sources it read during its most
    /// recent evaluation.
    sources: HashMap<NodeId, HashSet<NodeId>>,

    /// For each source, the set of dependents that read it.
    dependents: HashMap<NodeId, HashSet<NodeId>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` read `source`.
    ///
    /// Inserting the same edge twice is a no-op.
    pub fn add_edge(&mut self, source: NodeId, dependent: NodeId) {
        self.dependents.entry(source).or_default().insert(dependent);
        self.sources.entry(dependent).or_default().insert(source);
    }

    /// Remove every incoming edge of `dependent`.
    ///
    /// Called right before a node re-evaluates, so the edge set afterwards
    /// reflects exactly the reads of the new run.
    pub fn clear_sources(&mut self, dependent: NodeId) {
        if let Some(sources) = self.sources.remove(&dependent) {
            for source in sources {
                if let Some(set) = self.dependents.get_mut(&source) {
                    set.remove(&dependent);
                    if set.is_empty() {
                        self.dependents.remove(&source);
                    }
                }
            }
        }
    }

    /// Remove a node and every edge that mentions it, in both roles.
    pub fn remove_node(&mut self, id: NodeId) {
        self.clear_sources(id);
        if let Some(dependents) = self.dependents.remove(&id) {
            for dependent in dependents {
                if let Some(set) = self.sources.get_mut(&dependent) {
                    set.remove(&id);
                    if set.is_empty() {
                        self.sources.remove(&dependent);
                    }
                }
            }
        }
    }

    /// Snapshot of the dependents of `source`.
    pub fn dependents_of(&self, source: NodeId) -> Vec<NodeId> {
        self.dependents
            .get(&source)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the sources of `dependent`.
    pub fn sources_of(&self, dependent: NodeId) -> Vec<NodeId> {
        self.sources
            .get(&dependent)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the edge `source -> dependent` exists.
    pub fn has_edge(&self, source: NodeId, dependent: NodeId) -> bool {
        self.dependents
            .get(&source)
            .map(|set| set.contains(&dependent))
            .unwrap_or(false)
    }

    /// Number of dependents of `source`.
    pub fn dependent_count(&self, source: NodeId) -> usize {
        self.dependents.get(&source).map(HashSet::len).unwrap_or(0)
    }

    /// Number of sources of `dependent`.
    pub fn source_count(&self, dependent: NodeId) -> usize {
        self.sources.get(&dependent).map(HashSet::len).unwrap_or(0)
    }
}
