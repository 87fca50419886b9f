//! Run-scoped deduplication
//!
//! Tracks `(label, id)` pairs seen during one export. Nodes and edges use
//! separate key spaces, ids are compared case-sensitively, and only the
//! first occurrence of a key is written.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::models::{GraphEdge, GraphNode};

// ============================================================================
// Key Sets
// ============================================================================

/// Seen ids and duplicate counter per label
#[derive(Debug, Default)]
struct KeySpace {
    ids: HashMap<String, HashSet<String>>,
    duplicates: BTreeMap<String, u64>,
}

impl KeySpace {
    fn seen_before(&mut self, label: &str, id: &str) -> bool {
        if let Some(ids) = self.ids.get_mut(label) {
            if ids.contains(id) {
                *self.duplicates.entry(label.to_string()).or_default() += 1;
                return true;
            }
            ids.insert(id.to_string());
            return false;
        }
        self.ids
            .entry(label.to_string())
            .or_default()
            .insert(id.to_string());
        false
    }

    fn len(&self) -> usize {
        self.ids.values().map(HashSet::len).sum()
    }
}

// ============================================================================
// Deduplicator
// ============================================================================

/// Deduplication context owned by one export session
#[derive(Debug)]
pub struct Deduplicator {
    enabled: bool,
    nodes: KeySpace,
    edges: KeySpace,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            enabled: true,
            nodes: KeySpace::default(),
            edges: KeySpace::default(),
        }
    }

    /// Deduplicator that lets every record through
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a node key; `true` if it was already seen
    pub fn node_seen_before(&mut self, label: &str, id: &str) -> bool {
        self.enabled && self.nodes.seen_before(label, id)
    }

    /// Record an edge key; `true` if it was already seen
    pub fn edge_seen_before(&mut self, label: &str, id: &str) -> bool {
        self.enabled && self.edges.seen_before(label, id)
    }

    pub fn is_duplicate_node(&mut self, node: &GraphNode) -> bool {
        let duplicate = self.node_seen_before(&node.label, &node.id);
        if duplicate {
            debug!(label = %node.label, id = %node.id, "Duplicate node skipped");
        }
        duplicate
    }

    pub fn is_duplicate_edge(&mut self, edge: &GraphEdge) -> bool {
        let duplicate = self.edge_seen_before(&edge.label, edge.dedup_id());
        if duplicate {
            debug!(label = %edge.label, id = %edge.dedup_id(), "Duplicate edge skipped");
        }
        duplicate
    }

    /// Duplicate counts collected so far
    pub fn report(&self) -> DedupReport {
        DedupReport {
            node_duplicates: self.nodes.duplicates.clone(),
            edge_duplicates: self.edges.duplicates.clone(),
            unique_nodes: self.nodes.len(),
            unique_edges: self.edges.len(),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Per-label duplicate counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupReport {
    pub node_duplicates: BTreeMap<String, u64>,
    pub edge_duplicates: BTreeMap<String, u64>,
    pub unique_nodes: usize,
    pub unique_edges: usize,
}

impl DedupReport {
    pub fn total_duplicates(&self) -> u64 {
        self.node_duplicates.values().sum::<u64>() + self.edge_duplicates.values().sum::<u64>()
    }

    /// Duplicates of one label across nodes and edges
    pub fn duplicates_for(&self, label: &str) -> u64 {
        self.node_duplicates.get(label).copied().unwrap_or(0)
            + self.edge_duplicates.get(label).copied().unwrap_or(0)
    }
}

impl fmt::Display for DedupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unique nodes, {} unique edges, {} duplicates skipped",
            self.unique_nodes,
            self.unique_edges,
            self.total_duplicates()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_wins() {
        let mut dedup = Deduplicator::new();
        assert!(!dedup.node_seen_before("protein", "P1"));
        assert!(dedup.node_seen_before("protein", "P1"));
        assert!(dedup.node_seen_before("protein", "P1"));
        assert_eq!(dedup.report().node_duplicates["protein"], 2);
        assert_eq!(dedup.report().unique_nodes, 1);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut dedup = Deduplicator::new();
        assert!(!dedup.node_seen_before("protein", "p1"));
        assert!(!dedup.node_seen_before("protein", "P1"));
    }

    #[test]
    fn test_labels_and_kinds_are_separate() {
        let mut dedup = Deduplicator::new();
        assert!(!dedup.node_seen_before("protein", "X"));
        assert!(!dedup.node_seen_before("gene", "X"));
        assert!(!dedup.edge_seen_before("protein", "X"));
        assert_eq!(dedup.report().total_duplicates(), 0);
    }

    #[test]
    fn test_disabled() {
        let mut dedup = Deduplicator::disabled();
        assert!(!dedup.node_seen_before("protein", "P1"));
        assert!(!dedup.node_seen_before("protein", "P1"));
        assert_eq!(dedup.report(), DedupReport::default());
    }

    #[test]
    fn test_edge_without_id_uses_endpoints() {
        let mut dedup = Deduplicator::new();
        let edge = GraphEdge::new(None, "A", "B", "binding");
        assert!(!dedup.is_duplicate_edge(&edge));
        assert!(dedup.is_duplicate_edge(&edge));

        let reversed = GraphEdge::new(None, "B", "A", "binding");
        assert!(!dedup.is_duplicate_edge(&reversed));
        assert_eq!(dedup.report().duplicates_for("binding"), 1);
    }

    #[test]
    fn test_withheld_ids_still_tell_edges_apart() {
        let mut dedup = Deduplicator::new();
        let edge = |id: &str| GraphEdge {
            id: None,
            ..GraphEdge::new(Some(id.to_string()), "A", "B", "regulates")
        };
        assert!(!dedup.is_duplicate_edge(&edge("r1")));
        assert!(!dedup.is_duplicate_edge(&edge("r2")));
        assert!(dedup.is_duplicate_edge(&edge("r1")));
        assert_eq!(dedup.report().duplicates_for("regulates"), 1);
    }
}
