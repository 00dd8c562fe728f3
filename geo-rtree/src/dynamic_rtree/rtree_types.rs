//! Core types and data structures for the dynamic R-Tree.
//!
//! This module defines the fundamental types used throughout the R-Tree:
//! - Error types and result types
//! - Index entries and node types (Leaf and Internal)
//! - Statistics structures
//! - The persisted index header

use crate::bounding_box::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in spatial indexing operations
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported index format version {found}")]
    UnsupportedFormat { found: u16 },

    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("Node ceiling of {ceiling} nodes reached")]
    NodeCeilingReached { ceiling: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Index file is closed")]
    Closed,
}

impl IndexError {
    /// Returns `true` when a persisted index cannot be used and should be
    /// discarded and rebuilt from source data.
    pub fn is_obsolete(&self) -> bool {
        matches!(self, IndexError::UnsupportedFormat { .. } | IndexError::Corrupt(_))
    }
}

/// Result type for spatial index operations
pub type IndexResult<T> = Result<T, IndexError>;

// ============================================================================
// Node addressing
// ============================================================================

/// Index of a node inside the tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Entries and nodes
// ============================================================================

/// A bounding box paired with either a payload (leaf level) or a child node
/// (internal level).
///
/// Entries are never edited in place; a changed entry is replaced by a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry<V> {
    bounds: BoundingBox,
    value: V,
}

impl<V> IndexEntry<V> {
    pub fn new(bounds: BoundingBox, value: V) -> Self {
        Self { bounds, value }
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (BoundingBox, V) {
        (self.bounds, self.value)
    }
}

/// A child reference in an internal node
pub type ChildRef = IndexEntry<NodeId>;

/// Entries held by a node
#[derive(Debug, Clone)]
pub enum NodeKind<T> {
    /// Leaf node containing payload entries
    Leaf { entries: Vec<IndexEntry<T>> },
    /// Internal node containing child references
    Internal {
        children: Vec<ChildRef>,
        level: u32, // Height from leaf level (leaves are 0)
    },
}

/// A node of the tree as stored in the arena.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub(crate) kind: NodeKind<T>,
    pub(crate) bounds: BoundingBox,
    pub(crate) parent: Option<NodeId>,
}

impl<T> Node<T> {
    pub(crate) fn leaf(entries: Vec<IndexEntry<T>>, parent: Option<NodeId>) -> Self {
        let bounds = union_of(&entries);
        Self {
            kind: NodeKind::Leaf { entries },
            bounds,
            parent,
        }
    }

    pub(crate) fn internal(children: Vec<ChildRef>, level: u32, parent: Option<NodeId>) -> Self {
        let bounds = union_of(&children);
        Self {
            kind: NodeKind::Internal { children, level },
            bounds,
            parent,
        }
    }

    pub fn kind(&self) -> &NodeKind<T> {
        &self.kind
    }

    /// Cached union of the entries' bounds
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn level(&self) -> u32 {
        match &self.kind {
            NodeKind::Leaf { .. } => 0,
            NodeKind::Internal { level, .. } => *level,
        }
    }

    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf { entries } => entries.len(),
            NodeKind::Internal { children, .. } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the bounding box enclosing all children/entries
    pub fn compute_bounds(&self) -> BoundingBox {
        match &self.kind {
            NodeKind::Leaf { entries } => union_of(entries),
            NodeKind::Internal { children, .. } => union_of(children),
        }
    }

    pub(crate) fn refresh_bounds(&mut self) {
        self.bounds = self.compute_bounds();
    }
}

/// Union of the bounds of a slice of entries; empty for an empty slice.
pub(crate) fn union_of<V>(entries: &[IndexEntry<V>]) -> BoundingBox {
    entries
        .iter()
        .fold(BoundingBox::empty(), |acc, e| acc.union(e.bounds()))
}

// ============================================================================
// Statistics
// ============================================================================

/// Statistics about the shape of an R-Tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RTreeStats {
    pub total_items: u64,
    pub total_nodes: u64,
    pub leaf_nodes: u64,
    pub tree_height: u32,
    /// Mean entries per node divided by the maximum fill (0-1)
    pub average_fill: f64,
}

/// Statistics about index rebuild/optimization operations
#[derive(Debug, Clone)]
pub struct RebuildStats {
    /// Total entries reindexed
    pub entries_reindexed: u64,
    /// Number of nodes before rebuild
    pub nodes_before: u64,
    /// Number of nodes after rebuild
    pub nodes_after: u64,
    /// Tree height before rebuild
    pub height_before: u32,
    /// Tree height after rebuild
    pub height_after: u32,
    /// Change in average fill, in percentage points
    pub fill_factor_improvement: f64,
}

/// Metrics for detecting index fragmentation
#[derive(Debug, Clone)]
pub struct FragmentationMetrics {
    /// Percentage of unused entry slots across all nodes (0-100)
    pub wasted_space_percent: f64,
    /// Actual height vs optimal height ratio
    pub tree_balance_ratio: f64,
    /// Number of nodes currently allocated
    pub active_nodes: u64,
    /// Is fragmentation above recommended rebuild threshold?
    pub should_rebuild: bool,
    /// Fragmentation severity: "None", "Low", "Medium", "High"
    pub severity: String,
}

impl FragmentationMetrics {
    /// Calculate fragmentation metrics from current tree state
    ///
    /// Fragmentation is considered high when:
    /// - Wasted space exceeds 50%
    /// - Tree is imbalanced (height ratio > 1.3)
    pub fn calculate(stats: &RTreeStats, max_fill: usize) -> Self {
        let wasted_space_percent = if stats.total_nodes > 0 {
            ((1.0 - stats.average_fill) * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        // Optimal height = log(entries) with branching factor max_fill
        let branching_factor = max_fill.max(2) as f64;
        let optimal_height = if stats.total_items > 0 {
            ((stats.total_items as f64).log(branching_factor).ceil() as u32).max(1)
        } else {
            0
        };
        let tree_balance_ratio = if optimal_height > 0 {
            stats.tree_height as f64 / optimal_height as f64
        } else {
            1.0
        };

        let severity_score = (wasted_space_percent / 50.0) * 0.6
            + ((tree_balance_ratio - 1.0).max(0.0) / 0.3) * 0.4;

        let (severity, should_rebuild) = match severity_score {
            s if s < 0.3 => ("None".to_string(), false),
            s if s < 0.6 => ("Low".to_string(), false),
            s if s < 0.85 => ("Medium".to_string(), false),
            _ => ("High".to_string(), true),
        };

        Self {
            wasted_space_percent,
            tree_balance_ratio,
            active_nodes: stats.total_nodes,
            should_rebuild,
            severity,
        }
    }
}

// ============================================================================
// Persisted header
// ============================================================================

/// Header written after the magic and version tag of a saved index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub min_fill: u64,
    pub max_fill: u64,
    pub node_ceiling: Option<u64>,
    pub item_count: u64,
    pub node_count: u64,
    pub height: u32,
}
