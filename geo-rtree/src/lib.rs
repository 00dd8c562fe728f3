//! # geo_rtree - Dynamic R-Tree Spatial Index
//!
//! This crate provides a dynamic 2D R-Tree that maps bounding boxes to
//! arbitrary payloads, with a compact binary format for saving indexes to
//! disk and loading them back.
//!
//! ## Features
//!
//! - **Dynamic**: Insert and remove at any time; nodes split and condense
//! - **Pluggable**: Insert and split algorithms are traits, Guttman's
//!   quadratic variants by default
//! - **Lazy Queries**: Window queries are iterators that borrow the tree
//! - **Persistent**: Versioned binary format, checked fully on load
//! - **Self-Optimizing**: Optional wrapper that rebuilds the tree on demand
//! - **Thread Safe**: [`SharedRTree`] for concurrent readers and writers
//!
//! ## Quick Start
//!
//! ```rust
//! use geo_rtree::{BoundingBox, DynamicRTree};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tree = DynamicRTree::new();
//! tree.insert(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1u64)?;
//! tree.insert(BoundingBox::new(50.0, 50.0, 60.0, 60.0), 2u64)?;
//!
//! let window = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
//! let hits: Vec<u64> = tree.query(&window).copied().collect();
//! assert_eq!(hits, vec![1]);
//!
//! // Save and load
//! let mut bytes = Vec::new();
//! tree.save_index(&mut bytes)?;
//! let loaded: DynamicRTree<u64> = DynamicRTree::from_stream(&mut bytes.as_slice())?;
//! assert_eq!(loaded.total_item_count(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Index Files
//!
//! ```rust,no_run
//! use geo_rtree::{BoundingBox, DynamicRTree, IndexFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = IndexFile::open_or_create("places.grtx")?;
//! let tree: DynamicRTree<u64> = file.load_or_rebuild(|| {
//!     let mut tree = DynamicRTree::new();
//!     tree.insert(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1)?;
//!     Ok(tree)
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod bounding_box;
pub mod dynamic_rtree;
pub mod hilbert;
pub mod spatial_index;

pub use bounding_box::BoundingBox;
pub use dynamic_rtree::{
    BalanceHeuristic, DynamicRTree, FragmentationMetrics, FragmentationRestructure, IndexEntry,
    IndexError, IndexFile, IndexResult, InsertStrategy, NeverRestructure, Node, NodeId, NodeKind,
    PeriodicRestructure, QuadraticInsert, QuadraticSplit, Query, RTreeStats, RebuildStats,
    RestructureStrategy, SelfOptimizingRTree, SplitStrategy,
};
pub use spatial_index::{SharedRTree, SpatialIndex};
