//! Dynamic R-Tree with pluggable insertion and split strategies.
//!
//! This module provides an in-memory R-Tree that supports:
//! - Guttman's quadratic insert and split (replaceable through traits)
//! - Lazy window queries that borrow the tree
//! - Removal with condensing and orphan reinsertion
//! - A versioned binary format for saving and loading whole indexes
//! - A self-optimizing wrapper that rebuilds on demand

pub mod balance;
pub mod insert_strategy;
mod node_arena;
pub mod persistence;
pub mod query;
pub mod restructure;
pub mod rtree_constants;
mod rtree_impl;
pub mod rtree_storage;
pub mod rtree_types;
pub mod split_strategy;

pub use balance::BalanceHeuristic;
pub use insert_strategy::{InsertStrategy, QuadraticInsert};
pub use query::Query;
pub use restructure::{
    FragmentationRestructure, NeverRestructure, PeriodicRestructure, RestructureStrategy,
    SelfOptimizingRTree,
};
pub use rtree_constants::{DEFAULT_MAX_FILL, DEFAULT_MIN_FILL, FORMAT_VERSION};
pub use rtree_impl::DynamicRTree;
pub use rtree_storage::IndexFile;
pub use rtree_types::{
    ChildRef, FragmentationMetrics, IndexEntry, IndexError, IndexHeader, IndexResult, Node,
    NodeId, NodeKind, RTreeStats, RebuildStats,
};
pub use split_strategy::{QuadraticSplit, SplitStrategy};
