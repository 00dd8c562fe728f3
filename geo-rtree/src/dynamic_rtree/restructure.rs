//! Self-optimizing wrapper around [`DynamicRTree`].
//!
//! After every successful mutation the wrapper asks its
//! [`RestructureStrategy`] whether the tree should be rebuilt, and rebuilds
//! it in Hilbert order when the answer is yes.

use crate::bounding_box::BoundingBox;

use super::insert_strategy::{InsertStrategy, QuadraticInsert};
use super::query::Query;
use super::rtree_impl::DynamicRTree;
use super::rtree_types::{FragmentationMetrics, IndexError, IndexResult, RTreeStats, RebuildStats};
use super::split_strategy::{QuadraticSplit, SplitStrategy};

/// Decides when a tree is worth rebuilding.
pub trait RestructureStrategy {
    /// Called once after each successful insert or removal.
    fn should_restructure(&mut self, stats: &RTreeStats, metrics: &FragmentationMetrics) -> bool;
}

/// Never rebuilds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRestructure;

impl RestructureStrategy for NeverRestructure {
    fn should_restructure(&mut self, _stats: &RTreeStats, _metrics: &FragmentationMetrics) -> bool {
        false
    }
}

/// Rebuilds after every `every` mutations.
#[derive(Debug, Clone)]
pub struct PeriodicRestructure {
    every: u64,
    mutations: u64,
}

impl PeriodicRestructure {
    pub fn new(every: u64) -> IndexResult<Self> {
        if every == 0 {
            return Err(IndexError::InvalidArgument(
                "restructure period must be at least 1".into(),
            ));
        }
        Ok(Self { every, mutations: 0 })
    }
}

impl RestructureStrategy for PeriodicRestructure {
    fn should_restructure(&mut self, _stats: &RTreeStats, _metrics: &FragmentationMetrics) -> bool {
        self.mutations += 1;
        if self.mutations >= self.every {
            self.mutations = 0;
            true
        } else {
            false
        }
    }
}

/// Rebuilds when [`FragmentationMetrics`] recommends it and the tree holds
/// at least `min_items` entries.
#[derive(Debug, Clone, Copy)]
pub struct FragmentationRestructure {
    min_items: u64,
}

impl FragmentationRestructure {
    pub fn new(min_items: u64) -> Self {
        Self { min_items }
    }
}

impl Default for FragmentationRestructure {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RestructureStrategy for FragmentationRestructure {
    fn should_restructure(&mut self, stats: &RTreeStats, metrics: &FragmentationMetrics) -> bool {
        stats.total_items >= self.min_items && metrics.should_rebuild
    }
}

/// A [`DynamicRTree`] that rebuilds itself when its strategy says so.
///
/// ```rust
/// use geo_rtree::{BoundingBox, DynamicRTree, PeriodicRestructure, SelfOptimizingRTree};
///
/// let strategy = PeriodicRestructure::new(2).unwrap();
/// let mut tree = SelfOptimizingRTree::new(DynamicRTree::new(), strategy);
///
/// tree.insert(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1).unwrap();
/// tree.insert(BoundingBox::new(2.0, 2.0, 3.0, 3.0), 2).unwrap();
/// assert_eq!(tree.restructure_count(), 1);
/// ```
#[derive(Debug)]
pub struct SelfOptimizingRTree<T, R = NeverRestructure, I = QuadraticInsert, S = QuadraticSplit> {
    tree: DynamicRTree<T, I, S>,
    strategy: R,
    restructures: u64,
    last_rebuild: Option<RebuildStats>,
}

impl<T, R, I, S> SelfOptimizingRTree<T, R, I, S>
where
    R: RestructureStrategy,
    I: InsertStrategy,
    S: SplitStrategy,
{
    pub fn new(tree: DynamicRTree<T, I, S>, strategy: R) -> Self {
        Self {
            tree,
            strategy,
            restructures: 0,
            last_rebuild: None,
        }
    }

    pub fn insert(&mut self, bounds: BoundingBox, item: T) -> IndexResult<()> {
        self.tree.insert(bounds, item)?;
        self.after_mutation();
        Ok(())
    }

    /// Returns `true` when an entry was removed.
    pub fn remove(&mut self, bounds: &BoundingBox, item: &T) -> bool
    where
        T: PartialEq,
    {
        let removed = self.tree.remove(bounds, item);
        if removed {
            self.after_mutation();
        }
        removed
    }

    pub fn query(&self, window: &BoundingBox) -> Query<'_, T> {
        self.tree.query(window)
    }

    pub fn tree(&self) -> &DynamicRTree<T, I, S> {
        &self.tree
    }

    pub fn into_inner(self) -> DynamicRTree<T, I, S> {
        self.tree
    }

    /// Number of rebuilds performed so far
    pub fn restructure_count(&self) -> u64 {
        self.restructures
    }

    pub fn last_rebuild(&self) -> Option<&RebuildStats> {
        self.last_rebuild.as_ref()
    }

    fn after_mutation(&mut self) {
        let stats = self.tree.stats();
        let metrics = FragmentationMetrics::calculate(&stats, self.tree.balance().max_fill());
        if !self.strategy.should_restructure(&stats, &metrics) {
            return;
        }

        log::debug!(
            "Restructuring R-Tree: {} items, fragmentation {}",
            stats.total_items,
            metrics.severity
        );
        self.last_rebuild = Some(self.tree.rebuild());
        self.restructures += 1;
    }
}
