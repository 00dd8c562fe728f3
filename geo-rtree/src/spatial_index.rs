//! Thread-safe spatial index interface.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::bounding_box::BoundingBox;
use crate::dynamic_rtree::{BalanceHeuristic, DynamicRTree, IndexFile, IndexResult};

/// A spatial index that can be shared between threads.
///
/// Query methods return owned items, so no lock is held once they return.
pub trait SpatialIndex<T>: Send + Sync {
    /// Adds an item to the index.
    fn add(&self, bounds: &BoundingBox, item: T) -> IndexResult<()>;

    /// Removes an item stored under `bounds`.
    fn remove(&self, bounds: &BoundingBox, item: &T) -> bool;

    /// Finds the items whose bounds intersect `window`.
    fn find_intersecting(&self, window: &BoundingBox) -> Vec<T>;

    /// Finds the items whose bounds lie inside `window`.
    fn find_contained(&self, window: &BoundingBox) -> Vec<T>;

    /// Finds the K nearest items to a point using branch-and-bound search.
    fn find_nearest(
        &self,
        center_x: f64,
        center_y: f64,
        k: usize,
        max_distance: Option<f64>,
    ) -> Vec<(T, f64)>;

    /// Finds items within a specific distance of a point (range query).
    fn find_within_distance(&self, center_x: f64, center_y: f64, distance: f64) -> Vec<(T, f64)> {
        self.find_nearest(center_x, center_y, usize::MAX, Some(distance))
    }

    /// Gets the number of indexed items.
    fn size(&self) -> u64;

    /// Removes all items.
    fn clear(&self);
}

/// A [`DynamicRTree`] behind a reader-writer lock.
///
/// Cloning is cheap and every clone refers to the same tree.
///
/// ```rust
/// use geo_rtree::{BoundingBox, SharedRTree, SpatialIndex};
///
/// let index = SharedRTree::new();
/// let writer = index.clone();
/// std::thread::spawn(move || {
///     writer.add(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 7u64).unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(index.find_intersecting(&BoundingBox::from_point(0.5, 0.5)), vec![7]);
/// ```
pub struct SharedRTree<T> {
    inner: Arc<SharedRTreeInner<T>>,
}

struct SharedRTreeInner<T> {
    tree: RwLock<DynamicRTree<T>>,
}

impl<T> SharedRTree<T> {
    pub fn new() -> Self {
        Self::from_tree(DynamicRTree::new())
    }

    pub fn with_balance(balance: BalanceHeuristic) -> IndexResult<Self> {
        Ok(Self::from_tree(DynamicRTree::with_balance(balance)?))
    }

    pub fn from_tree(tree: DynamicRTree<T>) -> Self {
        Self {
            inner: Arc::new(SharedRTreeInner {
                tree: RwLock::new(tree),
            }),
        }
    }

    /// Run `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&DynamicRTree<T>) -> R) -> R {
        f(&self.inner.tree.read())
    }

    /// Run `f` with exclusive access to the tree.
    pub fn write<R>(&self, f: impl FnOnce(&mut DynamicRTree<T>) -> R) -> R {
        f(&mut self.inner.tree.write())
    }

    /// Save the tree to `file` under a shared lock.
    pub fn save(&self, file: &IndexFile) -> IndexResult<()>
    where
        T: Serialize,
    {
        file.save(&*self.inner.tree.read())
    }
}

impl<T> Clone for SharedRTree<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedRTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SpatialIndex<T> for SharedRTree<T>
where
    T: Clone + PartialEq + Send + Sync,
{
    fn add(&self, bounds: &BoundingBox, item: T) -> IndexResult<()> {
        self.inner.tree.write().insert(*bounds, item)
    }

    fn remove(&self, bounds: &BoundingBox, item: &T) -> bool {
        self.inner.tree.write().remove(bounds, item)
    }

    fn find_intersecting(&self, window: &BoundingBox) -> Vec<T> {
        self.inner.tree.read().query(window).cloned().collect()
    }

    fn find_contained(&self, window: &BoundingBox) -> Vec<T> {
        self.inner.tree.read().query_contained(window).cloned().collect()
    }

    fn find_nearest(
        &self,
        center_x: f64,
        center_y: f64,
        k: usize,
        max_distance: Option<f64>,
    ) -> Vec<(T, f64)> {
        self.inner
            .tree
            .read()
            .find_nearest(center_x, center_y, k, max_distance)
            .into_iter()
            .map(|(item, dist)| (item.clone(), dist))
            .collect()
    }

    fn size(&self) -> u64 {
        self.inner.tree.read().total_item_count()
    }

    fn clear(&self) {
        self.inner.tree.write().clear();
    }
}
