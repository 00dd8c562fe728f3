//! Subtree selection during insertion.

use crate::bounding_box::BoundingBox;

use super::rtree_types::ChildRef;

/// Chooses which child of an internal node receives a new entry.
///
/// The tree calls this once per level while descending from the root, so an
/// implementation only ever sees the children of a single node.
pub trait InsertStrategy {
    /// Index into `children` of the subtree that should receive `bounds`.
    ///
    /// `children` is never empty.
    fn choose_subtree(&self, children: &[ChildRef], bounds: &BoundingBox) -> usize;
}

/// Guttman's ChooseLeaf: the child needing the least area enlargement, ties
/// broken by the smallest resulting area, then by entry order.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadraticInsert;

impl InsertStrategy for QuadraticInsert {
    fn choose_subtree(&self, children: &[ChildRef], bounds: &BoundingBox) -> usize {
        let mut best_idx = 0;
        let mut best_enlargement = f64::INFINITY;
        let mut best_area = f64::INFINITY;

        for (i, child) in children.iter().enumerate() {
            let enlarged = child.bounds().union(bounds).area();
            let enlargement = enlarged - child.bounds().area();

            if enlargement < best_enlargement
                || (enlargement == best_enlargement && enlarged < best_area)
            {
                best_enlargement = enlargement;
                best_area = enlarged;
                best_idx = i;
            }
        }

        best_idx
    }
}
