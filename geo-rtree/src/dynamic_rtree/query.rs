//! Lazy window queries.
//!
//! Traversal uses an explicit stack, so a query costs nothing until it is
//! iterated and can be abandoned at any point by dropping it.

use crate::bounding_box::BoundingBox;

use super::node_arena::NodeArena;
use super::rtree_types::{IndexEntry, NodeId, NodeKind};

/// How leaf entries are matched against the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryMode {
    /// Entry bounds intersect the window
    Intersecting,
    /// Entry bounds lie entirely inside the window
    Contained,
}

/// Iterator over the payloads whose bounds match a query window.
///
/// Created by [`DynamicRTree::query`](super::DynamicRTree::query) and
/// [`DynamicRTree::query_contained`](super::DynamicRTree::query_contained).
/// Entries are produced in depth-first, entry order.
pub struct Query<'a, T> {
    arena: &'a NodeArena<T>,
    window: BoundingBox,
    mode: QueryMode,
    stack: Vec<NodeId>,
    leaf: std::slice::Iter<'a, IndexEntry<T>>,
}

impl QueryMode {
    fn matches(self, window: &BoundingBox, bounds: &BoundingBox) -> bool {
        match self {
            QueryMode::Intersecting => bounds.intersects(window),
            QueryMode::Contained => window.contains(bounds),
        }
    }
}

impl<'a, T> Query<'a, T> {
    pub(crate) fn new(
        arena: &'a NodeArena<T>,
        root: Option<NodeId>,
        window: BoundingBox,
        mode: QueryMode,
    ) -> Self {
        Self {
            arena,
            window,
            mode,
            stack: root.into_iter().collect(),
            leaf: <&[IndexEntry<T>]>::default().iter(),
        }
    }
}

impl<'a, T> Iterator for Query<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let arena = self.arena;
        let window = self.window;
        let mode = self.mode;

        loop {
            if let Some(entry) = self.leaf.find(|e| mode.matches(&window, e.bounds())) {
                return Some(entry.value());
            }

            let node = &arena[self.stack.pop()?];
            // A contained entry always lies in a subtree intersecting the window.
            if !node.bounds().intersects(&window) {
                continue;
            }

            match node.kind() {
                NodeKind::Leaf { entries } => self.leaf = entries.iter(),
                NodeKind::Internal { children, .. } => {
                    // Reverse so children are visited in entry order.
                    self.stack.extend(
                        children
                            .iter()
                            .rev()
                            .filter(|c| c.bounds().intersects(&window))
                            .map(|c| *c.value()),
                    );
                }
            }
        }
    }
}
