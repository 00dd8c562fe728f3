//! DynamicRTree implementation.

use std::cmp::Reverse;
use std::iter::Map;

use crate::bounding_box::BoundingBox;
use crate::hilbert::hilbert_index_bounded;

use super::balance::BalanceHeuristic;
use super::insert_strategy::{InsertStrategy, QuadraticInsert};
use super::node_arena::NodeArena;
use super::query::{Query, QueryMode};
use super::rtree_constants::HILBERT_ORDER;
use super::rtree_types::{
    ChildRef, IndexEntry, IndexError, IndexResult, Node, NodeId, NodeKind, RTreeStats,
    RebuildStats,
};
use super::split_strategy::{QuadraticSplit, SplitStrategy};

/// A dynamic R-Tree mapping bounding boxes to payload items.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Insertion picks a
/// leaf with the [`InsertStrategy`] and splits overflowing nodes with the
/// [`SplitStrategy`]; both default to Guttman's quadratic algorithms.
///
/// The tree is a single-writer structure: mutation takes `&mut self` and a
/// live [`Query`] borrows the tree, so reads and writes cannot interleave on
/// the same instance. Wrap it in [`SharedRTree`](crate::SharedRTree) to share
/// it between threads.
///
/// ```rust
/// use geo_rtree::{BoundingBox, DynamicRTree};
///
/// let mut tree = DynamicRTree::new();
/// tree.insert(BoundingBox::new(0.0, 0.0, 10.0, 10.0), "park").unwrap();
/// tree.insert(BoundingBox::new(20.0, 20.0, 30.0, 30.0), "lake").unwrap();
///
/// let hits: Vec<_> = tree.query(&BoundingBox::new(5.0, 5.0, 6.0, 6.0)).collect();
/// assert_eq!(hits, vec![&"park"]);
/// ```
#[derive(Debug, Clone)]
pub struct DynamicRTree<T, I = QuadraticInsert, S = QuadraticSplit> {
    pub(crate) arena: NodeArena<T>,
    pub(crate) root: Option<NodeId>,
    pub(crate) item_count: u64,
    /// Number of levels; 0 for an empty tree, 1 when the root is a leaf
    pub(crate) height: u32,
    pub(crate) balance: BalanceHeuristic,
    insert_strategy: I,
    split_strategy: S,
}

/// Entries detached while condensing, waiting to be reinserted
enum Orphan<T> {
    Entry(IndexEntry<T>),
    Subtree { child: ChildRef, level: u32 },
}

impl<T> Orphan<T> {
    /// Level of the node that must receive this orphan
    fn target_level(&self) -> u32 {
        match self {
            Orphan::Entry(_) => 0,
            Orphan::Subtree { level, .. } => level + 1,
        }
    }
}

impl<T> DynamicRTree<T> {
    /// Create an empty tree with the default [`BalanceHeuristic`].
    pub fn new() -> Self {
        Self::from_parts(BalanceHeuristic::default(), QuadraticInsert, QuadraticSplit)
    }

    /// Create an empty tree with custom fill bounds.
    pub fn with_balance(balance: BalanceHeuristic) -> IndexResult<Self> {
        Self::with_strategies(balance, QuadraticInsert, QuadraticSplit)
    }
}

impl<T> Default for DynamicRTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I, S> DynamicRTree<T, I, S>
where
    I: InsertStrategy,
    S: SplitStrategy,
{
    /// Create an empty tree with custom strategies.
    ///
    /// Fails with [`IndexError::InvalidArgument`] if `balance` breaks its
    /// fill invariants.
    pub fn with_strategies(
        balance: BalanceHeuristic,
        insert_strategy: I,
        split_strategy: S,
    ) -> IndexResult<Self> {
        balance.validate()?;
        Ok(Self::from_parts(balance, insert_strategy, split_strategy))
    }

    pub(crate) fn from_parts(balance: BalanceHeuristic, insert_strategy: I, split_strategy: S) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            item_count: 0,
            height: 0,
            balance,
            insert_strategy,
            split_strategy,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Union of every indexed box; empty for an empty tree.
    pub fn bounds(&self) -> BoundingBox {
        self.root
            .map(|root| self.arena[root].bounds)
            .unwrap_or_else(BoundingBox::empty)
    }

    pub fn root(&self) -> Option<&Node<T>> {
        self.root.map(|root| &self.arena[root])
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.arena.get(id)
    }

    pub fn total_item_count(&self) -> u64 {
        self.item_count
    }

    pub fn total_node_count(&self) -> u64 {
        self.arena.len() as u64
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    pub fn balance(&self) -> &BalanceHeuristic {
        &self.balance
    }

    /// Shape statistics, see [`RTreeStats`].
    pub fn stats(&self) -> RTreeStats {
        let mut leaf_nodes = 0u64;
        let mut entries = 0u64;
        for node in self.arena.iter() {
            if node.is_leaf() {
                leaf_nodes += 1;
            }
            entries += node.len() as u64;
        }

        let total_nodes = self.total_node_count();
        let average_fill = if total_nodes > 0 {
            entries as f64 / (total_nodes * self.balance.max_fill() as u64) as f64
        } else {
            0.0
        };

        RTreeStats {
            total_items: self.item_count,
            total_nodes,
            leaf_nodes,
            tree_height: self.height,
            average_fill,
        }
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Index `item` under `bounds`.
    ///
    /// Fails with [`IndexError::InvalidArgument`] for an empty, inverted or
    /// NaN box, and with [`IndexError::NodeCeilingReached`] when the configured
    /// node ceiling would be exceeded. The tree is unchanged on failure.
    pub fn insert(&mut self, bounds: BoundingBox, item: T) -> IndexResult<()> {
        check_bounds(&bounds)?;

        if let Some(ceiling) = self.balance.node_ceiling() {
            let required = self.total_node_count() + self.nodes_needed_for(&bounds);
            if required > ceiling {
                log::warn!("Insert of {} refused: node ceiling {} reached", bounds, ceiling);
                return Err(IndexError::NodeCeilingReached { ceiling });
            }
        }

        self.insert_entry(IndexEntry::new(bounds, item));
        self.item_count += 1;
        Ok(())
    }

    /// Insert many items, ordered along a Hilbert curve first so that
    /// neighbouring boxes tend to share leaves.
    ///
    /// Every box is checked before anything is inserted. A node ceiling can
    /// still stop the batch part way; items inserted before that stay indexed.
    pub fn insert_range<It>(&mut self, items: It) -> IndexResult<()>
    where
        It: IntoIterator<Item = (BoundingBox, T)>,
    {
        let items: Vec<_> = items.into_iter().collect();
        for (bounds, _) in &items {
            check_bounds(bounds)?;
        }

        for (bounds, item) in hilbert_sorted(items) {
            self.insert(bounds, item)?;
        }
        Ok(())
    }

    /// Number of nodes an insertion of `bounds` would allocate.
    fn nodes_needed_for(&self, bounds: &BoundingBox) -> u64 {
        let Some(root) = self.root else {
            return 1;
        };

        let mut needed = 0;
        let mut current = Some(self.choose_node(root, bounds, 0));
        while let Some(id) = current {
            let node = &self.arena[id];
            if !self.balance.is_overfull(node.len() + 1) {
                return needed;
            }
            needed += 1;
            current = node.parent;
        }
        // The root split as well and a new root is grown above it.
        needed + 1
    }

    /// Descend from `start` to the node at `level` that should receive `bounds`.
    fn choose_node(&self, start: NodeId, bounds: &BoundingBox, level: u32) -> NodeId {
        let mut current = start;
        loop {
            match self.arena[current].kind() {
                NodeKind::Internal {
                    children,
                    level: node_level,
                } if *node_level > level => {
                    let idx = self.insert_strategy.choose_subtree(children, bounds);
                    current = *children[idx].value();
                }
                _ => return current,
            }
        }
    }

    /// Insert a payload entry without touching the item count.
    fn insert_entry(&mut self, entry: IndexEntry<T>) {
        let Some(root) = self.root else {
            let id = self.arena.allocate(Node::leaf(vec![entry], None));
            self.root = Some(id);
            self.height = 1;
            return;
        };

        let leaf = self.choose_node(root, entry.bounds(), 0);
        let node = &mut self.arena[leaf];
        node.bounds = node.bounds.union(entry.bounds());
        leaf_entries_mut(node).push(entry);
        self.adjust_tree(leaf);
    }

    /// Attach an orphaned subtree whose root sits at `level`.
    fn insert_subtree(&mut self, child: ChildRef, level: u32) {
        let child_id = *child.value();
        let Some(root) = self.root else {
            self.arena[child_id].parent = None;
            self.root = Some(child_id);
            self.height = level + 1;
            return;
        };

        if self.arena[root].level() <= level {
            self.grow_root(root, child);
            return;
        }

        let parent = self.choose_node(root, child.bounds(), level + 1);
        self.arena[child_id].parent = Some(parent);
        let node = &mut self.arena[parent];
        node.bounds = node.bounds.union(child.bounds());
        children_mut(node).push(child);
        self.adjust_tree(parent);
    }

    /// Split overflowing nodes and refresh bounds from `start` up to the root.
    fn adjust_tree(&mut self, start: NodeId) {
        let mut current = start;
        loop {
            let sibling = if self.balance.is_overfull(self.arena[current].len()) {
                let sibling = self.split_node(current);
                Some(ChildRef::new(self.arena[sibling].bounds, sibling))
            } else {
                None
            };

            let node = &self.arena[current];
            let bounds = node.bounds;
            let Some(parent) = node.parent else {
                if let Some(sibling) = sibling {
                    self.grow_root(current, sibling);
                }
                return;
            };

            let parent_node = &mut self.arena[parent];
            let children = children_mut(parent_node);
            if let Some(slot) = children.iter_mut().find(|c| *c.value() == current) {
                *slot = ChildRef::new(bounds, current);
            }
            if let Some(sibling) = sibling {
                children.push(sibling);
            }
            parent_node.refresh_bounds();
            current = parent;
        }
    }

    /// Split node `id` in place, returning the new sibling.
    fn split_node(&mut self, id: NodeId) -> NodeId {
        let node = &mut self.arena[id];
        let parent = node.parent;
        let sibling = match &mut node.kind {
            NodeKind::Leaf { entries } => {
                let (keep, moved) = self
                    .split_strategy
                    .split(std::mem::take(entries), &self.balance);
                *entries = keep;
                Node::leaf(moved, parent)
            }
            NodeKind::Internal { children, level } => {
                let (keep, moved) = self
                    .split_strategy
                    .split(std::mem::take(children), &self.balance);
                *children = keep;
                Node::internal(moved, *level, parent)
            }
        };
        node.refresh_bounds();

        let moved_children: Vec<NodeId> = match &sibling.kind {
            NodeKind::Internal { children, .. } => children.iter().map(|c| *c.value()).collect(),
            NodeKind::Leaf { .. } => Vec::new(),
        };
        let sibling_id = self.arena.allocate(sibling);
        for child in moved_children {
            self.arena[child].parent = Some(sibling_id);
        }
        sibling_id
    }

    /// Replace the root by a new internal node holding it and `sibling`.
    fn grow_root(&mut self, old_root: NodeId, sibling: ChildRef) {
        let level = self.arena[old_root].level().max(sibling_level(&self.arena, &sibling)) + 1;
        let sibling_id = *sibling.value();
        let children = vec![ChildRef::new(self.arena[old_root].bounds, old_root), sibling];
        let new_root = self.arena.allocate(Node::internal(children, level, None));

        self.arena[old_root].parent = Some(new_root);
        self.arena[sibling_id].parent = Some(new_root);
        self.root = Some(new_root);
        self.height = level + 1;
        log::debug!("R-Tree root split, height is now {}", self.height);
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Detach the entry at `idx` of `leaf` and repair the tree.
    fn remove_at(&mut self, leaf: NodeId, idx: usize) -> IndexEntry<T> {
        let removed = leaf_entries_mut(&mut self.arena[leaf]).remove(idx);
        self.item_count -= 1;
        self.condense_tree(leaf);
        removed
    }

    /// Walk up from `start`, detaching under-filled nodes, then reinsert
    /// their entries at their original level and collapse the root.
    fn condense_tree(&mut self, start: NodeId) {
        let mut orphans = Vec::new();
        let mut current = start;

        while let Some(parent) = self.arena[current].parent {
            if self.balance.is_underfull(self.arena[current].len()) {
                children_mut(&mut self.arena[parent]).retain(|c| *c.value() != current);
                if let Some(node) = self.arena.release(current) {
                    match node.kind {
                        NodeKind::Leaf { entries } => {
                            orphans.extend(entries.into_iter().map(Orphan::Entry));
                        }
                        NodeKind::Internal { children, level } => {
                            orphans.extend(children.into_iter().map(|child| Orphan::Subtree {
                                child,
                                level: level - 1,
                            }));
                        }
                    }
                }
            } else {
                let node = &mut self.arena[current];
                node.refresh_bounds();
                let bounds = node.bounds;
                let children = children_mut(&mut self.arena[parent]);
                if let Some(slot) = children.iter_mut().find(|c| *c.value() == current) {
                    *slot = ChildRef::new(bounds, current);
                }
            }
            current = parent;
        }

        self.arena[current].refresh_bounds();
        if self.arena[current].is_empty() {
            self.arena.release(current);
            self.root = None;
            self.height = 0;
        }

        // Higher subtrees first so lower orphans find their level present.
        orphans.sort_by_key(|orphan| Reverse(orphan.target_level()));
        for orphan in orphans {
            match orphan {
                Orphan::Entry(entry) => self.insert_entry(entry),
                Orphan::Subtree { child, level } => self.insert_subtree(child, level),
            }
        }

        self.collapse_root();
    }

    /// Replace an internal root holding a single child by that child.
    fn collapse_root(&mut self) {
        while let Some(root) = self.root {
            let only_child = match self.arena[root].kind() {
                NodeKind::Internal { children, .. } if children.len() == 1 => *children[0].value(),
                _ => break,
            };

            self.arena.release(root);
            self.arena[only_child].parent = None;
            self.root = Some(only_child);
            self.height -= 1;
            log::debug!("R-Tree root collapsed, height is now {}", self.height);
        }
    }

    /// Remove every entry and node.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.item_count = 0;
        self.height = 0;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Lazily yield every item whose bounds intersect `window`.
    ///
    /// Each call starts a fresh traversal; the tree is not modified.
    pub fn query(&self, window: &BoundingBox) -> Query<'_, T> {
        Query::new(&self.arena, self.root, *window, QueryMode::Intersecting)
    }

    /// [`query`](Self::query) with each item passed through `projection`.
    pub fn query_with<'a, R, F>(&'a self, window: &BoundingBox, projection: F) -> Map<Query<'a, T>, F>
    where
        F: FnMut(&'a T) -> R,
    {
        self.query(window).map(projection)
    }

    /// Lazily yield every item whose bounds lie entirely inside `window`.
    pub fn query_contained(&self, window: &BoundingBox) -> Query<'_, T> {
        Query::new(&self.arena, self.root, *window, QueryMode::Contained)
    }

    /// Find the K items nearest to a point, measured to their bounding boxes.
    ///
    /// Uses branch-and-bound pruning: children are visited nearest first and
    /// skipped once they are farther than the current K-th distance.
    ///
    /// # Returns
    /// Up to `k` (item, distance) pairs sorted by distance (nearest first)
    pub fn find_nearest(
        &self,
        center_x: f64,
        center_y: f64,
        k: usize,
        max_distance: Option<f64>,
    ) -> Vec<(&T, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let Some(root) = self.root else {
            return Vec::new();
        };

        let mut results = Vec::new();
        let mut max_dist = max_distance.unwrap_or(f64::INFINITY);
        self.find_nearest_recursive(root, center_x, center_y, k, &mut results, &mut max_dist);

        results.sort_by(|a, b| a.1.total_cmp(&b.1));
        results.truncate(k);
        results
    }

    fn find_nearest_recursive<'a>(
        &'a self,
        id: NodeId,
        center_x: f64,
        center_y: f64,
        k: usize,
        results: &mut Vec<(&'a T, f64)>,
        max_dist: &mut f64,
    ) {
        match self.arena[id].kind() {
            NodeKind::Leaf { entries } => {
                for entry in entries {
                    let dist = entry.bounds().min_distance_to_point(center_x, center_y);
                    if dist > *max_dist {
                        continue;
                    }
                    results.push((entry.value(), dist));

                    // Keep only K entries, using the K-th distance as new bound
                    if results.len() > k {
                        results.sort_by(|a, b| a.1.total_cmp(&b.1));
                        results.truncate(k);
                        if let Some((_, kth_dist)) = results.last() {
                            *max_dist = *kth_dist;
                        }
                    }
                }
            }
            NodeKind::Internal { children, .. } => {
                let mut candidates: Vec<(NodeId, f64)> = children
                    .iter()
                    .map(|c| (*c.value(), c.bounds().min_distance_to_point(center_x, center_y)))
                    .collect();
                candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

                for (child, dist) in candidates {
                    if dist > *max_dist {
                        break;
                    }
                    self.find_nearest_recursive(child, center_x, center_y, k, results, max_dist);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Rebuild the tree from scratch, inserting all entries in Hilbert order.
    ///
    /// Query results are unchanged; only the node layout differs. The node
    /// ceiling is not applied while rebuilding.
    pub fn rebuild(&mut self) -> RebuildStats {
        let before = self.stats();

        let arena = std::mem::replace(&mut self.arena, NodeArena::new());
        let entries: Vec<(BoundingBox, T)> = arena
            .into_nodes()
            .filter_map(|node| match node.kind {
                NodeKind::Leaf { entries } => Some(entries),
                NodeKind::Internal { .. } => None,
            })
            .flatten()
            .map(IndexEntry::into_parts)
            .collect();

        let item_count = self.item_count;
        self.clear();
        for (bounds, item) in hilbert_sorted(entries) {
            self.insert_entry(IndexEntry::new(bounds, item));
        }
        self.item_count = item_count;

        let after = self.stats();
        log::debug!(
            "R-Tree rebuilt: {} items, {} -> {} nodes, height {} -> {}",
            item_count,
            before.total_nodes,
            after.total_nodes,
            before.tree_height,
            after.tree_height
        );

        RebuildStats {
            entries_reindexed: item_count,
            nodes_before: before.total_nodes,
            nodes_after: after.total_nodes,
            height_before: before.tree_height,
            height_after: after.tree_height,
            fill_factor_improvement: (after.average_fill - before.average_fill) * 100.0,
        }
    }

    /// Check every structural invariant of the tree.
    ///
    /// Verifies fill bounds, cached bounds, parent links, uniform leaf depth
    /// and the item and node counts. Fails with [`IndexError::Corrupt`].
    pub fn validate(&self) -> IndexResult<()> {
        let Some(root) = self.root else {
            if self.item_count != 0 || self.arena.len() != 0 || self.height != 0 {
                return Err(IndexError::Corrupt(format!(
                    "empty tree reports {} items, {} nodes, height {}",
                    self.item_count,
                    self.arena.len(),
                    self.height
                )));
            }
            return Ok(());
        };

        let root_level = self.arena.get(root).map(Node::level).ok_or_else(|| {
            IndexError::Corrupt(format!("root {} is not allocated", root))
        })?;
        if root_level + 1 != self.height {
            return Err(IndexError::Corrupt(format!(
                "root level {} does not match height {}",
                root_level, self.height
            )));
        }

        let (items, nodes) = self.validate_node(root, None, root_level)?;
        if items != self.item_count {
            return Err(IndexError::Corrupt(format!(
                "found {} items, expected {}",
                items, self.item_count
            )));
        }
        if nodes != self.total_node_count() {
            return Err(IndexError::Corrupt(format!(
                "{} nodes reachable, {} allocated",
                nodes,
                self.total_node_count()
            )));
        }
        Ok(())
    }

    /// Returns (items, nodes) below and including `id`.
    fn validate_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        expected_level: u32,
    ) -> IndexResult<(u64, u64)> {
        let corrupt = |msg: String| Err(IndexError::Corrupt(format!("node {}: {}", id, msg)));

        let Some(node) = self.arena.get(id) else {
            return corrupt("not allocated".into());
        };
        if node.parent != parent {
            return corrupt(format!("parent {:?}, expected {:?}", node.parent, parent));
        }
        if node.level() != expected_level {
            return corrupt(format!("level {}, expected {}", node.level(), expected_level));
        }

        let len = node.len();
        let min_len = match (parent, node.is_leaf()) {
            (Some(_), _) => self.balance.min_fill(),
            (None, true) => 1,
            (None, false) => 2,
        };
        if len < min_len || len > self.balance.max_fill() {
            return corrupt(format!(
                "holds {} entries, allowed {}..={}",
                len,
                min_len,
                self.balance.max_fill()
            ));
        }
        if node.bounds != node.compute_bounds() {
            return corrupt("cached bounds differ from the union of its entries".into());
        }

        match node.kind() {
            NodeKind::Leaf { entries } => Ok((entries.len() as u64, 1)),
            NodeKind::Internal { children, level } => {
                let mut items = 0;
                let mut nodes = 1;
                for child in children {
                    let child_id = *child.value();
                    let (child_items, child_nodes) =
                        self.validate_node(child_id, Some(id), level - 1)?;
                    if self.arena[child_id].bounds != *child.bounds() {
                        return corrupt(format!("entry bounds for child {} are stale", child_id));
                    }
                    items += child_items;
                    nodes += child_nodes;
                }
                Ok((items, nodes))
            }
        }
    }
}

impl<T, I, S> DynamicRTree<T, I, S>
where
    T: PartialEq,
    I: InsertStrategy,
    S: SplitStrategy,
{
    /// Remove `item` stored under exactly `bounds`.
    ///
    /// Only subtrees whose bounds contain `bounds` are searched. Returns
    /// `false`, leaving the tree untouched, when no such entry exists.
    pub fn remove(&mut self, bounds: &BoundingBox, item: &T) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        match self.find_entry(root, bounds, item) {
            Some((leaf, idx)) => {
                self.remove_at(leaf, idx);
                true
            }
            None => false,
        }
    }

    /// Remove the first entry holding `item`, whatever its bounds.
    ///
    /// This visits the whole tree; prefer [`remove`](Self::remove) when the
    /// stored bounds are known.
    pub fn remove_item(&mut self, item: &T) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match self.arena[id].kind() {
                NodeKind::Leaf { entries } => {
                    if let Some(idx) = entries.iter().position(|e| e.value() == item) {
                        self.remove_at(id, idx);
                        return true;
                    }
                }
                NodeKind::Internal { children, .. } => {
                    stack.extend(children.iter().rev().map(|c| *c.value()));
                }
            }
        }
        false
    }

    fn find_entry(&self, id: NodeId, bounds: &BoundingBox, item: &T) -> Option<(NodeId, usize)> {
        let node = &self.arena[id];
        if !node.bounds.contains(bounds) {
            return None;
        }

        match node.kind() {
            NodeKind::Leaf { entries } => entries
                .iter()
                .position(|e| e.bounds() == bounds && e.value() == item)
                .map(|idx| (id, idx)),
            NodeKind::Internal { children, .. } => children
                .iter()
                .filter(|c| c.bounds().contains(bounds))
                .find_map(|c| self.find_entry(*c.value(), bounds, item)),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn check_bounds(bounds: &BoundingBox) -> IndexResult<()> {
    if bounds.is_valid() {
        Ok(())
    } else {
        Err(IndexError::InvalidArgument(format!(
            "cannot index invalid or empty bounds {}",
            bounds
        )))
    }
}

/// Order entries along a Hilbert curve over their common extent.
fn hilbert_sorted<T>(items: Vec<(BoundingBox, T)>) -> Vec<(BoundingBox, T)> {
    let extent = items
        .iter()
        .fold(BoundingBox::empty(), |acc, (bounds, _)| acc.union(bounds));

    let mut keyed: Vec<(u64, BoundingBox, T)> = items
        .into_iter()
        .map(|(bounds, item)| {
            let (cx, cy) = bounds.center();
            (hilbert_index_bounded(cx, cy, &extent, HILBERT_ORDER), bounds, item)
        })
        .collect();
    keyed.sort_by_key(|(h, _, _)| *h);
    keyed.into_iter().map(|(_, bounds, item)| (bounds, item)).collect()
}

fn sibling_level<T>(arena: &NodeArena<T>, sibling: &ChildRef) -> u32 {
    arena[*sibling.value()].level()
}

fn leaf_entries_mut<T>(node: &mut Node<T>) -> &mut Vec<IndexEntry<T>> {
    match &mut node.kind {
        NodeKind::Leaf { entries } => entries,
        NodeKind::Internal { .. } => panic!("expected a leaf node"),
    }
}

fn children_mut<T>(node: &mut Node<T>) -> &mut Vec<ChildRef> {
    match &mut node.kind {
        NodeKind::Internal { children, .. } => children,
        NodeKind::Leaf { .. } => panic!("expected an internal node"),
    }
}

// ============================================================================
// Tests
// ============================================================================
