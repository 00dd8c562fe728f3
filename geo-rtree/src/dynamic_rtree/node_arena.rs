//! Slot arena holding the nodes of a tree.
//!
//! Nodes refer to each other by [`NodeId`] instead of by pointer, so parent
//! back-references never form ownership cycles. Freed slots are recycled
//! before the arena grows.

use std::ops::{Index, IndexMut};

use super::rtree_types::{Node, NodeId};

#[derive(Debug, Clone)]
pub(crate) struct NodeArena<T> {
    slots: Vec<Option<Node<T>>>,
    free_slots: Vec<NodeId>,
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    /// Store a node, reusing a freed slot when one is available
    pub fn allocate(&mut self, node: Node<T>) -> NodeId {
        if let Some(id) = self.free_slots.pop() {
            self.slots[id.0] = Some(node);
            return id;
        }
        self.slots.push(Some(node));
        NodeId(self.slots.len() - 1)
    }

    /// Remove a node and hand it back to the caller
    pub fn release(&mut self, id: NodeId) -> Option<Node<T>> {
        let node = self.slots.get_mut(id.0)?.take();
        if node.is_some() {
            self.free_slots.push(id);
        }
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots.get(id.0)?.as_ref()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
    }

    /// Live nodes in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Node<T>> {
        self.slots.iter().flatten()
    }

    /// Consume the arena, yielding its live nodes
    pub fn into_nodes(self) -> impl Iterator<Item = Node<T>> {
        self.slots.into_iter().flatten()
    }
}

impl<T> Index<NodeId> for NodeArena<T> {
    type Output = Node<T>;

    fn index(&self, id: NodeId) -> &Node<T> {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("node {} is not allocated", id),
        }
    }
}

impl<T> IndexMut<NodeId> for NodeArena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("node {} is not allocated", id),
        }
    }
}
