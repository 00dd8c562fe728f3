//! Binary persistence for the dynamic R-Tree.
//!
//! A saved index starts with the magic bytes `GRTX` and a little-endian `u16`
//! format version. Everything after that is bincode (standard configuration):
//!
//! ```text
//! header    IndexHeader
//! has_root  u8, 0 or 1
//! node      tag u8 (1 = leaf, 0 = internal), entry count, then per entry:
//!             leaf:     bounds, payload
//!             internal: bounds, child node
//! ```
//!
//! Loading recomputes every node's bounds and checks them, together with the
//! header counts, before the tree is handed out. A stream that fails any check
//! yields an error and never a partial tree.

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::bounding_box::BoundingBox;

use super::balance::BalanceHeuristic;
use super::insert_strategy::{InsertStrategy, QuadraticInsert};
use super::node_arena::NodeArena;
use super::rtree_constants::{
    FORMAT_VERSION, INTERNAL_TAG, LEAF_TAG, MAGIC, MAX_ELEMENT_BYTES, MAX_LOAD_DEPTH,
};
use super::rtree_impl::DynamicRTree;
use super::rtree_types::{
    ChildRef, IndexEntry, IndexError, IndexHeader, IndexResult, Node, NodeId, NodeKind,
};
use super::split_strategy::{QuadraticSplit, SplitStrategy};

fn wire_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<{ MAX_ELEMENT_BYTES }>()
}

fn corrupt<R>(msg: impl Into<String>) -> IndexResult<R> {
    Err(IndexError::Corrupt(msg.into()))
}

// ============================================================================
// Saving
// ============================================================================

impl<T: Serialize, I, S> DynamicRTree<T, I, S> {
    /// Write the whole index to `writer`.
    ///
    /// The index is encoded in memory first, so nothing is written when a
    /// payload fails to serialize.
    pub fn save_index<W: Write>(&self, writer: &mut W) -> IndexResult<()> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

        let header = IndexHeader {
            min_fill: self.balance.min_fill() as u64,
            max_fill: self.balance.max_fill() as u64,
            node_ceiling: self.balance.node_ceiling(),
            item_count: self.item_count,
            node_count: self.arena.len() as u64,
            height: self.height,
        };
        encode(&header, &mut buf)?;

        match self.root {
            None => encode(&0u8, &mut buf)?,
            Some(root) => {
                encode(&1u8, &mut buf)?;
                self.encode_node(root, &mut buf)?;
            }
        }

        writer.write_all(&buf)?;
        writer.flush()?;
        log::debug!(
            "Saved R-Tree index: {} items, {} nodes, {} bytes",
            header.item_count,
            header.node_count,
            buf.len()
        );
        Ok(())
    }

    fn encode_node(&self, id: NodeId, buf: &mut Vec<u8>) -> IndexResult<()> {
        match self.arena[id].kind() {
            NodeKind::Leaf { entries } => {
                encode(&LEAF_TAG, buf)?;
                encode(&(entries.len() as u64), buf)?;
                for entry in entries {
                    encode(entry.bounds(), buf)?;
                    encode(entry.value(), buf)?;
                }
            }
            NodeKind::Internal { children, .. } => {
                encode(&INTERNAL_TAG, buf)?;
                encode(&(children.len() as u64), buf)?;
                for child in children {
                    encode(child.bounds(), buf)?;
                    self.encode_node(*child.value(), buf)?;
                }
            }
        }
        Ok(())
    }
}

fn encode<E: Serialize + ?Sized>(value: &E, buf: &mut Vec<u8>) -> IndexResult<()> {
    bincode::serde::encode_into_std_write(value, buf, wire_config())
        .map(|_| ())
        .map_err(|e| IndexError::Serialization(e.to_string()))
}

// ============================================================================
// Loading
// ============================================================================

impl<T: DeserializeOwned> DynamicRTree<T> {
    /// Read an index written by [`save_index`](DynamicRTree::save_index).
    ///
    /// Consumes exactly the bytes of one saved index from `reader`.
    ///
    /// # Errors
    /// - [`IndexError::UnsupportedFormat`] for a different format version
    /// - [`IndexError::Corrupt`] for anything malformed or truncated
    /// - [`IndexError::Io`] when the reader itself fails
    pub fn from_stream<R: Read>(reader: &mut R) -> IndexResult<Self> {
        Self::from_stream_with_strategies(reader, QuadraticInsert, QuadraticSplit)
    }
}

impl<T, I, S> DynamicRTree<T, I, S>
where
    T: DeserializeOwned,
    I: InsertStrategy,
    S: SplitStrategy,
{
    /// [`from_stream`](DynamicRTree::from_stream) for a tree with custom strategies.
    pub fn from_stream_with_strategies<R: Read>(
        reader: &mut R,
        insert_strategy: I,
        split_strategy: S,
    ) -> IndexResult<Self> {
        read_preamble(reader)?;

        let header: IndexHeader = decode(reader)?;
        let balance = BalanceHeuristic::new(
            to_usize(header.min_fill)?,
            to_usize(header.max_fill)?,
            header.node_ceiling,
        )
        .map_err(|e| IndexError::Corrupt(format!("stored balance heuristic rejected: {}", e)))?;

        let mut tree = Self::from_parts(balance, insert_strategy, split_strategy);
        let has_root: u8 = decode(reader)?;
        match has_root {
            0 => {}
            1 => {
                let mut loader = NodeLoader {
                    reader: &mut *reader,
                    arena: &mut tree.arena,
                    max_fill: balance.max_fill(),
                };
                let (root, level) = loader.read_node(None, 0)?;
                tree.root = Some(root);
                tree.height = level + 1;
            }
            other => return corrupt(format!("invalid root marker {}", other)),
        }
        tree.item_count = header.item_count;

        if tree.height != header.height || tree.total_node_count() != header.node_count {
            return corrupt(format!(
                "header records height {} and {} nodes, stream holds height {} and {} nodes",
                header.height,
                header.node_count,
                tree.height,
                tree.total_node_count()
            ));
        }
        tree.validate()?;

        log::debug!(
            "Loaded R-Tree index: {} items, {} nodes, height {}",
            tree.item_count,
            tree.total_node_count(),
            tree.height
        );
        Ok(tree)
    }
}

fn read_preamble<R: Read>(reader: &mut R) -> IndexResult<()> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic)?;
    if magic != MAGIC {
        return corrupt("missing GRTX magic bytes");
    }

    let mut version = [0u8; 2];
    read_exact(reader, &mut version)?;
    let version = u16::from_le_bytes(version);
    if version != FORMAT_VERSION {
        log::debug!(
            "R-Tree index format {} found, {} expected",
            version,
            FORMAT_VERSION
        );
        return Err(IndexError::UnsupportedFormat { found: version });
    }
    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> IndexResult<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => IndexError::Corrupt("index is truncated".into()),
        _ => IndexError::Io(e),
    })
}

fn decode<D: DeserializeOwned, R: Read>(reader: &mut R) -> IndexResult<D> {
    bincode::serde::decode_from_std_read(reader, wire_config()).map_err(|e| match e {
        bincode::error::DecodeError::Io { inner, .. }
            if inner.kind() != io::ErrorKind::UnexpectedEof =>
        {
            IndexError::Io(inner)
        }
        other => IndexError::Corrupt(other.to_string()),
    })
}

fn to_usize(value: u64) -> IndexResult<usize> {
    usize::try_from(value)
        .map_err(|_| IndexError::Corrupt(format!("fill bound {} out of range", value)))
}

/// Rebuilds the node arena from a node stream
struct NodeLoader<'a, R, T> {
    reader: &'a mut R,
    arena: &'a mut NodeArena<T>,
    max_fill: usize,
}

impl<R: Read, T: DeserializeOwned> NodeLoader<'_, R, T> {
    /// Returns the new node and its level.
    fn read_node(&mut self, parent: Option<NodeId>, depth: u32) -> IndexResult<(NodeId, u32)> {
        if depth >= MAX_LOAD_DEPTH {
            return corrupt(format!("nodes nested deeper than {} levels", MAX_LOAD_DEPTH));
        }

        let tag: u8 = decode(&mut *self.reader)?;
        let count: u64 = decode(&mut *self.reader)?;
        if count == 0 || count > self.max_fill as u64 {
            return corrupt(format!(
                "node holds {} entries, maximum is {}",
                count, self.max_fill
            ));
        }
        let count = count as usize;

        match tag {
            LEAF_TAG => {
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let bounds = self.read_bounds()?;
                    let value: T = decode(&mut *self.reader)?;
                    entries.push(IndexEntry::new(bounds, value));
                }
                Ok((self.arena.allocate(Node::leaf(entries, parent)), 0))
            }
            INTERNAL_TAG => {
                // Allocated up front so children can point at it.
                let id = self.arena.allocate(Node::internal(Vec::new(), 1, parent));
                let mut children = Vec::with_capacity(count);
                let mut child_level = None;

                for _ in 0..count {
                    let bounds = self.read_bounds()?;
                    let (child, level) = self.read_node(Some(id), depth + 1)?;
                    if *child_level.get_or_insert(level) != level {
                        return corrupt("leaves at different depths");
                    }
                    if self.arena[child].bounds != bounds {
                        return corrupt(format!("stored bounds of node {} do not match its entries", child));
                    }
                    children.push(ChildRef::new(bounds, child));
                }

                let level = child_level.map_or(1, |level| level + 1);
                self.arena[id] = Node::internal(children, level, parent);
                Ok((id, level))
            }
            other => corrupt(format!("unknown node tag {}", other)),
        }
    }

    fn read_bounds(&mut self) -> IndexResult<BoundingBox> {
        let bounds: BoundingBox = decode(&mut *self.reader)?;
        if !bounds.is_valid() {
            return corrupt(format!("invalid entry bounds {}", bounds));
        }
        Ok(bounds)
    }
}
