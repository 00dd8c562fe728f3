//! Constants for the dynamic R-Tree implementation.

/// Default minimum entries per non-root node
pub const DEFAULT_MIN_FILL: usize = 4;

/// Default maximum entries per node
pub const DEFAULT_MAX_FILL: usize = 10;

/// Magic bytes opening a persisted index - "GRTX"
pub const MAGIC: [u8; 4] = *b"GRTX";

/// Persisted format version
pub const FORMAT_VERSION: u16 = 1;

/// Deepest node nesting accepted while loading a persisted index
pub const MAX_LOAD_DEPTH: u32 = 64;

/// Hilbert curve order used to sort entries for bulk insertion
pub const HILBERT_ORDER: u32 = 16;

/// Largest single encoded element (header, box or payload) accepted on load
pub const MAX_ELEMENT_BYTES: usize = 1 << 20;

/// Node tags in the persisted node stream
pub const LEAF_TAG: u8 = 1;
pub const INTERNAL_TAG: u8 = 0;
