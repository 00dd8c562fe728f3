//! Concurrent access through `SharedRTree`.

mod shared_index_test;
