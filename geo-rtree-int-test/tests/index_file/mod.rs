//! Index file integration tests.
//!
//! These tests save indexes to real files, reopen them and check that
//! obsolete files are detected and rebuilt.

mod index_file_test;
