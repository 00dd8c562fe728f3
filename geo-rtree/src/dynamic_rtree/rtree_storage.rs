//! File storage for a persisted R-Tree index.
//!
//! An [`IndexFile`] holds one saved index. Saving rewrites the file from the
//! start; loading reads it back through
//! [`DynamicRTree::from_stream`](super::DynamicRTree::from_stream).

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::insert_strategy::{InsertStrategy, QuadraticInsert};
use super::rtree_impl::DynamicRTree;
use super::rtree_types::{IndexError, IndexResult};
use super::split_strategy::{QuadraticSplit, SplitStrategy};

/// A file holding a saved index.
///
/// All operations take `&self`; access to the underlying file is serialized
/// by an internal lock. After [`close`](IndexFile::close) every operation
/// fails with [`IndexError::Closed`].
pub struct IndexFile {
    file: Mutex<Option<File>>,
    path: PathBuf,
}

impl IndexFile {
    /// Create a new index file, truncating any existing one
    pub fn create(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(Some(file)),
            path: path.to_path_buf(),
        })
    }

    /// Open an existing index file
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        Ok(Self {
            file: Mutex::new(Some(file)),
            path: path.to_path_buf(),
        })
    }

    /// Open an index file, creating an empty one if it does not exist
    pub fn open_or_create(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(Some(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }

    /// Replace the file contents with `tree` and sync it to disk
    pub fn save<T: Serialize, I, S>(&self, tree: &DynamicRTree<T, I, S>) -> IndexResult<()> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(IndexError::Closed)?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        {
            let mut writer = BufWriter::new(&mut *file);
            tree.save_index(&mut writer)?;
            writer.flush()?;
        }
        file.sync_all()?;
        Ok(())
    }

    /// Load the saved index
    pub fn load<T: DeserializeOwned>(&self) -> IndexResult<DynamicRTree<T>> {
        self.load_with_strategies(QuadraticInsert, QuadraticSplit)
    }

    /// Load the saved index into a tree with custom strategies
    pub fn load_with_strategies<T, I, S>(
        &self,
        insert_strategy: I,
        split_strategy: S,
    ) -> IndexResult<DynamicRTree<T, I, S>>
    where
        T: DeserializeOwned,
        I: InsertStrategy,
        S: SplitStrategy,
    {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(IndexError::Closed)?;

        file.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(&mut *file);
        DynamicRTree::from_stream_with_strategies(&mut reader, insert_strategy, split_strategy)
    }

    /// Load the saved index, or rebuild it when the file is obsolete.
    ///
    /// A corrupt file or one written in another format version is discarded,
    /// replaced by the tree `rebuild` returns, and saved again. Other errors
    /// are returned unchanged.
    pub fn load_or_rebuild<T, F>(&self, rebuild: F) -> IndexResult<DynamicRTree<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> IndexResult<DynamicRTree<T>>,
    {
        match self.load() {
            Ok(tree) => Ok(tree),
            Err(e) if e.is_obsolete() => {
                log::warn!(
                    "Discarding R-Tree index {}: {}",
                    self.path.display(),
                    e
                );
                self.discard()?;
                let tree = rebuild()?;
                self.save(&tree)?;
                Ok(tree)
            }
            Err(e) => Err(e),
        }
    }

    /// Truncate the file, dropping the saved index
    pub fn discard(&self) -> IndexResult<()> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(IndexError::Closed)?;
        file.set_len(0)?;
        Ok(())
    }

    /// Sync and close the file. Closing twice is a no-op.
    pub fn close(&self) -> IndexResult<()> {
        if let Some(file) = self.file.lock().take() {
            file.sync_all()?;
            log::debug!("Closed R-Tree index file {}", self.path.display());
        }
        Ok(())
    }
}
