use geo_rtree::{BoundingBox, IndexFile, IndexResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::{env, fs};

/// Runs a test between a setup and a teardown step.
/// The teardown runs even when the test fails or panics.
pub fn run_test<B, T, A>(before: B, test: T, after: A)
where
    B: FnOnce() -> IndexResult<TestContext>,
    T: FnOnce(&TestContext) -> IndexResult<()>,
    A: FnOnce(TestContext) -> IndexResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| test(&ctx)));
    let after_result = after(ctx);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("Test failed: {:?}", e),
        Err(panic_err) => panic::resume_unwind(panic_err),
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

pub struct TestContext {
    path: PathBuf,
}

impl TestContext {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of an index file inside the test directory
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{}.grtx", name))
    }

    pub fn create_index(&self, name: &str) -> IndexResult<IndexFile> {
        IndexFile::create(self.index_path(name))
    }

    pub fn open_index(&self, name: &str) -> IndexResult<IndexFile> {
        IndexFile::open(self.index_path(name))
    }
}

pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("geo_rtree_{}", id))
}

pub fn create_test_context() -> IndexResult<TestContext> {
    let path = random_path();
    fs::create_dir_all(&path)?;
    Ok(TestContext::new(path))
}

pub fn cleanup(ctx: TestContext) -> IndexResult<()> {
    match fs::remove_dir_all(ctx.path()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            log::warn!("Failed to remove test directory {:?}: {}", ctx.path(), e);
            Ok(())
        }
    }
}

/// The eight boxes used across the query tests, ids 1..=8.
/// Box 8 duplicates box 7.
pub fn fixture_boxes() -> Vec<(BoundingBox, u64)> {
    vec![
        (BoundingBox::new(0.0, 0.0, 100.0, 100.0), 1),
        (BoundingBox::new(50.0, 50.0, 150.0, 150.0), 2),
        (BoundingBox::new(-100.0, -100.0, 0.0, 0.0), 3),
        (BoundingBox::new(1000.0, 1000.0, 2000.0, 2000.0), 4),
        (BoundingBox::new(346.24, 424.57, 5928.58, 3252.51), 5),
        (BoundingBox::new(0.0, 0.0, 0.0, 0.0), 6),
        (BoundingBox::new(100.0, 100.0, 100.0, 100.0), 7),
        (BoundingBox::new(100.0, 100.0, 100.0, 100.0), 8),
    ]
}

/// Small random boxes scattered over [-1000, 1000] on both axes
pub fn random_boxes(seed: u64, count: u64) -> Vec<(BoundingBox, u64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|id| {
            let x = rng.random_range(-1000.0..1000.0);
            let y = rng.random_range(-1000.0..1000.0);
            let w = rng.random_range(0.0..25.0);
            let h = rng.random_range(0.0..25.0);
            (BoundingBox::new(x, y, x + w, y + h), id)
        })
        .collect()
}
