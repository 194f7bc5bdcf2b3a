use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sled::{Config, Db, Tree};
use tracing::debug;

use crate::{
    application::services::{CacheKey, ResultCache},
    domain::DomainError,
};

const RESULTS_TREE: &str = "results";

/// Persistent result cache backed by `sled`.
///
/// Entries survive restarts and are never evicted. A key is written at most
/// once; later writes for the same key are dropped.
pub struct SledResultCache {
    db: Db,
    results: Tree,
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SledResultCache {
    /// Opens (or creates) a sled database rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|err| {
            DomainError::storage(format!("failed to create cache directory {:?}: {err}", dir))
        })?;

        let db = Config::default()
            .path(&dir)
            .cache_capacity(16 * 1024 * 1024)
            .open()
            .map_err(|err| DomainError::storage(format!("failed to open sled db: {err}")))?;

        let results = db
            .open_tree(RESULTS_TREE)
            .map_err(|err| DomainError::storage(format!("failed to open results tree: {err}")))?;

        Ok(Self {
            db,
            results,
            data_dir: dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn flush(&self) -> Result<(), DomainError> {
        self.db
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush db: {err}")))?;

        Ok(())
    }
}

impl ResultCache for SledResultCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, DomainError> {
        let value = self
            .results
            .get(key.as_bytes())
            .map_err(|err| DomainError::storage(format!("failed to read cached result: {err}")))?;

        Ok(value.map(|bytes| bytes.to_vec()))
    }

    fn put(&self, key: &CacheKey, value: Vec<u8>) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        let swapped = self
            .results
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(value))
            .map_err(|err| DomainError::storage(format!("failed to persist result: {err}")))?;

        if swapped.is_err() {
            debug!(target: "playground::cache", "result already cached, keeping first entry");
            return Ok(());
        }

        self.results
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush results: {err}")))?;

        Ok(())
    }
}
