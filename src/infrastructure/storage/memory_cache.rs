use ahash::AHashMap;
use parking_lot::Mutex;

use crate::{
    application::services::{CacheKey, ResultCache},
    domain::DomainError,
};

/// Process-local result cache. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryResultCache {
    entries: Mutex<AHashMap<CacheKey, Vec<u8>>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ResultCache for MemoryResultCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &CacheKey, value: Vec<u8>) -> Result<(), DomainError> {
        self.entries.lock().entry(key.clone()).or_insert(value);
        Ok(())
    }
}
