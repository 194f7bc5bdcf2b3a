//! Result cache adapters.
//!
//! `sled` keeps memoized results across restarts; the in-memory variant is
//! used when persistence is switched off and in tests.

pub mod memory_cache;
pub mod sled_cache;

pub use memory_cache::MemoryResultCache;
pub use sled_cache::SledResultCache;
