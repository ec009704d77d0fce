//! Detail record caching.
//!
//! This module provides `KeyedCache`, a lazy per-id cache filled through a
//! `DetailSource`. Entries are kept until the cache is cleared; their age
//! is tracked only for display.

pub mod entry;
pub mod keyed;

pub use entry::CacheEntry;
pub use keyed::KeyedCache;
