//! In-memory store of parsed containers.

pub mod cache;

pub use cache::{CacheStats, EmailCache, Invalidation, InvalidationKind, Lookup};
