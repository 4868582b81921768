//! Cache Module
//!
//! Provides in-memory caching with fixed and tag-based expiration, tag
//! invalidation and function memoization.

mod arg_text;
mod entry;
mod expiration;
mod hasher;
mod memoize;
mod stats;
mod store;
mod tag_index;


// Re-export public types
pub use arg_text::RenderError;
pub use entry::{CacheEntry, CachedValue};
pub use expiration::Expiration;
pub use hasher::{derive_call_key, hash_key};
pub use stats::CacheStats;
pub use store::Cache;
