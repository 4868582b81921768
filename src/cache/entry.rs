//! Cache Entry Module
//!
//! Defines the structure for individual cache entries.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::Expiration;

/// Type-erased payload stored by the cache.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

// == Cache Entry ==
/// A stored value together with its expiration policy.
///
/// Entries are never mutated in place; a `set` on the same key replaces the
/// whole entry.
#[derive(Clone)]
pub struct CacheEntry {
    /// Key the entry was stored under, kept to detect hash collisions
    pub key: String,
    /// The stored value
    pub value: CachedValue,
    /// Rule deciding when the entry stops being valid
    pub expiration: Expiration,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(key: String, value: CachedValue, expiration: Expiration) -> Self {
        Self {
            key,
            value,
            expiration,
        }
    }

    // == Is Expired ==
    /// Checks the entry's policy against `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_expired(now)
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}
