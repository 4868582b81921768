//! Cache Store Module
//!
//! Main cache engine: hashed-key entry map, tag index and expiration checks
//! behind one read/write lock.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::entry::{CacheEntry, CachedValue};
use crate::cache::hasher::hash_key;
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::tag_index::TagIndex;
use crate::cache::Expiration;

// == Store ==
/// State guarded by the cache lock.
#[derive(Debug, Default)]
struct Store {
    /// Entries keyed by the FNV hash of their key
    entries: HashMap<u64, CacheEntry>,
    /// Tag -> entry hashes
    tags: TagIndex,
}

impl Store {
    /// Removes an entry and unlinks it from every tag it carried.
    fn remove(&mut self, hash: u64) -> Option<CacheEntry> {
        let entry = self.entries.remove(&hash)?;
        self.tags.unlink(hash, entry.expiration.tags());
        Some(entry)
    }
}

// == Cache ==
/// Thread-safe in-memory cache with per-entry expiration and tag invalidation.
///
/// Reads share the lock, writes take it exclusively. Cloning a `Cache` yields
/// another handle to the same storage; every [`Cache::new`] is independent.
///
/// A [`Cache::delete_by_tag`] racing with a [`Cache::set`] that registers a
/// new entry under the same tag may or may not remove that entry, depending
/// on which takes the lock first.
#[derive(Clone, Default)]
pub struct Cache {
    inner: Arc<RwLock<Store>>,
    stats: Arc<StatsRecorder>,
}

impl Cache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// The replaced entry's tag links are dropped before the new policy's
    /// tags are registered.
    pub fn set<V>(&self, expiration: Expiration, key: &str, value: V)
    where
        V: Any + Send + Sync,
    {
        self.set_shared(expiration, key, Arc::new(value));
    }

    /// Stores an already type-erased value under `key`.
    pub fn set_shared(&self, expiration: Expiration, key: &str, value: CachedValue) {
        let hash = hash_key(key);
        let entry = CacheEntry::new(key.to_string(), value, expiration);

        let mut store = self.inner.write();
        store.remove(hash);
        store.tags.link(hash, entry.expiration.tags());
        store.entries.insert(hash, entry);
        drop(store);

        debug!(key, "cache set");
    }

    // == Get ==
    /// Returns the type-erased value stored under `key`.
    ///
    /// Expired entries are reported as missing; their physical removal is
    /// left to the sweeper.
    pub fn get_any(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();
        let store = self.inner.read();

        match store.entries.get(&hash_key(key)) {
            Some(entry) if entry.key == key && !entry.is_expired(now) => {
                self.stats.record_hit();
                Some(Arc::clone(&entry.value))
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns a clone of the value stored under `key`.
    ///
    /// Returns `None` when the key is missing, expired, or holds a value of
    /// another type.
    pub fn get<V>(&self, key: &str) -> Option<V>
    where
        V: Any + Clone,
    {
        self.get_any(key)?.downcast_ref::<V>().cloned()
    }

    /// Remaining lifetime of the live entry under `key`.
    pub fn time_to_live(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let store = self.inner.read();

        store
            .entries
            .get(&hash_key(key))
            .filter(|entry| entry.key == key && !entry.is_expired(now))
            .map(|entry| entry.expiration.remaining(now))
    }

    // == Delete ==
    /// Removes the entry for `key`. Missing keys are ignored.
    pub fn delete(&self, key: &str) {
        let hash = hash_key(key);
        let mut store = self.inner.write();

        let owned = store
            .entries
            .get(&hash)
            .is_some_and(|entry| entry.key == key);
        if owned {
            store.remove(hash);
            debug!(key, "cache delete");
        }
    }

    /// Removes every entry indexed under `tag`, then the tag itself.
    ///
    /// Returns the number of entries removed; zero for unknown tags.
    pub fn delete_by_tag(&self, tag: &str) -> usize {
        let mut store = self.inner.write();

        let hashes = store.tags.take(tag);
        let removed = hashes
            .into_iter()
            .filter(|hash| store.remove(*hash).is_some())
            .count();
        drop(store);

        self.stats.record_tag_invalidation(removed);
        debug!(tag, removed, "cache delete by tag");
        removed
    }

    // == Purge Expired ==
    /// Removes every entry expired at `now`, returning how many were removed.
    ///
    /// Candidates are collected under the read lock and removed one at a
    /// time under the write lock, so foreground calls interleave with a long
    /// purge. Each candidate is re-checked before removal in case it was
    /// replaced in between.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let expired: Vec<u64> = self
            .inner
            .read()
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(hash, _)| *hash)
            .collect();

        let mut removed = 0;
        for hash in expired {
            let mut store = self.inner.write();
            let still_expired = store
                .entries
                .get(&hash)
                .is_some_and(|entry| entry.is_expired(now));
            if still_expired {
                store.remove(hash);
                removed += 1;
            }
        }

        self.stats.record_expired(removed);
        removed
    }

    // == Clear ==
    /// Removes all entries and tags.
    pub fn clear(&self) {
        let mut store = self.inner.write();
        store.entries.clear();
        store.tags.clear();
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Number of tags referencing at least one entry.
    pub fn tag_count(&self) -> usize {
        self.inner.read().tags.len()
    }

    /// Number of entries currently indexed under `tag`.
    pub fn tagged_len(&self, tag: &str) -> usize {
        self.inner.read().tags.tagged_len(tag)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let store = self.inner.read();
        self.stats.snapshot(store.entries.len(), store.tags.len())
    }

    /// Panics unless every tag link points at a stored entry carrying that tag.
    #[cfg(test)]
    pub(crate) fn assert_tag_index_consistent(&self) {
        let store = self.inner.read();
        for (tag, hashes) in store.tags.iter() {
            assert!(!hashes.is_empty(), "empty tag {tag} left in index");
            for hash in hashes {
                let entry = store
                    .entries
                    .get(hash)
                    .unwrap_or_else(|| panic!("tag {tag} links missing entry {hash}"));
                assert!(
                    entry.expiration.tags().contains(tag),
                    "entry {} linked under foreign tag {tag}",
                    entry.key
                );
            }
        }
        for (hash, entry) in &store.entries {
            for tag in entry.expiration.tags() {
                assert!(
                    store.tags.tagged_len(tag) > 0,
                    "entry {hash} not linked under {tag}"
                );
            }
        }
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.inner.read();
        f.debug_struct("Cache")
            .field("entries", &store.entries.len())
            .field("tags", &store.tags.len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpirationConfig;
    use std::thread::{self, sleep};

    fn tag_config() -> ExpirationConfig {
        ExpirationConfig::new(Duration::from_secs(300))
    }

    fn long() -> Expiration {
        Expiration::fixed_for(Duration::from_secs(300))
    }

    #[test]
    fn test_store_new() {
        let cache = Cache::new();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.tag_count(), 0);
    }

    #[test]
    fn test_store_set_and_get() {
        let cache = Cache::new();

        cache.set(long(), "key1", "value1".to_string());

        assert_eq!(cache.get::<String>("key1"), Some("value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let cache = Cache::new();
        assert!(cache.get_any("nonexistent").is_none());
    }

    #[test]
    fn test_store_get_wrong_type() {
        let cache = Cache::new();
        cache.set(long(), "n", 42u64);

        assert_eq!(cache.get::<u64>("n"), Some(42));
        assert_eq!(cache.get::<String>("n"), None);
    }

    #[test]
    fn test_store_delete() {
        let cache = Cache::new();

        cache.set(long(), "key1", 1);
        cache.delete("key1");

        assert!(cache.is_empty());
        assert!(cache.get_any("key1").is_none());
    }

    #[test]
    fn test_store_delete_nonexistent() {
        let cache = Cache::new();
        cache.delete("nonexistent");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_overwrite() {
        let cache = Cache::new();

        cache.set(long(), "key1", "value1".to_string());
        cache.set(long(), "key1", "value2".to_string());

        assert_eq!(cache.get::<String>("key1"), Some("value2".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_fixed_expiration() {
        let cache = Cache::new();

        cache.set(Expiration::fixed_for(Duration::from_millis(200)), "key1", 1);
        assert_eq!(cache.get::<i32>("key1"), Some(1));

        sleep(Duration::from_millis(300));

        // Expired but not yet swept
        assert!(cache.get_any("key1").is_none());
        assert_eq!(cache.len(), 1);
        assert!(cache.time_to_live("key1").is_none());
    }

    #[test]
    fn test_store_delete_by_tag() {
        let cache = Cache::new();
        let config = tag_config();

        cache.set(Expiration::with_tag(&config, "prices"), "BTCUSDT", 42_000);
        cache.set(Expiration::with_tag(&config, "prices"), "ETHUSDT", 2_500);
        cache.set(long(), "untagged", 1);

        assert_eq!(cache.delete_by_tag("prices"), 2);
        assert!(cache.get_any("BTCUSDT").is_none());
        assert!(cache.get_any("ETHUSDT").is_none());
        assert!(cache.get_any("untagged").is_some());

        assert_eq!(cache.delete_by_tag("prices"), 0);
        assert_eq!(cache.tag_count(), 0);
        cache.assert_tag_index_consistent();
    }

    #[test]
    fn test_store_delete_by_tag_unlinks_other_tags() {
        let cache = Cache::new();
        let policy = Expiration::with_tags(&tag_config(), ["x", "y"]).unwrap();

        cache.set(policy, "both", 1);
        cache.set(Expiration::with_tag(&tag_config(), "y"), "only_y", 2);

        cache.delete_by_tag("x");

        assert_eq!(cache.tagged_len("y"), 1);
        assert!(cache.get_any("only_y").is_some());
        cache.assert_tag_index_consistent();
    }

    #[test]
    fn test_store_overwrite_drops_stale_tags() {
        let cache = Cache::new();
        let config = tag_config();

        cache.set(Expiration::with_tag(&config, "old"), "k", 1);
        cache.set(Expiration::with_tag(&config, "new"), "k", 2);

        assert_eq!(cache.tagged_len("old"), 0);
        assert_eq!(cache.tagged_len("new"), 1);

        // Invalidating the stale tag must not touch the fresh entry
        assert_eq!(cache.delete_by_tag("old"), 0);
        assert_eq!(cache.get::<i32>("k"), Some(2));
        cache.assert_tag_index_consistent();
    }

    #[test]
    fn test_store_delete_unlinks_tags() {
        let cache = Cache::new();
        cache.set(Expiration::with_tag(&tag_config(), "t"), "k", 1);

        cache.delete("k");

        assert_eq!(cache.tag_count(), 0);
    }

    #[test]
    fn test_store_purge_expired() {
        let cache = Cache::new();
        let mut config = tag_config();
        config.set_default_lifetime(Duration::from_millis(100));

        cache.set(Expiration::with_tag(&config, "short"), "key1", 1);
        cache.set(long(), "key2", 2);

        sleep(Duration::from_millis(200));

        assert_eq!(cache.purge_expired(Instant::now()), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.tag_count(), 0);
        assert!(cache.get_any("key2").is_some());
        assert_eq!(cache.stats().expired_evictions, 1);
    }

    #[test]
    fn test_store_purge_skips_replaced_entry() {
        let cache = Cache::new();
        cache.set(Expiration::fixed_for(Duration::ZERO), "k", 1);
        cache.set(long(), "k", 2);

        assert_eq!(cache.purge_expired(Instant::now()), 0);
        assert_eq!(cache.get::<i32>("k"), Some(2));
    }

    #[test]
    fn test_store_time_to_live() {
        let cache = Cache::new();
        cache.set(Expiration::fixed_for(Duration::from_secs(10)), "k", 1);

        let ttl = cache.time_to_live("k").unwrap();
        assert!(ttl <= Duration::from_secs(10));
        assert!(ttl >= Duration::from_secs(9));
    }

    #[test]
    fn test_store_stats() {
        let cache = Cache::new();

        cache.set(Expiration::with_tag(&tag_config(), "t"), "key1", 1);
        cache.get_any("key1"); // hit
        cache.get_any("nonexistent"); // miss

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_tags, 1);
    }

    #[test]
    fn test_store_clear() {
        let cache = Cache::new();
        cache.set(Expiration::with_tag(&tag_config(), "t"), "a", 1);
        cache.set(long(), "b", 2);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.tag_count(), 0);
    }

    #[test]
    fn test_store_clones_share_storage() {
        let cache = Cache::new();
        let other = cache.clone();
        other.set(long(), "k", 1);

        assert_eq!(cache.get::<i32>("k"), Some(1));
        assert!(Cache::new().is_empty());
    }

    #[test]
    fn test_store_concurrent_access() {
        let cache = Cache::new();
        let config = tag_config();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{t}-{i}");
                        cache.set(Expiration::with_tag(&config, "shared"), &key, i);
                        assert_eq!(cache.get::<i32>(&key), Some(i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 800);
        assert_eq!(cache.tagged_len("shared"), 800);
        cache.assert_tag_index_consistent();
    }
}
