//! Cache Statistics Module
//!
//! Tracks cache metrics including hits, misses and removals.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries removed by sweeper passes
    pub expired_evictions: u64,
    /// Number of entries removed through tag invalidation
    pub tag_invalidations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current number of tags in the tag index
    pub total_tags: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by every handle of one cache.
///
/// Hits and misses are recorded while only the read lock is held, hence atomics.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
    tag_invalidations: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self, count: usize) {
        self.expired_evictions
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_tag_invalidation(&self, count: usize) {
        self.tag_invalidations
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_entries: usize, total_tags: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
            tag_invalidations: self.tag_invalidations.load(Ordering::Relaxed),
            total_entries,
            total_tags,
        }
    }
}
