//! The counter bundle maintained by the statistics cache.

use super::collector::{Counter, Gauge};

/// Counters and gauges for statistics cache operations.
///
/// One bundle is shared across a cache and every snapshot copied from it,
/// so derived snapshots keep accumulating into the same counters.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Inner LRU lookups that found the item.
    pub hits: Counter,
    /// Inner LRU lookups that missed.
    pub misses: Counter,
    /// Item insertions and replacements.
    pub updates: Counter,
    /// Entries touched by eviction.
    pub evictions: Counter,
    /// Item deletions.
    pub deletes: Counter,
    /// Configured capacity in bytes.
    pub capacity: Gauge,
}

impl CacheMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.get();
        let misses = self.misses.get();
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Reset all counters. The capacity gauge is left untouched.
    pub fn reset(&self) {
        self.hits.reset();
        self.misses.reset();
        self.updates.reset();
        self.evictions.reset();
        self.deletes.reset();
    }

    /// Capture a point-in-time snapshot of all values.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.get(),
            misses: self.misses.get(),
            updates: self.updates.get(),
            evictions: self.evictions.get(),
            deletes: self.deletes.get(),
            capacity: self.capacity.get(),
        }
    }
}

/// A point-in-time capture of [`CacheMetrics`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub updates: u64,
    pub evictions: u64,
    pub deletes: u64,
    pub capacity: i64,
}
