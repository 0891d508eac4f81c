//! The atomic cache pointer.
//!
//! A single atomically swappable cell holds the current immutable snapshot.
//! Readers load it and keep it as long as they need; writers derive a new
//! snapshot from the current one and install it with one swap. Concurrent
//! writers may lose updates (last replace wins); higher layers reconcile by
//! retrying or by partitioning writes per table id.

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{StatsCache, StatsLruCache, StatsMapCache};
use crate::options::Options;
use crate::stats::Table;

/// Atomic reference to the current statistics cache snapshot.
pub struct StatsCachePointer {
    current: ArcSwap<StatsCache>,
}

impl StatsCachePointer {
    /// Create a pointer holding an empty snapshot.
    ///
    /// With `enable_mem_quota` the snapshot is an LRU cache honoring
    /// `mem_quota_bytes` (below 1 meaning unbounded); otherwise it is an
    /// unbounded map cache.
    pub fn new(options: &Options) -> Self {
        let snapshot = if options.enable_mem_quota {
            StatsCache::Lru(StatsLruCache::new(options.mem_quota_bytes))
        } else {
            StatsCache::Map(StatsMapCache::new())
        };
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Get the currently installed snapshot.
    pub fn load(&self) -> Arc<StatsCache> {
        self.current.load_full()
    }

    /// Atomically install a new snapshot. Last writer wins.
    pub fn replace(&self, snapshot: StatsCache) {
        self.current.store(Arc::new(snapshot));
    }

    /// Derive a new snapshot from the current one.
    ///
    /// Copies the current snapshot, puts every added or updated table
    /// (fronting its items: fresh statistics are the most recently used),
    /// and deletes the given table ids. The result is unshared until the
    /// caller publishes it with [`replace`].
    ///
    /// [`replace`]: StatsCachePointer::replace
    pub fn copy_and_update(&self, tables: &[Arc<Table>], deleted: &[i64]) -> StatsCache {
        let snapshot = self.current.load().copy();
        for table in tables {
            snapshot.put(table.physical_id, Arc::clone(table), true);
        }
        for &table_id in deleted {
            snapshot.del(table_id);
        }
        snapshot
    }
}
