//! Statistics cache snapshots and the atomic pointer over them.
//!
//! This module provides the cache core:
//!
//! - **Inner LRU**: item-level, cost-bounded eviction of column and index
//!   statistics
//! - **StatsLruCache**: the memory-bounded snapshot (outer table map over
//!   the inner LRU)
//! - **StatsMapCache**: the unbounded map-backed snapshot
//! - **StatsCachePointer**: the atomic cell readers and writers exchange
//!   snapshots through

mod lru;
mod lru_cache;
mod map_cache;
mod pointer;

pub use lru_cache::StatsLruCache;
pub use map_cache::StatsMapCache;
pub use pointer::StatsCachePointer;

use std::sync::Arc;

use crate::stats::Table;

/// A statistics cache snapshot.
///
/// The two variants share one surface so [`StatsCachePointer::replace`]
/// accepts either; which one a pointer produces is decided once, at
/// construction, by [`Options::enable_mem_quota`].
///
/// A snapshot reachable through the pointer is immutable from a reader's
/// standpoint: readers only call the read-only accessors, writers derive a
/// fresh snapshot with [`copy`] and mutate that before publishing it.
///
/// [`copy`]: StatsCache::copy
/// [`Options::enable_mem_quota`]: crate::Options
#[derive(Debug)]
pub enum StatsCache {
    /// Memory-bounded LRU snapshot.
    Lru(StatsLruCache),
    /// Unbounded map snapshot.
    Map(StatsMapCache),
}

impl StatsCache {
    /// Look up a table; with `move_lru_front`, touch its items to the
    /// front of the LRU (a write).
    pub fn get(&self, table_id: i64, move_lru_front: bool) -> Option<Arc<Table>> {
        match self {
            StatsCache::Lru(c) => c.get(table_id, move_lru_front),
            StatsCache::Map(c) => c.get(table_id, move_lru_front),
        }
    }

    /// Insert or replace a table.
    pub fn put(&self, table_id: i64, table: Arc<Table>, move_lru_front: bool) {
        match self {
            StatsCache::Lru(c) => c.put(table_id, table, move_lru_front),
            StatsCache::Map(c) => c.put(table_id, table, move_lru_front),
        }
    }

    /// Remove a table. No-op when absent.
    pub fn del(&self, table_id: i64) {
        match self {
            StatsCache::Lru(c) => c.del(table_id),
            StatsCache::Map(c) => c.del(table_id),
        }
    }

    /// Tracked cost of the snapshot.
    pub fn cost(&self) -> i64 {
        match self {
            StatsCache::Lru(c) => c.cost(),
            StatsCache::Map(c) => c.cost(),
        }
    }

    /// Total memory usage across all cached tables.
    ///
    /// On the LRU variant this refreshes per-item accounting as a side
    /// effect; see [`StatsLruCache::total_cost`].
    pub fn total_cost(&self) -> i64 {
        match self {
            StatsCache::Lru(c) => c.total_cost(),
            StatsCache::Map(c) => c.total_cost(),
        }
    }

    /// Ids of all cached tables.
    pub fn keys(&self) -> Vec<i64> {
        match self {
            StatsCache::Lru(c) => c.keys(),
            StatsCache::Map(c) => c.keys(),
        }
    }

    /// All cached tables.
    pub fn values(&self) -> Vec<Arc<Table>> {
        match self {
            StatsCache::Lru(c) => c.values(),
            StatsCache::Map(c) => c.values(),
        }
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        match self {
            StatsCache::Lru(c) => c.len(),
            StatsCache::Map(c) => c.len(),
        }
    }

    /// Check if the snapshot holds no tables.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce an unshared copy of the same variant.
    pub fn copy(&self) -> StatsCache {
        match self {
            StatsCache::Lru(c) => StatsCache::Lru(c.copy()),
            StatsCache::Map(c) => StatsCache::Map(c.copy()),
        }
    }

    /// Change the capacity. Below 1 means unbounded; a no-op on the map
    /// variant.
    pub fn set_capacity(&self, capacity: i64) {
        match self {
            StatsCache::Lru(c) => c.set_capacity(capacity),
            StatsCache::Map(c) => c.set_capacity(capacity),
        }
    }

    /// Table id of the most recently used inner entry, or 0.
    pub fn front(&self) -> i64 {
        match self {
            StatsCache::Lru(c) => c.front(),
            StatsCache::Map(c) => c.front(),
        }
    }
}
