//! Unbounded map-backed statistics cache.
//!
//! The snapshot type used when no memory quota is enforced: a plain table
//! map with the same surface as the LRU-backed cache, but no inner LRU and
//! no eviction.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::stats::Table;

/// An unbounded statistics cache snapshot.
#[derive(Debug, Default)]
pub struct StatsMapCache {
    tables: RwLock<HashMap<i64, Arc<Table>>>,
}

impl StatsMapCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table. The move flag is meaningless without an LRU.
    pub fn get(&self, table_id: i64, _move_lru_front: bool) -> Option<Arc<Table>> {
        self.tables.read().get(&table_id).cloned()
    }

    /// Insert or replace a table.
    pub fn put(&self, table_id: i64, table: Arc<Table>, _move_lru_front: bool) {
        self.tables.write().insert(table_id, table);
    }

    /// Remove a table. No-op when absent.
    pub fn del(&self, table_id: i64) {
        self.tables.write().remove(&table_id);
    }

    /// Tracked cost. Nothing is tracked without a quota.
    pub fn cost(&self) -> i64 {
        0
    }

    /// Total memory usage across all cached tables.
    pub fn total_cost(&self) -> i64 {
        self.tables
            .read()
            .values()
            .map(|t| t.memory_usage().total_mem_usage)
            .sum()
    }

    /// Ids of all cached tables.
    pub fn keys(&self) -> Vec<i64> {
        self.tables.read().keys().copied().collect()
    }

    /// All cached tables.
    pub fn values(&self) -> Vec<Arc<Table>> {
        self.tables.read().values().cloned().collect()
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Check if the cache holds no tables.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce an unshared copy; tables stay shared by `Arc`.
    pub fn copy(&self) -> StatsMapCache {
        Self {
            tables: RwLock::new(self.tables.read().clone()),
        }
    }

    /// Capacity is meaningless without a quota.
    pub fn set_capacity(&self, _capacity: i64) {}

    /// Always the zero sentinel: there is no LRU order.
    pub fn front(&self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_table;

    #[test]
    fn test_map_cache_surface() {
        let cache = StatsMapCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.front(), 0);

        cache.put(1, mock_table(1, &[100], &[50]), true);
        cache.put(2, mock_table(2, &[25], &[]), false);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1, true).unwrap().physical_id, 1);
        assert_eq!(cache.cost(), 0);
        assert_eq!(cache.total_cost(), 175);

        let mut keys = cache.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2]);

        // No quota: capacity changes never evict anything.
        cache.set_capacity(1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.total_cost(), 175);

        cache.del(1);
        assert_eq!(cache.len(), 1);
        cache.del(1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_map_cache_copy_isolation() {
        let cache = StatsMapCache::new();
        cache.put(1, mock_table(1, &[10], &[]), false);

        let copy = cache.copy();
        copy.del(1);

        assert_eq!(cache.len(), 1);
        assert_eq!(copy.len(), 0);
    }
}
