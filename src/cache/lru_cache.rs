//! Outer statistics cache backed by the item-level LRU.
//!
//! Presents a whole-table view: a table is present or absent as a unit,
//! while its columns and indices are tracked (and evicted) independently by
//! the inner LRU. A table whose items have all been evicted remains
//! reachable by id as an empty skeleton until an explicit delete or a
//! replacing put.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::lru::InnerItemLru;
use crate::metrics::CacheMetrics;
use crate::stats::{Table, TableMemoryUsage};

/// An outer entry: the table plus its last computed memory usage.
#[derive(Debug, Clone)]
struct TableEntry {
    table: Arc<Table>,
    mem_usage: TableMemoryUsage,
}

/// Everything guarded by the snapshot's lock.
#[derive(Debug, Clone)]
struct LruCore {
    elements: HashMap<i64, TableEntry>,
    lru: InnerItemLru,
}

/// The memory-bounded statistics cache snapshot.
///
/// One readers-writer lock guards the table map and the inner LRU together.
/// Lookups that reorder the LRU count as writes.
#[derive(Debug)]
pub struct StatsLruCache {
    core: RwLock<LruCore>,
    metrics: Arc<CacheMetrics>,
}

impl StatsLruCache {
    /// Create a new cache. A capacity below 1 means unbounded.
    pub fn new(capacity: i64) -> Self {
        let metrics = Arc::new(CacheMetrics::new());
        Self {
            core: RwLock::new(LruCore {
                elements: HashMap::new(),
                lru: InnerItemLru::new(capacity, Arc::clone(&metrics)),
            }),
            metrics,
        }
    }

    /// Look up a table.
    ///
    /// With `move_lru_front` set, the lookup runs under the write lock and
    /// touches every index and column of the hit table so its items front
    /// the LRU; otherwise it is a read-only lookup.
    pub fn get(&self, table_id: i64, move_lru_front: bool) -> Option<Arc<Table>> {
        if move_lru_front {
            return self.get_by_query(table_id);
        }
        let core = self.core.read();
        core.elements.get(&table_id).map(|e| Arc::clone(&e.table))
    }

    fn get_by_query(&self, table_id: i64) -> Option<Arc<Table>> {
        let mut core = self.core.write();
        let table = Arc::clone(&core.elements.get(&table_id)?.table);
        for &idx_id in table.indices.keys() {
            core.lru.get(table_id, idx_id, true);
        }
        for &col_id in table.columns.keys() {
            core.lru.get(table_id, col_id, false);
        }
        Some(table)
    }

    /// Insert or replace a table.
    ///
    /// Columns and indices fan out into the inner LRU one by one, evicting
    /// as needed; ids the new table no longer carries are dropped from the
    /// LRU. `move_lru_front` controls whether replaced items are fronted.
    pub fn put(&self, table_id: i64, table: Arc<Table>, move_lru_front: bool) {
        let mut core = self.core.write();
        let mem_usage = table.memory_usage();
        core.put(table_id, table, &mem_usage, move_lru_front);
    }

    /// Remove a table and all its tracked items. No-op when absent.
    pub fn del(&self, table_id: i64) {
        let mut core = self.core.write();
        let table = match core.elements.get(&table_id) {
            Some(entry) => Arc::clone(&entry.table),
            None => return,
        };
        for &idx_id in table.indices.keys() {
            core.lru.del(table_id, idx_id, true);
        }
        for &col_id in table.columns.keys() {
            core.lru.del(table_id, col_id, false);
        }
        core.elements.remove(&table_id);
    }

    /// Tracked cost: the inner LRU's running sum.
    pub fn cost(&self) -> i64 {
        self.core.read().lru.tracking_cost()
    }

    /// Total memory usage across all cached tables.
    ///
    /// **This is not a pure query.** Under the write lock it recomputes
    /// every table's memory usage and re-puts the table so the inner LRU
    /// sees up-to-date per-item costs, then sums the refreshed totals.
    pub fn total_cost(&self) -> i64 {
        let mut core = self.core.write();
        let table_ids: Vec<i64> = core.elements.keys().copied().collect();
        let mut total = 0;
        for table_id in table_ids {
            core.fresh_table_cost(table_id);
            if let Some(entry) = core.elements.get(&table_id) {
                total += entry.mem_usage.total_mem_usage;
            }
        }
        total
    }

    /// Ids of all cached tables.
    pub fn keys(&self) -> Vec<i64> {
        let core = self.core.read();
        core.elements.keys().copied().collect()
    }

    /// All cached tables.
    pub fn values(&self) -> Vec<Arc<Table>> {
        let core = self.core.read();
        core.elements.values().map(|e| Arc::clone(&e.table)).collect()
    }

    /// Number of cached tables. Unaffected by inner-LRU eviction.
    pub fn len(&self) -> usize {
        self.core.read().elements.len()
    }

    /// Check if the cache holds no tables.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce an unshared copy of this snapshot.
    ///
    /// The table map is cloned shallowly (tables are shared by `Arc`) and
    /// the inner LRU is deep-copied with its order intact; statistic items
    /// stay shared between the copies. The metrics handle is shared so the
    /// whole lineage accumulates into one set of counters.
    pub fn copy(&self) -> StatsLruCache {
        let core = self.core.read();
        StatsLruCache {
            core: RwLock::new(core.clone()),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Change the capacity, evicting as needed. Below 1 means unbounded.
    pub fn set_capacity(&self, capacity: i64) {
        let mut core = self.core.write();
        let LruCore { elements, lru } = &mut *core;
        lru.set_capacity(capacity, &mut |tbl_id| {
            if let Some(entry) = elements.get_mut(&tbl_id) {
                entry.mem_usage = entry.table.memory_usage();
            }
        });
    }

    /// Table id of the most recently used inner entry, or 0 when empty.
    pub fn front(&self) -> i64 {
        self.core.read().lru.front()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> i64 {
        self.core.read().lru.capacity()
    }

    /// Shared handle to the operation counters.
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Whether the inner LRU tracks the given item. Test support.
    #[cfg(test)]
    pub(crate) fn tracks(&self, table_id: i64, item_id: i64, is_index: bool) -> bool {
        self.core.read().lru.contains(table_id, item_id, is_index)
    }
}

impl LruCore {
    fn put(
        &mut self,
        table_id: i64,
        table: Arc<Table>,
        tbl_mem: &TableMemoryUsage,
        need_move: bool,
    ) {
        let exist = self.elements.contains_key(&table_id);
        self.update_columns(table_id, &table, tbl_mem, need_move);
        self.update_indices(table_id, &table, tbl_mem, need_move);
        // Eviction during the item puts may already have shrunk what
        // belongs to this table, so its usage is recomputed before storing.
        let mem_usage = table.memory_usage();
        if exist {
            let entry = self.elements.get_mut(&table_id).unwrap();
            entry.table = table;
            entry.mem_usage = mem_usage;
        } else {
            self.elements.insert(table_id, TableEntry { table, mem_usage });
        }
    }

    fn update_columns(
        &mut self,
        table_id: i64,
        table: &Table,
        tbl_mem: &TableMemoryUsage,
        need_move: bool,
    ) {
        let Self { elements, lru } = self;
        if elements.contains_key(&table_id) {
            let stale: Vec<i64> = lru
                .tracked_ids(table_id, false)
                .into_iter()
                .filter(|id| !table.columns.contains_key(id))
                .collect();
            for col_id in stale {
                lru.del(table_id, col_id, false);
            }
        }
        for (&col_id, col) in &table.columns {
            let col_mem = tbl_mem
                .columns_mem_usage
                .get(&col_id)
                .copied()
                .unwrap_or_default();
            lru.put(
                table_id,
                col_id,
                false,
                Arc::clone(col),
                col_mem,
                true,
                need_move,
                &mut |tbl_id| {
                    if let Some(entry) = elements.get_mut(&tbl_id) {
                        entry.mem_usage = entry.table.memory_usage();
                    }
                },
            );
        }
    }

    fn update_indices(
        &mut self,
        table_id: i64,
        table: &Table,
        tbl_mem: &TableMemoryUsage,
        need_move: bool,
    ) {
        let Self { elements, lru } = self;
        if elements.contains_key(&table_id) {
            let stale: Vec<i64> = lru
                .tracked_ids(table_id, true)
                .into_iter()
                .filter(|id| !table.indices.contains_key(id))
                .collect();
            for idx_id in stale {
                lru.del(table_id, idx_id, true);
            }
        }
        for (&idx_id, idx) in &table.indices {
            let idx_mem = tbl_mem
                .indices_mem_usage
                .get(&idx_id)
                .copied()
                .unwrap_or_default();
            lru.put(
                table_id,
                idx_id,
                true,
                Arc::clone(idx),
                idx_mem,
                true,
                need_move,
                &mut |tbl_id| {
                    if let Some(entry) = elements.get_mut(&tbl_id) {
                        entry.mem_usage = entry.table.memory_usage();
                    }
                },
            );
        }
    }

    /// Recompute one table's usage and re-put it so the inner LRU sees
    /// current per-item costs.
    fn fresh_table_cost(&mut self, table_id: i64) {
        let (table, mem_usage) = match self.elements.get_mut(&table_id) {
            Some(entry) => {
                entry.mem_usage = entry.table.memory_usage();
                (Arc::clone(&entry.table), entry.mem_usage.clone())
            }
            None => return,
        };
        self.put(table_id, table, &mem_usage, false);
    }
}
