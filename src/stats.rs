//! Statistics data model: tables and their evictable items.
//!
//! A [`Table`] bundles the whole statistics object for one logical table:
//! row-count metadata plus one [`TableCacheItem`] per column and per index.
//! The table is the unit of presence in the outer cache; its items are the
//! units of eviction in the inner LRU.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An evictable statistic unit (a column or an index statistic blob).
///
/// Items are shared by reference between cache snapshots and are logically
/// immutable, except for the in-place shrinkage performed by
/// [`drop_evicted`] during eviction. Implementations must use interior
/// mutability so that:
///
/// - `drop_evicted` is idempotent once the item is fully evicted,
/// - `memory_usage` stays valid while `drop_evicted` runs from another
///   snapshot, and
/// - the tracked usage only ever shrinks across `drop_evicted` calls.
///
/// [`drop_evicted`]: TableCacheItem::drop_evicted
pub trait TableCacheItem: fmt::Debug + Send + Sync {
    /// Current memory footprint of the item.
    ///
    /// Pure with respect to internal state between mutations.
    fn memory_usage(&self) -> ItemMemoryUsage;

    /// Discard the costliest evictable contents of the item.
    fn drop_evicted(&self);

    /// Whether everything evictable has been discarded.
    fn is_all_evicted(&self) -> bool;
}

/// Memory footprint of a single column or index statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemMemoryUsage {
    /// Total memory held by the item.
    pub total_mem_usage: i64,
    /// The portion accounted against the cache quota.
    ///
    /// The remainder (fixed overhead) is considered free and is never
    /// represented in the inner LRU.
    pub tracking_mem_usage: i64,
}

/// Memory footprint of a whole table, broken down per item.
#[derive(Debug, Clone, Default)]
pub struct TableMemoryUsage {
    /// Sum of all items' total memory.
    pub total_mem_usage: i64,
    /// Per-column breakdown, keyed by column id.
    pub columns_mem_usage: HashMap<i64, ItemMemoryUsage>,
    /// Per-index breakdown, keyed by index id.
    pub indices_mem_usage: HashMap<i64, ItemMemoryUsage>,
}

/// A logical table's whole statistics bundle.
///
/// Tables are shared between snapshots via `Arc` and never mutated
/// structurally after publication; replacing statistics means putting a new
/// `Table` under the same physical id.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Physical table id.
    pub physical_id: i64,
    /// Row count as last observed.
    pub realtime_count: i64,
    /// Rows modified since the statistics were collected.
    pub modify_count: i64,
    /// Column statistics, keyed by column id.
    pub columns: HashMap<i64, Arc<dyn TableCacheItem>>,
    /// Index statistics, keyed by index id.
    pub indices: HashMap<i64, Arc<dyn TableCacheItem>>,
}

impl Table {
    /// Create an empty table with the given physical id.
    pub fn new(physical_id: i64) -> Self {
        Self {
            physical_id,
            ..Default::default()
        }
    }

    /// Compute the table's current memory usage with per-item breakdowns.
    ///
    /// Recomputed (not cached) because eviction shrinks items in place.
    pub fn memory_usage(&self) -> TableMemoryUsage {
        let mut usage = TableMemoryUsage {
            columns_mem_usage: HashMap::with_capacity(self.columns.len()),
            indices_mem_usage: HashMap::with_capacity(self.indices.len()),
            ..Default::default()
        };
        for (&col_id, col) in &self.columns {
            let mem = col.memory_usage();
            usage.total_mem_usage += mem.total_mem_usage;
            usage.columns_mem_usage.insert(col_id, mem);
        }
        for (&idx_id, idx) in &self.indices {
            let mem = idx.memory_usage();
            usage.total_mem_usage += mem.total_mem_usage;
            usage.indices_mem_usage.insert(idx_id, mem);
        }
        usage
    }
}
