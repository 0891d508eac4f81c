//! Mock statistics for tests and benchmarks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::stats::{ItemMemoryUsage, Table, TableCacheItem};

/// A mock statistic blob backed by atomics.
///
/// `drop_evicted` removes up to `step` tracked bytes per call, modelling a
/// real statistic that discards its costliest parts (sketches, top-N
/// values) first; the default step drops everything at once. Untracked
/// overhead survives eviction, like the fixed overhead of a real statistic.
#[derive(Debug)]
pub struct MockCacheItem {
    tracking: AtomicI64,
    untracked: i64,
    step: i64,
}

impl MockCacheItem {
    /// An item whose whole tracked usage evicts in one pass.
    pub fn new(tracking: i64) -> Self {
        Self {
            tracking: AtomicI64::new(tracking),
            untracked: 0,
            step: i64::MAX,
        }
    }

    /// An item shedding `step` tracked bytes per eviction pass.
    pub fn partial(tracking: i64, step: i64) -> Self {
        Self {
            tracking: AtomicI64::new(tracking),
            untracked: 0,
            step,
        }
    }

    /// An item with untracked fixed overhead on top of its tracked bytes.
    pub fn with_overhead(tracking: i64, untracked: i64) -> Self {
        Self {
            tracking: AtomicI64::new(tracking),
            untracked,
            step: i64::MAX,
        }
    }
}

impl TableCacheItem for MockCacheItem {
    fn memory_usage(&self) -> ItemMemoryUsage {
        let tracking = self.tracking.load(Ordering::Relaxed);
        ItemMemoryUsage {
            total_mem_usage: tracking + self.untracked,
            tracking_mem_usage: tracking,
        }
    }

    fn drop_evicted(&self) {
        let mut curr = self.tracking.load(Ordering::Relaxed);
        loop {
            let next = curr.saturating_sub(self.step).max(0);
            match self.tracking.compare_exchange_weak(
                curr,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(v) => curr = v,
            }
        }
    }

    fn is_all_evicted(&self) -> bool {
        self.tracking.load(Ordering::Relaxed) == 0
    }
}

/// Shorthand for an `Arc`'d one-shot mock item.
pub fn mock_item(tracking: i64) -> Arc<dyn TableCacheItem> {
    Arc::new(MockCacheItem::new(tracking))
}

/// Build a table whose columns and indices have the given tracked sizes.
///
/// Item ids are assigned sequentially from 1 within each kind.
pub fn mock_table(physical_id: i64, col_mems: &[i64], idx_mems: &[i64]) -> Arc<Table> {
    let mut table = Table::new(physical_id);
    table.realtime_count = 1_000;
    for (i, &mem) in col_mems.iter().enumerate() {
        table.columns.insert(i as i64 + 1, mock_item(mem));
    }
    for (i, &mem) in idx_mems.iter().enumerate() {
        table.indices.insert(i as i64 + 1, mock_item(mem));
    }
    Arc::new(table)
}

/// Like [`mock_table`], but columns shed memory gradually: each entry is
/// `(tracking, step)`.
pub fn mock_partial_table(physical_id: i64, cols: &[(i64, i64)]) -> Arc<Table> {
    let mut table = Table::new(physical_id);
    table.realtime_count = 1_000;
    for (i, &(mem, step)) in cols.iter().enumerate() {
        let item: Arc<dyn TableCacheItem> = Arc::new(MockCacheItem::partial(mem, step));
        table.columns.insert(i as i64 + 1, item);
    }
    Arc::new(table)
}
