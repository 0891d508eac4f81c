//! Inner item-level LRU.
//!
//! A cost-bounded ordered collection of column and index statistic items
//! keyed by `(table_id, item_id, is_index)`. "Cost" is the sum of the live
//! items' tracked memory usage; eviction walks from the back until the cost
//! fits the capacity again.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::metrics::CacheMetrics;
use crate::stats::{ItemMemoryUsage, TableCacheItem};

/// Hook invoked with the owning table id whenever eviction touches one of
/// that table's items.
pub(crate) type EvictHook<'a> = &'a mut dyn FnMut(i64);

/// A node in the LRU linked list.
#[derive(Debug, Clone)]
struct LruNode {
    table_id: i64,
    item_id: i64,
    is_index: bool,
    item: Arc<dyn TableCacheItem>,
    item_mem: ItemMemoryUsage,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Per-table slots of the three-level index:
/// `table_id -> columns/indices -> item_id -> node index`.
#[derive(Debug, Clone, Default)]
struct TableSlots {
    columns: HashMap<i64, usize>,
    indices: HashMap<i64, usize>,
}

impl TableSlots {
    fn kind(&self, is_index: bool) -> &HashMap<i64, usize> {
        if is_index {
            &self.indices
        } else {
            &self.columns
        }
    }

    fn kind_mut(&mut self, is_index: bool) -> &mut HashMap<i64, usize> {
        if is_index {
            &mut self.indices
        } else {
            &mut self.columns
        }
    }
}

/// The item-level LRU backing a statistics cache snapshot.
///
/// Nodes live in index-linked storage (indices instead of pointers) so the
/// whole structure, ordering included, clones cheaply for snapshot copies.
/// Items themselves are shared by `Arc` between copies.
#[derive(Debug, Clone)]
pub(crate) struct InnerItemLru {
    /// Maximum tracked cost before eviction kicks in.
    capacity: i64,
    /// Running sum of the live entries' tracked memory usage.
    tracking_cost: i64,
    /// Three-level lookup index.
    elements: HashMap<i64, TableSlots>,
    /// Node storage.
    nodes: Vec<Option<LruNode>>,
    /// Free list of node indices.
    free_list: Vec<usize>,
    /// Head of LRU list (most recently used).
    head: Option<usize>,
    /// Tail of LRU list (least recently used).
    tail: Option<usize>,
    /// Shared operation counters.
    metrics: Arc<CacheMetrics>,
}

impl InnerItemLru {
    /// Create a new LRU. A capacity below 1 means unbounded.
    pub(crate) fn new(capacity: i64, metrics: Arc<CacheMetrics>) -> Self {
        let capacity = if capacity < 1 { i64::MAX } else { capacity };
        metrics.capacity.set(capacity);
        Self {
            capacity,
            tracking_cost: 0,
            elements: HashMap::new(),
            nodes: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            metrics,
        }
    }

    /// Look up an item and, on hit, move it to the front.
    pub(crate) fn get(
        &mut self,
        table_id: i64,
        item_id: i64,
        is_index: bool,
    ) -> Option<Arc<dyn TableCacheItem>> {
        let idx = match self.slot(table_id, item_id, is_index) {
            Some(idx) => idx,
            None => {
                self.metrics.misses.inc();
                return None;
            }
        };
        self.metrics.hits.inc();
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|n| Arc::clone(&n.item))
    }

    /// Insert or replace an item.
    ///
    /// An item whose tracked usage is below 1 is "free" and is not
    /// represented here at all; the call still counts as an update and
    /// still runs eviction when `need_evict` is set. Replacing an existing
    /// entry adjusts the cost by the usage delta and moves the entry to the
    /// front only when `need_move` is set; fresh entries always enter at
    /// the front.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn put(
        &mut self,
        table_id: i64,
        item_id: i64,
        is_index: bool,
        item: Arc<dyn TableCacheItem>,
        item_mem: ItemMemoryUsage,
        need_evict: bool,
        need_move: bool,
        on_evict: EvictHook,
    ) {
        self.insert(table_id, item_id, is_index, item, item_mem, need_move);
        self.metrics.updates.inc();
        if need_evict {
            self.evict_if_needed(on_evict);
        }
    }

    fn insert(
        &mut self,
        table_id: i64,
        item_id: i64,
        is_index: bool,
        item: Arc<dyn TableCacheItem>,
        item_mem: ItemMemoryUsage,
        need_move: bool,
    ) {
        if item_mem.tracking_mem_usage < 1 {
            return;
        }

        if let Some(idx) = self.slot(table_id, item_id, is_index) {
            let node = self.nodes[idx].as_mut().unwrap();
            let old_mem = node.item_mem;
            node.item = item;
            node.item_mem = item_mem;
            self.tracking_cost += item_mem.tracking_mem_usage - old_mem.tracking_mem_usage;
            if need_move {
                self.move_to_front(idx);
            }
            return;
        }

        let idx = self.allocate_node();
        self.nodes[idx] = Some(LruNode {
            table_id,
            item_id,
            is_index,
            item,
            item_mem,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(ref mut head_node) = self.nodes[head_idx] {
                head_node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.elements
            .entry(table_id)
            .or_default()
            .kind_mut(is_index)
            .insert(item_id, idx);
        self.tracking_cost += item_mem.tracking_mem_usage;
    }

    /// Remove an item. No-op when absent.
    pub(crate) fn del(&mut self, table_id: i64, item_id: i64, is_index: bool) {
        let idx = match self.slot(table_id, item_id, is_index) {
            Some(idx) => idx,
            None => return,
        };
        self.metrics.deletes.inc();
        let mem = self.nodes[idx].as_ref().unwrap().item_mem;
        self.tracking_cost -= mem.tracking_mem_usage;
        // Emptied per-table slots are left in place; lookups treat them as
        // absent.
        self.elements
            .get_mut(&table_id)
            .unwrap()
            .kind_mut(is_index)
            .remove(&item_id);
        self.unlink_node(idx);
        self.free_list.push(idx);
    }

    /// Change the capacity. A value below 1 means unbounded.
    pub(crate) fn set_capacity(&mut self, capacity: i64, on_evict: EvictHook) {
        let capacity = if capacity < 1 { i64::MAX } else { capacity };
        self.capacity = capacity;
        self.metrics.capacity.set(capacity);
        trace!(capacity, cost = self.tracking_cost, "capacity changed");
        self.evict_if_needed(on_evict);
    }

    /// Table id of the most recently used entry, or 0 when empty.
    pub(crate) fn front(&self) -> i64 {
        self.head
            .and_then(|idx| self.nodes[idx].as_ref())
            .map(|n| n.table_id)
            .unwrap_or(0)
    }

    /// Sum of the live entries' tracked memory usage.
    pub(crate) fn tracking_cost(&self) -> i64 {
        self.tracking_cost
    }

    pub(crate) fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Whether the index currently tracks the given item. Test support.
    #[cfg(test)]
    pub(crate) fn contains(&self, table_id: i64, item_id: i64, is_index: bool) -> bool {
        self.slot(table_id, item_id, is_index).is_some()
    }

    /// Item ids of one kind currently tracked for a table.
    pub(crate) fn tracked_ids(&self, table_id: i64, is_index: bool) -> Vec<i64> {
        self.elements
            .get(&table_id)
            .map(|slots| slots.kind(is_index).keys().copied().collect())
            .unwrap_or_default()
    }

    /// Walk from the back toward the front until the cost fits the capacity.
    ///
    /// Each step asks the item to drop its costliest evictable contents and
    /// re-reads its usage. A fully drained item leaves the list; a partially
    /// evicted one is parked at the front so this pass does not reconsider
    /// it (its cheapest-to-keep remainder was just paid for). The hook fires
    /// for every touched entry with the owning table id.
    fn evict_if_needed(&mut self, on_evict: EvictHook) {
        let mut curr = self.tail;
        let mut touched = 0u64;
        while self.tracking_cost > self.capacity {
            let idx = match curr {
                Some(idx) => idx,
                None => break,
            };
            let (prev, table_id, item, old_mem) = {
                let node = self.nodes[idx].as_ref().unwrap();
                (node.prev, node.table_id, Arc::clone(&node.item), node.item_mem)
            };

            item.drop_evicted();
            let new_mem = item.memory_usage();
            debug_assert!(
                new_mem.tracking_mem_usage <= old_mem.tracking_mem_usage,
                "drop_evicted must not grow tracked usage (table {})",
                table_id
            );
            self.tracking_cost += new_mem.tracking_mem_usage - old_mem.tracking_mem_usage;

            if new_mem.tracking_mem_usage == 0 || item.is_all_evicted() {
                let (item_id, is_index) = {
                    let node = self.nodes[idx].as_ref().unwrap();
                    (node.item_id, node.is_index)
                };
                self.elements
                    .get_mut(&table_id)
                    .unwrap()
                    .kind_mut(is_index)
                    .remove(&item_id);
                self.unlink_node(idx);
                self.free_list.push(idx);
            } else {
                let node = self.nodes[idx].as_mut().unwrap();
                node.item_mem = new_mem;
                self.move_to_front(idx);
            }

            self.metrics.evictions.inc();
            touched += 1;
            on_evict(table_id);
            curr = prev;
        }
        if touched > 0 {
            trace!(
                touched,
                cost = self.tracking_cost,
                capacity = self.capacity,
                "evicted inner entries"
            );
        }
    }

    fn slot(&self, table_id: i64, item_id: i64, is_index: bool) -> Option<usize> {
        self.elements
            .get(&table_id)
            .and_then(|slots| slots.kind(is_index).get(&item_id))
            .copied()
    }

    fn allocate_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        let (prev, next) = {
            let node = self.nodes[idx].as_ref().unwrap();
            (node.prev, node.next)
        };

        if let Some(prev_idx) = prev {
            if let Some(ref mut prev_node) = self.nodes[prev_idx] {
                prev_node.next = next;
            }
        }
        if let Some(next_idx) = next {
            if let Some(ref mut next_node) = self.nodes[next_idx] {
                next_node.prev = prev;
            }
        }
        if self.tail == Some(idx) {
            self.tail = prev;
        }

        if let Some(ref mut node) = self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }
        if let Some(head_idx) = self.head {
            if let Some(ref mut head_node) = self.nodes[head_idx] {
                head_node.prev = Some(idx);
            }
        }
        self.head = Some(idx);
    }

    fn unlink_node(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.nodes[idx].take().unwrap();
            (node.prev, node.next)
        };

        if let Some(prev_idx) = prev {
            if let Some(ref mut prev_node) = self.nodes[prev_idx] {
                prev_node.next = next;
            }
        } else {
            self.head = next;
        }

        if let Some(next_idx) = next {
            if let Some(ref mut next_node) = self.nodes[next_idx] {
                next_node.prev = prev;
            }
        } else {
            self.tail = prev;
        }
    }

    /// Keys in LRU order, back (least recent) first. Test support.
    #[cfg(test)]
    fn keys_back_to_front(&self) -> Vec<(i64, i64, bool)> {
        let mut keys = Vec::new();
        let mut curr = self.tail;
        while let Some(idx) = curr {
            let node = self.nodes[idx].as_ref().unwrap();
            keys.push((node.table_id, node.item_id, node.is_index));
            curr = node.prev;
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockCacheItem;

    fn lru(capacity: i64) -> InnerItemLru {
        InnerItemLru::new(capacity, Arc::new(CacheMetrics::new()))
    }

    fn item(tracking: i64) -> Arc<dyn TableCacheItem> {
        Arc::new(MockCacheItem::new(tracking))
    }

    fn mem(tracking: i64) -> ItemMemoryUsage {
        ItemMemoryUsage {
            total_mem_usage: tracking,
            tracking_mem_usage: tracking,
        }
    }

    #[test]
    fn test_put_get_order() {
        let mut lru = lru(1000);
        lru.put(1, 1, false, item(10), mem(10), true, false, &mut |_| {});
        lru.put(1, 2, false, item(20), mem(20), true, false, &mut |_| {});
        lru.put(2, 1, true, item(30), mem(30), true, false, &mut |_| {});

        assert_eq!(lru.tracking_cost(), 60);
        assert_eq!(lru.front(), 2);
        assert_eq!(
            lru.keys_back_to_front(),
            vec![(1, 1, false), (1, 2, false), (2, 1, true)]
        );

        // A hit moves the entry to the front.
        assert!(lru.get(1, 1, false).is_some());
        assert_eq!(lru.front(), 1);
        assert_eq!(
            lru.keys_back_to_front(),
            vec![(1, 2, false), (2, 1, true), (1, 1, false)]
        );

        assert!(lru.get(9, 9, false).is_none());
    }

    #[test]
    fn test_put_replace_adjusts_cost() {
        let mut lru = lru(1000);
        lru.put(1, 1, false, item(10), mem(10), true, false, &mut |_| {});
        lru.put(1, 2, false, item(20), mem(20), true, false, &mut |_| {});
        assert_eq!(lru.tracking_cost(), 30);

        // Replace without moving keeps the order.
        lru.put(1, 1, false, item(50), mem(50), true, false, &mut |_| {});
        assert_eq!(lru.tracking_cost(), 70);
        assert_eq!(lru.front(), 1);
        assert_eq!(
            lru.keys_back_to_front(),
            vec![(1, 1, false), (1, 2, false)]
        );

        // Replace with needMove fronts the entry.
        lru.put(1, 1, false, item(5), mem(5), true, true, &mut |_| {});
        assert_eq!(lru.tracking_cost(), 25);
        assert_eq!(
            lru.keys_back_to_front(),
            vec![(1, 2, false), (1, 1, false)]
        );
    }

    #[test]
    fn test_zero_tracking_not_inserted() {
        let mut lru = lru(1000);
        lru.put(1, 1, false, item(0), mem(0), true, false, &mut |_| {});
        assert!(!lru.contains(1, 1, false));
        assert_eq!(lru.tracking_cost(), 0);
        assert_eq!(lru.front(), 0);
        // The call still counted as an update.
        assert_eq!(lru.metrics.updates.get(), 1);
    }

    #[test]
    fn test_del_accounting() {
        let mut lru = lru(1000);
        lru.put(1, 1, false, item(10), mem(10), true, false, &mut |_| {});
        lru.put(1, 1, true, item(15), mem(15), true, false, &mut |_| {});

        // Column and index share ids without clashing.
        assert!(lru.contains(1, 1, false));
        assert!(lru.contains(1, 1, true));

        lru.del(1, 1, false);
        assert!(!lru.contains(1, 1, false));
        assert!(lru.contains(1, 1, true));
        assert_eq!(lru.tracking_cost(), 15);

        // Deleting an absent key is a no-op.
        lru.del(1, 1, false);
        assert_eq!(lru.tracking_cost(), 15);
        assert_eq!(lru.metrics.deletes.get(), 1);
    }

    #[test]
    fn test_eviction_from_back() {
        let mut lru = lru(100);
        let mut evicted = Vec::new();
        lru.put(1, 1, false, item(60), mem(60), true, false, &mut |_| {});
        lru.put(2, 1, false, item(60), mem(60), true, false, &mut |id| {
            evicted.push(id)
        });

        // The back entry (table 1) was fully dropped.
        assert_eq!(lru.tracking_cost(), 60);
        assert!(!lru.contains(1, 1, false));
        assert!(lru.contains(2, 1, false));
        assert_eq!(evicted, vec![1]);
        assert_eq!(lru.metrics.evictions.get(), 1);
    }

    #[test]
    fn test_partial_eviction_parks_at_front() {
        let mut lru = lru(100);
        // Drops 40 per pass: 80 -> 40 -> 0.
        let partial: Arc<dyn TableCacheItem> = Arc::new(MockCacheItem::partial(80, 40));
        lru.put(1, 1, false, Arc::clone(&partial), partial.memory_usage(), true, false, &mut |_| {});
        lru.put(2, 1, false, item(70), mem(70), true, false, &mut |_| {});

        // 150 > 100: table 1's item shrinks to 40 and parks at the front,
        // then table 2's (now at the back) is fully dropped.
        assert_eq!(lru.tracking_cost(), 40);
        assert!(lru.contains(1, 1, false));
        assert!(!lru.contains(2, 1, false));
        assert_eq!(lru.front(), 1);
        assert!(!partial.is_all_evicted());
    }

    #[test]
    fn test_oversized_item_fully_evicted() {
        let mut lru = lru(10);
        let big: Arc<dyn TableCacheItem> = Arc::new(MockCacheItem::new(500));
        lru.put(1, 1, false, Arc::clone(&big), big.memory_usage(), true, false, &mut |_| {});

        assert_eq!(lru.tracking_cost(), 0);
        assert!(!lru.contains(1, 1, false));
        assert!(big.is_all_evicted());
    }

    #[test]
    fn test_set_capacity_unbounded() {
        let mut lru = lru(0);
        assert_eq!(lru.capacity(), i64::MAX);

        lru.put(1, 1, false, item(1_000_000), mem(1_000_000), true, false, &mut |_| {});
        assert_eq!(lru.tracking_cost(), 1_000_000);
        assert_eq!(lru.metrics.evictions.get(), 0);

        // Shrinking evicts immediately.
        lru.set_capacity(10, &mut |_| {});
        assert_eq!(lru.tracking_cost(), 0);
        assert_eq!(lru.metrics.capacity.get(), 10);

        lru.set_capacity(-3, &mut |_| {});
        assert_eq!(lru.capacity(), i64::MAX);
        assert_eq!(lru.metrics.capacity.get(), i64::MAX);
    }

    #[test]
    fn test_clone_preserves_order_and_cost() {
        let mut lru = lru(1000);
        lru.put(1, 1, false, item(10), mem(10), true, false, &mut |_| {});
        lru.put(2, 1, false, item(20), mem(20), true, false, &mut |_| {});
        let _ = lru.get(1, 1, false);

        let copy = lru.clone();
        assert_eq!(copy.tracking_cost(), lru.tracking_cost());
        assert_eq!(copy.capacity(), lru.capacity());
        assert_eq!(copy.keys_back_to_front(), lru.keys_back_to_front());
        assert_eq!(copy.front(), 1);
    }
}
