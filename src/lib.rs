//! # statscache
//!
//! A memory-bounded cache for per-table optimizer statistics.
//!
//! The cache sits between a query optimizer and the persistent statistics
//! catalog. It keeps whole-table statistics bundles reachable by table id
//! while accounting and evicting memory at the granularity of individual
//! column and index statistic blobs.
//!
//! ## Features
//!
//! - **Two-level caching**: an outer table map over an inner item-level LRU
//! - **Fine-grained eviction**: columns and indices evict independently,
//!   each with its own memory cost
//! - **Copy-on-write snapshots**: readers hold immutable snapshots while
//!   writers install derived ones through a single atomic pointer swap
//! - **Quota switch**: a bounded LRU snapshot or an unbounded map snapshot
//!   behind the same surface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use statscache::{Options, StatsCachePointer};
//!
//! let options = Options::builder()
//!     .enable_mem_quota(true)
//!     .mem_quota_bytes(256 * 1024 * 1024)
//!     .build()?;
//!
//! let pointer = StatsCachePointer::new(&options);
//!
//! // Writers derive and install a new snapshot.
//! let next = pointer.copy_and_update(&[table], &[]);
//! pointer.replace(next);
//!
//! // Readers work against a stable snapshot.
//! let snapshot = pointer.load();
//! if let Some(tbl) = snapshot.get(table_id, false) {
//!     // plan with tbl ...
//! }
//! ```

// Public modules
pub mod error;
pub mod options;
pub mod stats;
pub mod testutil;

// Internal modules
mod cache;
mod metrics;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use options::{Options, OptionsBuilder};
pub use stats::{ItemMemoryUsage, Table, TableCacheItem, TableMemoryUsage};

// Cache surface
pub use cache::{StatsCache, StatsCachePointer, StatsLruCache, StatsMapCache};

// Metrics
pub use metrics::{CacheMetrics, CacheMetricsSnapshot, Counter, Gauge};
