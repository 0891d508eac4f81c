//! Metrics for cache operations.
//!
//! Thread-safe atomic primitives plus the counter bundle the cache
//! maintains:
//!
//! - **hit / miss / update / evict / del**: monotonic operation counters
//! - **capacity**: gauge, set on construction and on every capacity change

mod cache_metrics;
mod collector;

pub use cache_metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use collector::{Counter, Gauge};
