//! Benchmarks for statscache snapshot churn.

use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use statscache::testutil::mock_table;
use statscache::{Options, StatsCachePointer};

fn pointer_with_quota(enable_mem_quota: bool) -> StatsCachePointer {
    let options = Options::builder()
        .enable_mem_quota(enable_mem_quota)
        .mem_quota_bytes(0)
        .build()
        .unwrap();
    StatsCachePointer::new(&options)
}

/// Concurrent copy-update-replace cycles against one pointer, the write
/// path statistics refreshes exercise in production.
fn bench_copy_and_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_and_update");

    for (name, enable_quota) in [("lru", true), ("map", false)] {
        group.throughput(Throughput::Elements(64));
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &enable_quota,
            |b, &enable_quota| {
                b.iter_with_setup(
                    || Arc::new(pointer_with_quota(enable_quota)),
                    |pointer| {
                        let handles: Vec<_> = (0..4)
                            .map(|_| {
                                let pointer = Arc::clone(&pointer);
                                thread::spawn(move || {
                                    let mut rng = rand::thread_rng();
                                    for _ in 0..16 {
                                        let id = rng.gen_range(1..i64::MAX);
                                        let table = mock_table(id, &[64, 64], &[64]);
                                        let next =
                                            pointer.copy_and_update(&[table], &[]);
                                        pointer.replace(next);
                                    }
                                })
                            })
                            .collect();
                        for h in handles {
                            h.join().unwrap();
                        }
                    },
                );
            },
        );
    }

    group.finish();
}

/// Single-threaded put/get churn on one LRU snapshot under a tight quota,
/// keeping the eviction path hot.
fn bench_lru_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_eviction_churn");

    for tables in [64usize, 256] {
        group.throughput(Throughput::Elements(tables as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(tables),
            &tables,
            |b, &tables| {
                b.iter_with_setup(
                    || {
                        let options = Options::builder()
                            .enable_mem_quota(true)
                            .mem_quota_bytes(tables as i64 * 64)
                            .build()
                            .unwrap();
                        StatsCachePointer::new(&options)
                    },
                    |pointer| {
                        let snapshot = pointer.load();
                        for id in 1..=tables as i64 {
                            snapshot.put(id, mock_table(id, &[64, 64], &[64]), false);
                            let _ = snapshot.get(id, true);
                        }
                    },
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_copy_and_update, bench_lru_eviction_churn);
criterion_main!(benches);
