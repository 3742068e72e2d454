//! Bounded scheduler benchmark suite for Pledge.
//!
//! Benchmarks the hot paths of the collection machinery:
//! - Synchronous operations: scheduler bookkeeping without timers
//! - Timer-backed operations: refill behaviour under a ceiling
//! - Chains: microtask throughput of `then`
//! - Folds: the inline fast path for synchronous steps

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pledge::runtime::{self, set_timer};
use pledge::{map_limited, ready, Collection, Concurrency, Future, Resolution};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn fulfill_after(ms: u64, value: u64) -> Future<u64> {
    let (future, resolver) = Future::pending();
    set_timer(ms, move || resolver.fulfill(value));
    future
}

fn inputs(count: u64) -> Vec<u64> {
    (0..count).collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_sync_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_limited/sync");
    for count in [16_u64, 256, 4096] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let out = map_limited(inputs(count), Concurrency::limited(8), |x| ready(x + 1));
                black_box(runtime::block_on(&out))
            })
        });
    }
    group.finish();
}

fn bench_timer_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_limited/timers");
    for limit in [1_usize, 4, 32] {
        group.throughput(Throughput::Elements(256));
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| {
                let out = map_limited(inputs(256), Concurrency::limited(limit), |x| {
                    Ok(Resolution::Future(fulfill_after(x % 7, x)))
                });
                black_box(runtime::block_on(&out))
            })
        });
    }
    group.finish();
}

fn bench_then_chain(c: &mut Criterion) {
    c.bench_function("then_chain/1024", |b| {
        b.iter(|| {
            let mut tail = Future::fulfilled(0_u64);
            for _ in 0..1024 {
                tail = tail.then(|x| ready(x + 1));
            }
            black_box(runtime::block_on(&tail))
        })
    });
}

fn bench_fold(c: &mut Criterion) {
    c.bench_function("fold_left/sync/4096", |b| {
        b.iter(|| {
            let out = Collection::new(inputs(4096))
                .fold_left(Resolution::Value(0_u64), |acc, x| ready(acc + x));
            black_box(runtime::block_on(&out))
        })
    });
}

criterion_group!(
    benches,
    bench_sync_map,
    bench_timer_map,
    bench_then_chain,
    bench_fold
);

criterion_main!(benches);
