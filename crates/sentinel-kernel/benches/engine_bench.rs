//! Token-bucket engine benchmarks
//!
//! Measures the admission hot path for a single hot identifier, a spread of
//! identifiers, and the cost of a full stale sweep.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sentinel_kernel::limiter::{CleanupPolicy, RatePolicy, TokenBucketEngine};
use std::time::{Duration, Instant};

fn bench_single_identifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_single_identifier");
    let engine = TokenBucketEngine::new();

    group.bench_function("allow_request", |b| {
        b.iter(|| {
            let _ = black_box(engine.allow_request(black_box("ip:10.0.0.1"), 1e9, 1e9, 1));
        });
    });

    let policy = RatePolicy::new(1e9, 1e9).unwrap();
    group.bench_function("check_with_policy", |b| {
        b.iter(|| {
            let _ = black_box(engine.check(black_box("ip:10.0.0.1"), &policy, 1));
        });
    });

    group.finish();
}

fn bench_many_identifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_many_identifiers");

    for count in [100usize, 10_000] {
        let keys: Vec<String> = (0..count).map(|i| format!("ip:10.0.{}.{}", i / 256, i % 256)).collect();
        let engine = TokenBucketEngine::new();
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            let mut i = 0usize;
            b.iter(|| {
                let key = &keys[i % keys.len()];
                i += 1;
                let _ = black_box(engine.allow_request(key, 100.0, 10.0, 1));
            });
        });
    }

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_sweep");

    group.bench_function("sweep_10k_all_fresh", |b| {
        let engine = TokenBucketEngine::with_cleanup(CleanupPolicy::new(
            Duration::from_secs(300),
            u64::MAX,
        ));
        let now = Instant::now();
        for i in 0..10_000 {
            let _ = engine.allow_request_at(&format!("k{i}"), 10.0, 1.0, 1, now);
        }
        b.iter(|| black_box(engine.sweep_stale_at(now)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_identifier,
    bench_many_identifiers,
    bench_sweep,
);
criterion_main!(benches);
