//! Criterion benchmarks for the incremental aggregator.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use affinity_aggregator::batch::recompute;
use affinity_aggregator::SimilarityAggregator;
use affinity_core::config::ActionWeights;
use affinity_core::models::{ActionType, InteractionEvent};

/// Deterministic pseudo-random stream over `items` x `users`.
fn stream(len: usize, items: i64, users: i64) -> Vec<InteractionEvent> {
    let now = Utc::now();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let item = (seed % items as u64) as i64;
            let user = ((seed >> 20) % users as u64) as i64;
            let action = match seed % 3 {
                0 => ActionType::View,
                1 => ActionType::Register,
                _ => ActionType::Like,
            };
            InteractionEvent::new(item, user, action, now)
        })
        .collect()
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    for len in [1_000usize, 10_000] {
        let events = stream(len, 200, 500);
        group.bench_with_input(BenchmarkId::from_parameter(len), &events, |b, events| {
            b.iter(|| {
                let mut agg = SimilarityAggregator::new(ActionWeights::default());
                let mut emitted = 0usize;
                for e in events {
                    emitted += agg.process(e).len();
                }
                black_box(emitted)
            })
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let events = stream(10_000, 200, 500);
    c.bench_function("batch_recompute_10k", |b| {
        b.iter(|| black_box(recompute(&events, &ActionWeights::default()).len()))
    });
}

criterion_group!(benches, bench_incremental, bench_batch);
criterion_main!(benches);
