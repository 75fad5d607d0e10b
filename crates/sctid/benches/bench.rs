use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use sctid::{
    Category, IdentifierConfig, IdentifierService, ItemIdCounter, ItemIdRange, ItemIdStrategy,
    MemoryReservations, MemoryStore, Namespace, RangeSet, SctId, SequentialStrategy,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

fn counter(excluded: RangeSet) -> ItemIdCounter {
    ItemIdCounter::from_parts(
        Namespace::International,
        Category::Concept,
        Namespace::International.allowed_range(),
        excluded,
        99,
    )
}

/// A reserved block every 64 item ids across the first `TOTAL_IDS * 2`.
fn fragmented() -> RangeSet {
    (0..(TOTAL_IDS as u64 * 2) / 64)
        .map(|block| {
            let lower = 100 + block * 64;
            ItemIdRange::new(lower + 32, lower + 47)
        })
        .collect()
}

fn thread_counts() -> Vec<usize> {
    let cpus = num_cpus::get();
    [1, 2, 4, 8, 16]
        .into_iter()
        .filter(|&threads| threads <= cpus.max(2) * 2)
        .collect()
}

/// Benchmarks a single thread advancing a fresh counter.
fn bench_counter(c: &mut Criterion, group_name: &str, counter_factory: impl Fn() -> ItemIdCounter) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let counter = counter_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(counter.next_item_id().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks one counter shared across threads, so every call races on the
/// same cursor.
fn bench_counter_contended(
    c: &mut Criterion,
    group_name: &str,
    counter_factory: impl Fn() -> ItemIdCounter,
) {
    let mut group = c.benchmark_group(group_name);

    for thread_count in thread_counts() {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{}/threads/{}", TOTAL_IDS, thread_count),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let counter = Arc::new(counter_factory());
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let counter = Arc::clone(&counter);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(counter.next_item_id().unwrap());
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

/// Benchmarks the full allocation path: strategy, reservation check and store
/// insert.
fn bench_service(c: &mut Criterion, group_name: &str) {
    let mut group = c.benchmark_group(group_name);

    for thread_count in thread_counts() {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(
            format!("elems/{}/threads/{}", TOTAL_IDS, thread_count),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let service = Arc::new(IdentifierService::sequential(
                            Arc::new(MemoryStore::new()),
                            Arc::new(MemoryReservations::new()),
                            IdentifierConfig::default(),
                        ));
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let service = Arc::clone(&service);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(
                                            service
                                                .generate(
                                                    &Namespace::International,
                                                    Category::Concept,
                                                )
                                                .unwrap(),
                                        );
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_counter_sequential(c: &mut Criterion) {
    bench_counter(c, "counter/sequential", || counter(RangeSet::new()));
}

fn benchmark_counter_sequential_fragmented(c: &mut Criterion) {
    bench_counter(c, "counter/sequential/fragmented", || counter(fragmented()));
}

fn benchmark_counter_contended(c: &mut Criterion) {
    bench_counter_contended(c, "counter/contended", || counter(RangeSet::new()));
}

fn benchmark_counter_contended_fragmented(c: &mut Criterion) {
    bench_counter_contended(c, "counter/contended/fragmented", || counter(fragmented()));
}

fn benchmark_strategy_warm_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy/sequential");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let strategy = SequentialStrategy::new(
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryReservations::new()),
                );
                for _ in 0..TOTAL_IDS {
                    black_box(
                        strategy
                            .next_item_id(&Namespace::International, Category::Concept)
                            .unwrap(),
                    );
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

fn benchmark_service_contended(c: &mut Criterion) {
    bench_service(c, "service/generate");
}

fn benchmark_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    let extension = Namespace::extension("1000129").unwrap();
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("format/elems/{}", TOTAL_IDS), |b| {
        b.iter(|| {
            for item_id in 1..=TOTAL_IDS as u64 {
                black_box(SctId::new(extension.clone(), Category::Concept, item_id).to_string());
            }
        });
    });

    let ids: Vec<String> = (1..=TOTAL_IDS as u64)
        .map(|item_id| SctId::new(extension.clone(), Category::Concept, item_id).to_string())
        .collect();
    group.bench_function(format!("parse/elems/{}", TOTAL_IDS), |b| {
        b.iter(|| {
            for id in &ids {
                black_box(id.parse::<SctId>().unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    // Lock-free cursor
    benchmark_counter_sequential,
    benchmark_counter_sequential_fragmented,
    benchmark_counter_contended, // CAS retries under contention
    benchmark_counter_contended_fragmented,
    // Per-key cache
    benchmark_strategy_warm_key,
    // Full allocation path
    benchmark_service_contended,
    // Check digit
    benchmark_encoding,
);
criterion_main!(benches);
