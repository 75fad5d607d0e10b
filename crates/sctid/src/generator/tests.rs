use std::{
    collections::HashSet,
    sync::{
        Arc, Barrier,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc,
    },
    thread::scope,
    time::Duration,
};

use proptest::prelude::*;

use crate::{
    Category, CyclingStrategy, Error, IdentifierStore, ItemIdCounter, ItemIdRange, ItemIdStrategy,
    MemoryReservations, MemoryStore, Namespace, RangeSet, RecordQuery, Reservation,
    ReservationRegistry, Result, SctId, SctIdRecord, SequentialStrategy,
};

const INT: Namespace = Namespace::International;

fn ext() -> Namespace {
    Namespace::extension("1000129").unwrap()
}

fn ranges(ranges: &[(u64, u64)]) -> RangeSet {
    ranges
        .iter()
        .map(|&(lower, upper)| ItemIdRange::new(lower, upper))
        .collect()
}

fn counter(allowed: (u64, u64), excluded: &[(u64, u64)], current: u64) -> ItemIdCounter {
    ItemIdCounter::from_parts(
        INT,
        Category::Concept,
        ItemIdRange::new(allowed.0, allowed.1),
        ranges(excluded),
        current,
    )
}

fn drain(counter: &ItemIdCounter, n: usize) -> Vec<u64> {
    (0..n).map(|_| counter.next_item_id().unwrap()).collect()
}

fn record(namespace: Namespace, category: Category, item_id: u64) -> SctIdRecord {
    let id = SctId::new(namespace, category, item_id);
    SctIdRecord::new(&id, id.to_string())
}

fn run_counter_unique_threaded(counter: ItemIdCounter) -> HashSet<u64> {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 1024;

    let seen: Vec<Vec<u64>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| s.spawn(|| drain(&counter, IDS_PER_THREAD)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<u64> = seen.into_iter().flatten().collect();
    assert_eq!(unique.len(), THREADS * IDS_PER_THREAD, "Expected unique item ids");
    unique
}

#[test]
fn counter_seeds_below_the_allowed_range() {
    let counter = ItemIdCounter::new(
        INT,
        Category::Concept,
        &MemoryStore::new(),
        &MemoryReservations::new(),
    )
    .unwrap();

    assert_eq!(counter.current(), 99);
    assert_eq!(drain(&counter, 3), [100, 101, 102]);
    assert_eq!(counter.current(), 102);

    let counter = ItemIdCounter::new(
        ext(),
        Category::Concept,
        &MemoryStore::new(),
        &MemoryReservations::new(),
    )
    .unwrap();
    assert_eq!(counter.current(), 0);
    assert_eq!(counter.next_item_id(), Ok(1));
}

#[test]
fn counter_seeds_from_the_highest_stored_sequence() {
    let store = MemoryStore::new();
    for record in [
        record(INT, Category::Concept, 150),
        record(INT, Category::Concept, 120),
        record(INT, Category::Description, 900),
        record(ext(), Category::Concept, 5000),
    ] {
        assert!(store.insert(record).unwrap());
    }

    let counter =
        ItemIdCounter::new(INT, Category::Concept, &store, &MemoryReservations::new()).unwrap();
    assert_eq!(counter.current(), 150);
    assert_eq!(counter.next_item_id(), Ok(151));
}

#[test]
fn counter_resolves_only_affecting_reservations() {
    let reservations: MemoryReservations = [
        ("concepts", Reservation::range(100, 199, None, [Category::Concept])),
        ("descriptions", Reservation::range(300, 399, None, [Category::Description])),
        (
            "extension",
            Reservation::range(1, 10, Some(ext()), [Category::Concept]),
        ),
        (
            "international",
            Reservation::range(500, 599, Some(INT), [Category::Concept, Category::Relationship]),
        ),
    ]
    .into_iter()
    .map(|(name, reservation)| (name.to_owned(), reservation))
    .collect();

    let counter =
        ItemIdCounter::new(INT, Category::Concept, &MemoryStore::new(), &reservations).unwrap();
    assert_eq!(counter.excluded_ranges(), &ranges(&[(100, 199), (500, 599)]));
    assert_eq!(counter.next_item_id(), Ok(200));

    let counter =
        ItemIdCounter::new(ext(), Category::Concept, &MemoryStore::new(), &reservations).unwrap();
    // Reservations without a namespace filter apply to extensions too.
    assert_eq!(counter.excluded_ranges(), &ranges(&[(1, 10), (100, 199)]));
    assert_eq!(counter.next_item_id(), Ok(11));
}

#[test]
fn counter_rejects_open_reservations_for_its_key_only() {
    let reservations = MemoryReservations::new();
    reservations
        .create(
            "open",
            Reservation::from_bounds(..=500, None, [Category::Description]),
        )
        .unwrap();

    let result = ItemIdCounter::new(
        INT,
        Category::Description,
        &MemoryStore::new(),
        &reservations,
    );
    assert!(matches!(result, Err(Error::InvalidReservation { .. })));

    let counter =
        ItemIdCounter::new(INT, Category::Concept, &MemoryStore::new(), &reservations).unwrap();
    assert_eq!(counter.next_item_id(), Ok(100));
}

#[test]
fn counter_steps_over_excluded_blocks_and_wraps() {
    let counter = counter((1, 10), &[(3, 4), (7, 7)], 0);
    assert_eq!(drain(&counter, 9), [1, 2, 5, 6, 8, 9, 10, 1, 2]);
}

#[test]
fn counter_wraps_when_the_top_is_excluded() {
    let counter = counter((1, 10), &[(9, 10)], 8);
    assert_eq!(counter.next_item_id(), Ok(1));
}

#[test]
fn counter_ignores_excluded_ranges_outside_the_allowed_range() {
    let counter = counter((100, 110), &[(1, 50), (95, 102), (200, 300)], 99);
    assert_eq!(drain(&counter, 3), [103, 104, 105]);
}

#[test]
fn counter_exhaustion_leaves_the_cursor_in_place() {
    let counter = counter((1, 10), &[(1, 4), (6, 10)], 0);

    assert_eq!(counter.next_item_id(), Ok(5));
    for _ in 0..3 {
        assert_eq!(
            counter.next_item_id(),
            Err(Error::Exhausted {
                namespace: INT,
                category: Category::Concept
            })
        );
        assert_eq!(counter.current(), 5);
    }
}

#[test]
fn counter_fully_excluded_range_is_exhausted() {
    let counter = counter((1, 10), &[(1, 10)], 0);
    assert!(matches!(counter.next_item_id(), Err(Error::Exhausted { .. })));
    assert_eq!(counter.current(), 0);
}

#[test]
fn counter_single_value_range_is_handed_out_once() {
    let counter = counter((7, 7), &[], 6);
    assert_eq!(counter.next_item_id(), Ok(7));
    assert!(matches!(counter.next_item_id(), Err(Error::Exhausted { .. })));
    assert_eq!(counter.current(), 7);
}

#[test]
fn counter_seeded_inside_an_excluded_block() {
    // A registered identifier may sit inside a reservation.
    let counter = counter((100, 300), &[(100, 198), (200, 300)], 198);
    assert_eq!(counter.next_item_id(), Ok(199));
    assert!(matches!(counter.next_item_id(), Err(Error::Exhausted { .. })));
}

#[test]
fn counter_threaded_unique() {
    let unique = run_counter_unique_threaded(counter((100, 999_999), &[], 99));
    assert_eq!(unique.iter().min(), Some(&100));
    assert_eq!(unique.iter().max(), Some(&(99 + 8 * 1024)));
}

#[test]
fn counter_threaded_unique_with_exclusions() {
    let unique = run_counter_unique_threaded(counter((100, 999_999), &[(200, 299), (1000, 4999)], 99));
    assert!(unique.iter().all(|&id| !(200..=299).contains(&id)));
    assert!(unique.iter().all(|&id| !(1000..=4999).contains(&id)));
}

#[test]
fn counter_threaded_unique_across_wraparound() {
    // Uniqueness holds for fewer draws than free values; the seed is near the
    // top so the threads wrap together.
    const THREADS: usize = 4;
    let counter = counter((1, 64), &[(10, 19)], 40);
    let free = 64 - 10;
    let barrier = Barrier::new(THREADS);

    let seen: Vec<Vec<u64>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    drain(&counter, free / THREADS)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<u64> = seen.into_iter().flatten().collect();
    assert_eq!(unique.len(), free / THREADS * THREADS);
    assert!(unique.iter().all(|&id| !(10..=19).contains(&id)));
}

#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    searches: AtomicUsize,
}

impl IdentifierStore for CountingStore {
    fn insert(&self, record: SctIdRecord) -> Result<bool> {
        self.inner.insert(record)
    }

    fn get(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        self.inner.get(sctid)
    }

    fn remove(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        self.inner.remove(sctid)
    }

    fn search(&self, query: &RecordQuery, offset: usize, limit: usize) -> Result<Vec<SctIdRecord>> {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.inner.search(query, offset, limit)
    }
}

#[test]
fn sequential_constructs_each_counter_once() {
    const THREADS: usize = 8;

    let store = Arc::new(CountingStore::default());
    let strategy = SequentialStrategy::new(Arc::clone(&store), Arc::new(MemoryReservations::new()));

    let barrier = Barrier::new(THREADS);

    let ids: Vec<u64> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    strategy.next_item_id(&INT, Category::Concept).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<u64> = ids.into_iter().collect();
    assert_eq!(unique, (100..100 + THREADS as u64).collect::<HashSet<u64>>());
    assert_eq!(store.searches.load(Ordering::Relaxed), 1);
    assert_eq!(strategy.len(), 1);
}

/// Parks every search issued while armed until the test releases it.
struct GatedStore {
    inner: MemoryStore,
    armed: AtomicBool,
    entered: Barrier,
    release: Barrier,
}

impl GatedStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl IdentifierStore for GatedStore {
    fn insert(&self, record: SctIdRecord) -> Result<bool> {
        self.inner.insert(record)
    }

    fn get(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        self.inner.get(sctid)
    }

    fn remove(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        self.inner.remove(sctid)
    }

    fn search(&self, query: &RecordQuery, offset: usize, limit: usize) -> Result<Vec<SctIdRecord>> {
        if self.armed.load(Ordering::Acquire) {
            self.entered.wait();
            self.release.wait();
        }
        self.inner.search(query, offset, limit)
    }
}

#[test]
fn cold_key_construction_does_not_block_warm_keys() {
    let store = Arc::new(GatedStore::new());
    let strategy = SequentialStrategy::new(Arc::clone(&store), Arc::new(MemoryReservations::new()));

    assert_eq!(strategy.next_item_id(&INT, Category::Concept), Ok(100));
    store.armed.store(true, Ordering::Release);

    let strategy = &strategy;
    scope(|s| {
        let cold = s.spawn(|| strategy.next_item_id(&INT, Category::Description));
        store.entered.wait();

        let (tx, rx) = mpsc::channel();
        s.spawn(move || tx.send(strategy.next_item_id(&INT, Category::Concept)));
        let warm = rx.recv_timeout(Duration::from_secs(5));

        store.release.wait();
        assert_eq!(warm, Ok(Ok(101)));
        assert_eq!(cold.join().unwrap(), Ok(100));
    });

    assert_eq!(strategy.len(), 2);
}

#[test]
fn sequential_keeps_one_counter_per_key() {
    let strategy = SequentialStrategy::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryReservations::new()),
    );

    assert_eq!(strategy.next_item_id(&INT, Category::Concept), Ok(100));
    assert_eq!(strategy.next_item_id(&INT, Category::Description), Ok(100));
    assert_eq!(strategy.next_item_id(&ext(), Category::Concept), Ok(1));
    assert_eq!(strategy.next_item_id(&INT, Category::Concept), Ok(101));
    assert_eq!(strategy.len(), 3);

    let counter = strategy.counter(&INT, Category::Concept).unwrap();
    assert_eq!(counter.current(), 101);
    assert_eq!(counter.category(), Category::Concept);
}

#[test]
fn sequential_does_not_cache_failed_construction() {
    let reservations = Arc::new(MemoryReservations::new());
    reservations
        .create("open", Reservation::from_bounds(200.., None, [Category::Concept]))
        .unwrap();
    let strategy = SequentialStrategy::new(Arc::new(MemoryStore::new()), Arc::clone(&reservations));

    assert!(matches!(
        strategy.next_item_id(&INT, Category::Concept),
        Err(Error::InvalidReservation { .. })
    ));
    assert!(strategy.is_empty());

    reservations.delete("open");
    assert_eq!(strategy.next_item_id(&INT, Category::Concept), Ok(100));
}

#[test]
fn sequential_ignores_reservations_created_after_first_use() {
    let reservations = Arc::new(MemoryReservations::new());
    let strategy = SequentialStrategy::new(Arc::new(MemoryStore::new()), Arc::clone(&reservations));

    assert_eq!(strategy.next_item_id(&INT, Category::Concept), Ok(100));
    reservations
        .create("late", Reservation::range(101, 200, None, [Category::Concept]))
        .unwrap();
    assert_eq!(strategy.next_item_id(&INT, Category::Concept), Ok(101));
}

#[test]
fn cycling_replays_in_order() {
    let strategy = CyclingStrategy::new([1000, 1001]);
    let ids: Vec<u64> = (0..5)
        .map(|_| strategy.next_item_id(&INT, Category::Concept).unwrap())
        .collect();
    assert_eq!(ids, [1000, 1001, 1000, 1001, 1000]);

    // The key is ignored.
    assert_eq!(strategy.next_item_id(&ext(), Category::Relationship), Ok(1001));
}

#[test]
fn cycling_empty_is_exhausted() {
    let strategy = CyclingStrategy::new([]);
    assert_eq!(
        strategy.next_item_id(&ext(), Category::Description),
        Err(Error::Exhausted {
            namespace: ext(),
            category: Category::Description
        })
    );
}

/// The first free value cyclically after `current`, never `current` itself.
fn model_next(allowed: ItemIdRange, excluded: &RangeSet, current: u64) -> Option<u64> {
    let (lower, upper) = (allowed.lower(), allowed.upper());
    let candidates: Vec<u64> = if allowed.contains(current) {
        (current + 1..=upper).chain(lower..current).collect()
    } else {
        (lower..=upper).collect()
    };
    candidates.into_iter().find(|&value| !excluded.contains(value))
}

fn counter_case() -> impl Strategy<Value = (ItemIdRange, Vec<(u64, u64)>, u64)> {
    (0_u64..20, 0_u64..30).prop_flat_map(|(lower, width)| {
        let upper = lower + width;
        (
            Just(ItemIdRange::new(lower, upper)),
            prop::collection::vec((lower.saturating_sub(3)..=upper + 3, 0_u64..8), 0..5),
            lower.saturating_sub(1)..=upper,
        )
    })
}

proptest! {
    #[test]
    fn counter_matches_free_value_model((allowed, blocks, seed) in counter_case()) {
        let excluded: RangeSet = blocks
            .iter()
            .map(|&(start, len)| ItemIdRange::new(start, start + len))
            .collect();
        let counter = ItemIdCounter::from_parts(
            INT,
            Category::Concept,
            allowed,
            excluded.clone(),
            seed,
        );

        let mut current = seed;
        for _ in 0..allowed.len() + 2 {
            match (counter.next_item_id(), model_next(allowed, &excluded, current)) {
                (Ok(next), Some(expected)) => {
                    prop_assert_eq!(next, expected);
                    prop_assert_eq!(counter.current(), next);
                    current = next;
                }
                (Err(Error::Exhausted { .. }), None) => {
                    prop_assert_eq!(counter.current(), current);
                }
                (actual, expected) => {
                    prop_assert!(false, "counter returned {:?}, model expected {:?}", actual, expected);
                }
            }
        }
    }
}
