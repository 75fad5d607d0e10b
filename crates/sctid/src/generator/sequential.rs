use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use parking_lot::{Mutex, RwLock};
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{ItemIdCounter, ItemIdStrategy};
use crate::{
    error::Result,
    namespace::{Category, Namespace},
    reservation::ReservationRegistry,
    store::IdentifierStore,
};

type CounterKey = (Namespace, Category);

/// Cache entry for one key. `init` serialises construction for that key
/// only; readers go straight to `counter` once it is set.
#[derive(Default)]
struct CounterSlot {
    counter: OnceLock<Arc<ItemIdCounter>>,
    init: Mutex<()>,
}

/// Hands out item ids in ascending order per `(namespace, category)` key.
///
/// Each key gets its own [`ItemIdCounter`], built on first use and kept for
/// the lifetime of the strategy. Construction happens at most once per key,
/// even when several threads request a cold key at the same time. The store
/// query behind construction runs under a per-key lock, so a cold key never
/// stalls callers of other keys. Warm keys only take the cache's read lock
/// before running the lock-free counter.
///
/// Counters are never evicted, so reservations created after a key was first
/// used only take effect for a new strategy instance.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use sctid::{Category, ItemIdStrategy, MemoryReservations, MemoryStore, Namespace, SequentialStrategy};
///
/// let strategy = SequentialStrategy::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryReservations::new()),
/// );
///
/// let first = strategy.next_item_id(&Namespace::International, Category::Concept).unwrap();
/// let second = strategy.next_item_id(&Namespace::International, Category::Concept).unwrap();
/// assert_eq!((first, second), (100, 101));
/// ```
pub struct SequentialStrategy<S, R>
where
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
{
    store: Arc<S>,
    reservations: Arc<R>,
    counters: RwLock<HashMap<CounterKey, Arc<CounterSlot>>>,
}

impl<S, R> SequentialStrategy<S, R>
where
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
{
    pub fn new(store: Arc<S>, reservations: Arc<R>) -> Self {
        Self {
            store,
            reservations,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the counter for the key, constructing it on first use.
    ///
    /// # Errors
    /// Propagates construction errors; nothing is cached in that case, so a
    /// later call tries again.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn counter(&self, namespace: &Namespace, category: Category) -> Result<Arc<ItemIdCounter>> {
        let key = (namespace.clone(), category);

        if let Some(counter) = self
            .counters
            .read()
            .get(&key)
            .and_then(|slot| slot.counter.get())
        {
            return Ok(Arc::clone(counter));
        }

        let slot = Arc::clone(self.counters.write().entry(key).or_default());

        let _init = slot.init.lock();
        if let Some(counter) = slot.counter.get() {
            return Ok(Arc::clone(counter));
        }

        let counter = Arc::new(ItemIdCounter::new(
            namespace.clone(),
            category,
            &*self.store,
            &*self.reservations,
        )?);
        let _ = slot.counter.set(Arc::clone(&counter));
        Ok(counter)
    }

    /// Number of keys with a live counter.
    pub fn len(&self) -> usize {
        self.counters
            .read()
            .values()
            .filter(|slot| slot.counter.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        !self
            .counters
            .read()
            .values()
            .any(|slot| slot.counter.get().is_some())
    }
}

impl<S, R> ItemIdStrategy for SequentialStrategy<S, R>
where
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
{
    fn next_item_id(&self, namespace: &Namespace, category: Category) -> Result<u64> {
        self.counter(namespace, category)?.next_item_id()
    }
}
