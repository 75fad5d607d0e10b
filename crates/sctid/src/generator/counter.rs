use core::fmt;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    namespace::{Category, Namespace},
    range::{ItemIdRange, RangeSet},
    reservation::ReservationRegistry,
    store::IdentifierStore,
};

/// A lock-free item id cursor for one `(namespace, category)` key.
///
/// The counter stores the last handed out item id in an [`AtomicU64`] and
/// advances it with a compare-and-swap loop, so it can be shared across
/// threads without locking. Every value it returns lies inside the
/// namespace's allowed range and outside the key's excluded ranges, and
/// concurrent callers never receive the same value.
///
/// ## Wraparound and exhaustion
/// Past the top of the allowed range the cursor wraps to the lower bound.
/// Reserved blocks are stepped over as a whole. If the walk reaches an
/// excluded block it already stepped over during the same attempt, the whole
/// reachable space has been toured and [`Error::Exhausted`] is returned
/// without moving the cursor.
///
/// ## Staleness
/// The cursor is seeded once from the store. Identifiers registered later do
/// not move it; only a freshly constructed counter observes them.
pub struct ItemIdCounter {
    namespace: Namespace,
    category: Category,
    allowed: ItemIdRange,
    excluded: RangeSet,
    #[cfg(feature = "cache-padded")]
    cursor: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    cursor: AtomicU64,
}

impl ItemIdCounter {
    /// Builds the counter for `(namespace, category)`.
    ///
    /// Every reservation affecting the key is resolved into the excluded
    /// range set, then the cursor is seeded from the highest sequence in
    /// `store`, or from one below the allowed range when the key has no
    /// records.
    ///
    /// # Errors
    /// - [`Error::InvalidReservation`] if an affecting reservation is not a
    ///   closed, finite, non-empty range.
    /// - Any error reported by the store lookup.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(%namespace, %category))
    )]
    pub fn new<S, R>(
        namespace: Namespace,
        category: Category,
        store: &S,
        reservations: &R,
    ) -> Result<Self>
    where
        S: IdentifierStore + ?Sized,
        R: ReservationRegistry + ?Sized,
    {
        let allowed = namespace.allowed_range();

        let excluded = reservations
            .reservations()
            .iter()
            .filter(|(_, reservation)| reservation.affects(&namespace, category))
            .map(|(name, reservation)| reservation.item_id_range(name))
            .collect::<Result<RangeSet>>()?;

        let current = store
            .last_sequence(&namespace, category)?
            .unwrap_or_else(|| allowed.lower().saturating_sub(1));

        #[cfg(feature = "tracing")]
        tracing::debug!(current, excluded = %excluded, "Item id counter initialized");

        Ok(Self::from_parts(namespace, category, allowed, excluded, current))
    }

    /// Creates a counter from explicit state, bypassing store and reservation
    /// lookups.
    ///
    /// The first call to [`Self::next_item_id`] considers `current + 1`.
    pub fn from_parts(
        namespace: Namespace,
        category: Category,
        allowed: ItemIdRange,
        excluded: RangeSet,
        current: u64,
    ) -> Self {
        Self {
            namespace,
            category,
            allowed,
            excluded,
            #[cfg(feature = "cache-padded")]
            cursor: crossbeam_utils::CachePadded::new(AtomicU64::new(current)),
            #[cfg(not(feature = "cache-padded"))]
            cursor: AtomicU64::new(current),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn allowed_range(&self) -> ItemIdRange {
        self.allowed
    }

    pub fn excluded_ranges(&self) -> &RangeSet {
        &self.excluded
    }

    /// The last item id handed out, or the seed if none was.
    pub fn current(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Advances the cursor and returns the new item id.
    ///
    /// # Errors
    /// Returns [`Error::Exhausted`] if no value other than the current one is
    /// free. The cursor is left untouched in that case.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_item_id(&self) -> Result<u64> {
        let mut current = self.cursor.load(Ordering::Relaxed);
        loop {
            let next = self.successor(current)?;
            match self.cursor.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(next),
                // Another thread won the race; retry from its value.
                Err(actual) => current = actual,
            }
        }
    }

    /// The first free value after `current`, walking the allowed range
    /// cyclically.
    fn successor(&self, current: u64) -> Result<u64> {
        let mut next = self.allowed.snap_to_lower(current.saturating_add(1));
        let mut first_visited: Option<usize> = None;

        while let Some((index, range)) = self.excluded.find(next) {
            match first_visited {
                None => first_visited = Some(index),
                Some(first) if first == index => return Err(self.exhausted()),
                Some(_) => {}
            }

            next = self.allowed.snap_to_lower(range.upper().saturating_add(1));

            // Skip `current` so the walk ends on the first block again.
            if next == current {
                next = self.allowed.snap_to_lower(next.saturating_add(1));
            }
        }

        // Single-value allowed range with nothing excluded.
        if next == current {
            return Err(self.exhausted());
        }

        Ok(next)
    }

    fn exhausted(&self) -> Error {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            namespace = %self.namespace,
            category = %self.category,
            excluded = %self.excluded,
            "Item id space exhausted"
        );

        Error::Exhausted {
            namespace: self.namespace.clone(),
            category: self.category,
        }
    }
}

impl fmt::Debug for ItemIdCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemIdCounter")
            .field("namespace", &self.namespace)
            .field("category", &self.category)
            .field("allowed", &self.allowed)
            .field("excluded", &self.excluded)
            .field("current", &self.current())
            .finish()
    }
}
