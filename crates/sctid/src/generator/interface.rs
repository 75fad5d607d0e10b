use crate::{
    error::Result,
    namespace::{Category, Namespace},
};

/// A policy producing raw item ids for `(namespace, category)` keys.
///
/// Strategies are not required to be collision-free. The
/// [`IdentifierService`](crate::service::IdentifierService) checks every
/// candidate against the store and reservations, and retries a bounded number
/// of times.
///
/// Two implementations ship with the crate:
/// - [`SequentialStrategy`](crate::SequentialStrategy): one lock-free
///   [`ItemIdCounter`](crate::ItemIdCounter) per key, seeded from the store.
/// - [`CyclingStrategy`](crate::CyclingStrategy): replays a fixed list.
pub trait ItemIdStrategy: Send + Sync {
    /// Returns the next candidate item id for the key.
    ///
    /// # Errors
    /// - [`Error::Exhausted`](crate::Error::Exhausted) if no candidate is
    ///   available right now; the caller may retry.
    /// - [`Error::InvalidReservation`](crate::Error::InvalidReservation) if the
    ///   key's reservations are misconfigured.
    fn next_item_id(&self, namespace: &Namespace, category: Category) -> Result<u64>;
}
