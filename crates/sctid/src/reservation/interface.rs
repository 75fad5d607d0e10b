use super::Reservation;
use crate::{encoding::SctId, error::Result};

/// A named collection of [`Reservation`]s.
///
/// Implementations must be safe to share across threads. Snapshots returned
/// by [`Self::reservations`] carry no isolation guarantee against concurrent
/// [`Self::create`] calls.
pub trait ReservationRegistry: Send + Sync {
    /// Registers `reservation` under `name`.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateReservation`](crate::Error::DuplicateReservation)
    /// if `name` is taken.
    fn create(&self, name: &str, reservation: Reservation) -> Result<()>;

    fn get(&self, name: &str) -> Option<Reservation>;

    /// Removes and returns the reservation registered under `name`.
    fn delete(&self, name: &str) -> Option<Reservation>;

    /// A snapshot of every registered reservation with its name.
    fn reservations(&self) -> Vec<(String, Reservation)>;

    /// `true` if any reservation includes `id`.
    fn is_reserved(&self, id: &SctId) -> bool {
        self.reservations()
            .iter()
            .any(|(_, reservation)| reservation.includes(id))
    }
}
