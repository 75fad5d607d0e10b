use std::collections::{BTreeMap, btree_map::Entry};

use parking_lot::RwLock;

use super::{Reservation, ReservationRegistry};
use crate::{
    encoding::SctId,
    error::{Error, Result},
};

/// An in-process [`ReservationRegistry`] backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryReservations {
    reservations: RwLock<BTreeMap<String, Reservation>>,
}

impl MemoryReservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reservations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.read().is_empty()
    }
}

impl ReservationRegistry for MemoryReservations {
    fn create(&self, name: &str, reservation: Reservation) -> Result<()> {
        match self.reservations.write().entry(name.to_owned()) {
            Entry::Occupied(_) => Err(Error::DuplicateReservation {
                name: name.to_owned(),
            }),
            Entry::Vacant(slot) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(name, range = %reservation, "Reservation created");
                slot.insert(reservation);
                Ok(())
            }
        }
    }

    fn get(&self, name: &str) -> Option<Reservation> {
        self.reservations.read().get(name).cloned()
    }

    fn delete(&self, name: &str) -> Option<Reservation> {
        self.reservations.write().remove(name)
    }

    fn reservations(&self) -> Vec<(String, Reservation)> {
        self.reservations
            .read()
            .iter()
            .map(|(name, reservation)| (name.clone(), reservation.clone()))
            .collect()
    }

    fn is_reserved(&self, id: &SctId) -> bool {
        self.reservations
            .read()
            .values()
            .any(|reservation| reservation.includes(id))
    }
}

impl FromIterator<(String, Reservation)> for MemoryReservations {
    fn from_iter<I: IntoIterator<Item = (String, Reservation)>>(iter: I) -> Self {
        Self {
            reservations: RwLock::new(iter.into_iter().collect()),
        }
    }
}
