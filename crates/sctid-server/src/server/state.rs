use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use anyhow::Context;
use sctid::{
    IdentifierConfig, IdentifierService, MemoryReservations, MemoryStore, Reservation,
    ReservationRegistry, SequentialIdentifierService,
};

use super::config::ServerConfig;

/// The identifier service used by every handler.
pub type Service = SequentialIdentifierService<MemoryStore, MemoryReservations>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
    pub max_batch_size: usize,
}

impl AppState {
    pub fn new(service: Service, max_batch_size: usize) -> Self {
        Self {
            service: Arc::new(service),
            max_batch_size,
        }
    }

    /// Builds the service from the configured reservation and seed files.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let reservations = match &config.reservations_file {
            Some(path) => load_reservations(path)?,
            None => MemoryReservations::new(),
        };

        let service = IdentifierService::sequential(
            Arc::new(MemoryStore::new()),
            Arc::new(reservations),
            IdentifierConfig::default().with_max_generation_attempts(config.max_generation_attempts),
        );

        if let Some(path) = &config.seed_file {
            let seeded = seed(&service, path)?;
            tracing::info!(seeded, path = %path.display(), "Registered seed identifiers");
        }

        Ok(Self::new(service, config.max_batch_size))
    }
}

/// Reads a JSON object mapping reservation names to reservations.
///
/// Reservations without closed bounds are accepted with a warning; allocation
/// for the keys they affect fails until they are fixed.
pub fn load_reservations(path: &Path) -> anyhow::Result<MemoryReservations> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read reservations from {}", path.display()))?;
    let parsed: BTreeMap<String, Reservation> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse reservations in {}", path.display()))?;

    let reservations = MemoryReservations::new();
    for (name, reservation) in parsed {
        if let Err(err) = reservation.item_id_range(&name) {
            tracing::warn!(%err, "Reservation will block allocation for the keys it affects");
        }
        reservations.create(&name, reservation)?;
    }

    tracing::info!(count = reservations.len(), "Loaded reservations");
    Ok(reservations)
}

/// Registers every identifier listed in the JSON array at `path`, returning
/// how many were new.
pub fn seed(service: &Service, path: &Path) -> anyhow::Result<usize> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed identifiers from {}", path.display()))?;
    let ids: Vec<String> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse seed identifiers in {}", path.display()))?;

    let mut registered = 0;
    for id in &ids {
        if service
            .register(id)
            .with_context(|| format!("invalid seed identifier {id}"))?
        {
            registered += 1;
        }
    }
    Ok(registered)
}
