//! The public entry point for identifier allocation.
//!
//! [`IdentifierService`] ties a generation strategy to the identifier store,
//! the reservation registry and an encoder. Every candidate produced by the
//! strategy is checked before it is handed out:
//!
//! - it must lie inside the namespace's allowed range,
//! - no reservation may include it,
//! - the store must accept it as a new record.
//!
//! A candidate failing any check, or an exhausted counter, costs one attempt.
//! Once [`IdentifierConfig::max_generation_attempts`] attempts are spent the
//! service reports [`Error::GenerationFailed`], regardless of which check
//! failed last.
//!
//! ## Consistency
//! Advancing a counter and persisting the record are separate steps. A crash
//! between them loses the item id (it is skipped after restart, never issued
//! twice). Two processes allocating against the same store are not
//! coordinated.

use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::IdentifierConfig;
use crate::{
    encoding::{IdentifierEncoder, SctId, SnomedEncoder},
    error::{Error, Result},
    generator::{ItemIdStrategy, SequentialStrategy},
    namespace::{Category, Namespace},
    reservation::ReservationRegistry,
    store::{IdentifierStore, SctIdRecord},
};

/// An [`IdentifierService`] backed by a [`SequentialStrategy`] over the same
/// store and reservations.
pub type SequentialIdentifierService<S, R> = IdentifierService<SequentialStrategy<S, R>, S, R>;

/// Allocates, registers and releases SNOMED CT identifiers.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use sctid::{
///     Category, IdentifierConfig, IdentifierService, MemoryReservations, MemoryStore, Namespace,
/// };
///
/// let service = IdentifierService::sequential(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryReservations::new()),
///     IdentifierConfig::default(),
/// );
///
/// let ids = service
///     .generate_many(&Namespace::International, Category::Concept, 3)
///     .unwrap();
/// assert_eq!(ids, ["100005", "101009", "102002"]);
///
/// // Externally minted identifiers are recorded once.
/// assert!(service.register("999999999999998003").unwrap());
/// assert!(!service.register("999999999999998003").unwrap());
/// ```
pub struct IdentifierService<G, S, R, E = SnomedEncoder>
where
    G: ItemIdStrategy,
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
    E: IdentifierEncoder,
{
    strategy: G,
    store: Arc<S>,
    reservations: Arc<R>,
    encoder: E,
    config: IdentifierConfig,
}

impl<S, R> IdentifierService<SequentialStrategy<S, R>, S, R>
where
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
{
    /// Creates a service allocating sequentially from counters seeded by
    /// `store`.
    pub fn sequential(store: Arc<S>, reservations: Arc<R>, config: IdentifierConfig) -> Self {
        let strategy = SequentialStrategy::new(Arc::clone(&store), Arc::clone(&reservations));
        Self::new(strategy, store, reservations, config)
    }
}

impl<G, S, R> IdentifierService<G, S, R>
where
    G: ItemIdStrategy,
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
{
    pub fn new(strategy: G, store: Arc<S>, reservations: Arc<R>, config: IdentifierConfig) -> Self {
        Self::with_encoder(strategy, store, reservations, SnomedEncoder, config)
    }
}

impl<G, S, R, E> IdentifierService<G, S, R, E>
where
    G: ItemIdStrategy,
    S: IdentifierStore + ?Sized,
    R: ReservationRegistry + ?Sized,
    E: IdentifierEncoder,
{
    pub fn with_encoder(
        strategy: G,
        store: Arc<S>,
        reservations: Arc<R>,
        encoder: E,
        config: IdentifierConfig,
    ) -> Self {
        Self {
            strategy,
            store,
            reservations,
            encoder,
            config,
        }
    }

    pub fn config(&self) -> &IdentifierConfig {
        &self.config
    }

    pub fn strategy(&self) -> &G {
        &self.strategy
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn reservations(&self) -> &Arc<R> {
        &self.reservations
    }

    /// Allocates and persists one new identifier.
    ///
    /// # Errors
    /// - [`Error::GenerationFailed`] once the configured number of attempts
    ///   is used up by collisions, reserved or out of range candidates, or an
    ///   exhausted counter.
    /// - [`Error::InvalidReservation`] and store errors are returned
    ///   immediately.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), fields(%namespace, %category)))]
    pub fn generate(&self, namespace: &Namespace, category: Category) -> Result<String> {
        let attempts = self.config.max_generation_attempts.max(1);
        let allowed = namespace.allowed_range();

        for _attempt in 1..=attempts {
            let item_id = match self.strategy.next_item_id(namespace, category) {
                Ok(item_id) => item_id,
                Err(e) if e.is_retryable() => continue,
                Err(e) => return Err(e),
            };

            if !allowed.contains(item_id) {
                #[cfg(feature = "tracing")]
                tracing::trace!(_attempt, item_id, "Candidate outside allowed range");
                continue;
            }

            let id = SctId::new(namespace.clone(), category, item_id);
            if self.reservations.is_reserved(&id) {
                #[cfg(feature = "tracing")]
                tracing::trace!(_attempt, item_id, "Candidate is reserved");
                continue;
            }

            let sctid = self.encoder.encode(&id);
            if self.store.insert(SctIdRecord::new(&id, sctid.as_str()))? {
                #[cfg(feature = "tracing")]
                tracing::debug!(%sctid, "Identifier generated");
                return Ok(sctid);
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(_attempt, %sctid, "Candidate already exists");
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(attempts, "Identifier generation gave up");

        Err(Error::GenerationFailed { attempts })
    }

    /// Allocates `quantity` identifiers in order.
    ///
    /// The batch is not atomic. If the k-th allocation fails, the k-1
    /// identifiers already persisted stay consumed and only the error is
    /// returned.
    pub fn generate_many(
        &self,
        namespace: &Namespace,
        category: Category,
        quantity: usize,
    ) -> Result<Vec<String>> {
        (0..quantity)
            .map(|_| self.generate(namespace, category))
            .collect()
    }

    /// Records an identifier minted outside this service.
    ///
    /// Returns `true` if a record was inserted and `false` if the identifier
    /// was already known; a repeated registration changes nothing.
    ///
    /// Counters already in use do not observe the registration. It seeds
    /// counters built afterwards, e.g. after a restart.
    ///
    /// # Errors
    /// [`Error::InvalidIdentifier`] for malformed input, or a store error.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn register(&self, sctid: &str) -> Result<bool> {
        let id = self.encoder.decode(sctid)?;
        let inserted = self.store.insert(SctIdRecord::new(&id, sctid))?;

        #[cfg(feature = "tracing")]
        if inserted {
            tracing::debug!(sequence = id.item_id(), "Identifier registered");
        } else {
            tracing::debug!("Identifier already registered");
        }

        Ok(inserted)
    }

    /// The persisted record for `sctid`, if any.
    pub fn get(&self, sctid: &str) -> Result<Option<SctIdRecord>> {
        self.encoder.decode(sctid)?;
        self.store.get(sctid)
    }

    /// Deletes the record for `sctid`, returning whether it existed.
    ///
    /// A released identifier may be handed out again by strategies that
    /// revisit old values, or by a sequential counter after wraparound.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn release(&self, sctid: &str) -> Result<bool> {
        self.encoder.decode(sctid)?;
        Ok(self.store.remove(sctid)?.is_some())
    }
}
