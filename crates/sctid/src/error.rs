//! Error types for identifier allocation.
//!
//! A single [`Error`] enum covers every failure the engine can report. The
//! variants fall into three groups:
//!
//! - **Configuration**: [`Error::InvalidReservation`] and
//!   [`Error::DuplicateReservation`]. These indicate bad administrative data
//!   and are never retried.
//! - **Allocation**: [`Error::Exhausted`] is raised by a counter that toured
//!   its whole reachable space, and [`Error::GenerationFailed`] is the uniform
//!   failure surfaced by
//!   [`IdentifierService`](crate::service::IdentifierService) once its bounded
//!   retries are spent.
//! - **Input**: [`Error::InvalidIdentifier`], [`Error::InvalidNamespace`]
//!   and [`Error::InvalidCategory`] for malformed caller input, and
//!   [`Error::Store`] for backing store failures.

use crate::namespace::{Category, Namespace};

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `sctid` can produce.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A reservation affecting a counter's key does not have closed, finite
    /// bounds, or its lower bound exceeds its upper bound.
    #[error("Reservation '{name}' must have a closed lower and upper bound; found: {range}")]
    InvalidReservation { name: String, range: String },

    /// A reservation with the same name is already registered.
    #[error("Reservation '{name}' already exists")]
    DuplicateReservation { name: String },

    /// Every reachable item id for the key lies inside an excluded range.
    #[error("Item identifier space exhausted for {category} in {namespace}")]
    Exhausted {
        namespace: Namespace,
        category: Category,
    },

    /// The identifier service could not produce a fresh identifier within its
    /// configured number of attempts.
    #[error("Couldn't generate identifier in {attempts} number of attempts")]
    GenerationFailed { attempts: usize },

    /// The identifier could not be parsed or failed validation.
    #[error("Invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },

    /// The namespace is not a seven digit extension namespace identifier.
    #[error("Invalid namespace '{namespace}': {reason}")]
    InvalidNamespace {
        namespace: String,
        reason: &'static str,
    },

    /// The text does not name a component category.
    #[error("Unknown category '{category}': expected concept, description or relationship")]
    InvalidCategory { category: String },

    /// The identifier store rejected an operation.
    #[error("Store error: {context}")]
    Store { context: String },
}

impl Error {
    pub(crate) fn invalid_identifier(id: &str, reason: &'static str) -> Self {
        Self::InvalidIdentifier {
            id: id.to_owned(),
            reason,
        }
    }

    /// Returns `true` for errors the identifier service retries locally.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
