//! Error responses for the HTTP API.
//!
//! [`ApiError`] wraps library errors and request validation failures and
//! converts them into a status code with a JSON body of the form
//! `{"error": "..."}`.
//!
//! ## Status codes
//! - `400`: malformed identifiers, namespaces or categories, oversized
//!   batches.
//! - `404`: the identifier has no record.
//! - `409`: a reservation name is already taken.
//! - `500`: invalid reservations, store failures and internal task errors.
//! - `503`: no identifier could be allocated within the configured attempts.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::telemetry::increment_errors;

pub type Result<T> = core::result::Result<T, ApiError>;

/// Unified error type for the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Allocation, validation or store failure reported by `sctid`.
    #[error(transparent)]
    Sctid(#[from] sctid::Error),

    /// The request was well formed but outside configured limits.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No record exists for the identifier.
    #[error("Identifier '{id}' not found")]
    NotFound { id: String },

    /// A blocking task failed to complete.
    #[error("Internal error: {context}")]
    Internal { context: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Sctid(err) => match err {
                sctid::Error::GenerationFailed { .. } | sctid::Error::Exhausted { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                sctid::Error::InvalidIdentifier { .. }
                | sctid::Error::InvalidNamespace { .. }
                | sctid::Error::InvalidCategory { .. } => StatusCode::BAD_REQUEST,
                sctid::Error::DuplicateReservation { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            increment_errors();
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::debug!(%status, error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
