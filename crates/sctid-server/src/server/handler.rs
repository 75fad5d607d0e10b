//! HTTP routes.
//!
//! | Method   | Path                    | Body / response                              |
//! | -------- | ----------------------- | -------------------------------------------- |
//! | `POST`   | `/identifiers`          | `{namespace?, category, quantity?}` → `{ids}` |
//! | `POST`   | `/identifiers/register` | `{id}` → `{registered}`                      |
//! | `GET`    | `/identifiers/{id}`     | the stored record, or `404`                  |
//! | `DELETE` | `/identifiers/{id}`     | `{released}`                                 |
//! | `GET`    | `/reservations`         | `[{name, reservation}]`                      |
//! | `GET`    | `/health`               | `{status}`                                   |
//!
//! Every route that reaches the store or the reservation registry runs on
//! Tokio's blocking pool, since both sit behind `parking_lot` locks and
//! allocation may retry many times.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use sctid::{Category, Namespace, Reservation, ReservationRegistry, SctIdRecord};
use serde::{Deserialize, Serialize};

use super::{
    error::{ApiError, Result},
    state::{AppState, Service},
    telemetry::{
        increment_generation_failures, increment_ids_generated, increment_requests,
        record_ids_per_request,
    },
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/identifiers", post(generate))
        .route("/identifiers/register", post(register))
        .route("/identifiers/{id}", get(get_identifier).delete(release))
        .route("/reservations", get(reservations))
        .route("/health", get(health))
        .with_state(state)
}

fn default_quantity() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Seven digit extension namespace; absent or empty for international.
    #[serde(default)]
    pub namespace: Option<String>,
    pub category: Category,
    #[serde(default = "default_quantity")]
    pub quantity: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub registered: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub released: bool,
}

#[derive(Debug, Serialize)]
pub struct ReservationEntry {
    pub name: String,
    #[serde(flatten)]
    pub reservation: Reservation,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Runs `call` against the service on the blocking pool.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T>
where
    F: FnOnce(&Service) -> sctid::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || call(&*service))
        .await
        .map_err(|err| ApiError::Internal {
            context: err.to_string(),
        })?;
    Ok(result?)
}

#[tracing::instrument(level = "debug", skip(state))]
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>)> {
    if request.quantity > state.max_batch_size {
        return Err(ApiError::InvalidRequest {
            reason: format!(
                "quantity {} exceeds the maximum batch size of {}",
                request.quantity, state.max_batch_size
            ),
        });
    }

    let namespace = Namespace::from_option(request.namespace.as_deref())?;
    let GenerateRequest {
        category, quantity, ..
    } = request;

    increment_requests();
    record_ids_per_request(quantity as f64);

    let ids = match blocking(&state, move |service| {
        service.generate_many(&namespace, category, quantity)
    })
    .await
    {
        Ok(ids) => ids,
        Err(err) => {
            if matches!(
                err,
                ApiError::Sctid(
                    sctid::Error::GenerationFailed { .. } | sctid::Error::Exhausted { .. }
                )
            ) {
                increment_generation_failures();
            }
            return Err(err);
        }
    };

    increment_ids_generated(ids.len() as u64);
    Ok((StatusCode::CREATED, Json(GenerateResponse { ids })))
}

#[tracing::instrument(level = "debug", skip(state))]
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let registered = blocking(&state, move |service| service.register(&request.id)).await?;
    Ok(Json(RegisterResponse { registered }))
}

async fn get_identifier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SctIdRecord>> {
    let lookup = id.clone();
    match blocking(&state, move |service| service.get(&lookup)).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound { id }),
    }
}

#[tracing::instrument(level = "debug", skip(state))]
async fn release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReleaseResponse>> {
    let released = blocking(&state, move |service| service.release(&id)).await?;
    Ok(Json(ReleaseResponse { released }))
}

async fn reservations(State(state): State<AppState>) -> Result<Json<Vec<ReservationEntry>>> {
    let entries: Vec<ReservationEntry> = blocking(&state, |service| {
        Ok(service
            .reservations()
            .reservations()
            .into_iter()
            .map(|(name, reservation)| ReservationEntry { name, reservation })
            .collect())
    })
    .await?;
    Ok(Json(entries))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "serving" })
}
