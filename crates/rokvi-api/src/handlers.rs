//! Default routes mounted by the host's startup.
//!
//! # Design
//! - `/` redirects to `/health` with `302 Found` so clients that do not follow
//!   redirects observe the raw response.
//! - Handlers only read through the capabilities in [`ApiState`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use rokvi_core::Car;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::problem::ApiError;
use crate::state::ApiState;

/// Health payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the host serves requests.
    pub status: &'static str,
    /// Current time reported by the clock service.
    pub time: DateTime<Utc>,
}

/// Router with the default routes, bound to `state`.
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/cars", get(list_cars))
        .route("/cars/{id}", get(get_car))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/health")])
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: state.clock.utc_now(),
    })
}

async fn list_cars(State(state): State<ApiState>) -> Result<Json<Vec<Car>>, ApiError> {
    let cars = state.cars.list().await.map_err(|err| {
        error!(error = %err, "car listing failed");
        ApiError::internal("car listing failed")
    })?;
    info!(count = cars.len(), "cars listed");
    Ok(Json(cars))
}

async fn get_car(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Car>, ApiError> {
    match state.cars.get(id).await {
        Ok(Some(car)) => Ok(Json(car)),
        Ok(None) => Err(ApiError::not_found(format!("car {id} not found"))),
        Err(err) => {
            error!(error = %err, car_id = %id, "car lookup failed");
            Err(ApiError::internal("car lookup failed"))
        }
    }
}
