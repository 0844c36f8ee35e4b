//! Simulated live tracking
//!
//! There is no GPS feed. Each poll of an in-transit order nudges its last
//! position by a random offset and stores the result on the order and its
//! vehicle, so consecutive polls trace a plausible path.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Utc};
use fleetctl_core::models::{Coordinates, OrderStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{OrderRepo, VehicleRepo};
use crate::http::envelope::{ApiResponse, ApiResult};
use crate::http::extractors::ValidUuid;
use crate::http::server::AppState;

/// Tracking response
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    /// `None` until the trip starts
    pub location: Option<Coordinates>,
    pub vehicle_plate: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// GET /api/clients/tracking/{id}
async fn track_order(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<TrackingResponse> {
    let repo = OrderRepo::new(&state.pool);
    let mut order = repo.get(id).await?;

    match order.status {
        OrderStatus::InTransit => {
            let current = order.location.unwrap_or(state.tracking.depot);
            let next = {
                let mut rng = rand::thread_rng();
                current.jitter(&mut rng, state.tracking.jitter_degrees)
            };
            order = repo.record_position(id, next).await?;
        }
        OrderStatus::Pending | OrderStatus::Received => order.location = None,
        OrderStatus::Delivered | OrderStatus::Rejected => {}
    }

    let vehicle_plate = match order.vehicle_id {
        Some(vehicle_id) => Some(VehicleRepo::new(&state.pool).get(vehicle_id).await?.plate_number),
        None => None,
    };

    Ok(ApiResponse::ok(TrackingResponse {
        order_id: order.id,
        status: order.status,
        location: order.location,
        vehicle_plate,
        updated_at: order.updated_at,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/clients/tracking/{id}", get(track_order))
}
