//! Vehicle endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use fleetctl_core::models::{Coordinates, Kilograms, Name, PlateNumber, VehicleStatus};
use fleetctl_core::{Paginated, ValidationError};
use serde::Deserialize;
use serde_with::rust::double_option;
use uuid::Uuid;

use super::{page, parse_filter};
use crate::db::{NewVehicle, Vehicle, VehicleChanges, VehicleRepo};
use crate::http::envelope::{ApiResponse, ApiResult, CreatedResult};
use crate::http::extractors::{JsonBody, ValidQuery, ValidUuid};
use crate::http::server::AppState;

/// Re-check coordinates that came straight from JSON.
fn checked(location: Coordinates) -> Result<Coordinates, ValidationError> {
    Coordinates::new(location.lat, location.lng)
}

/// Create vehicle request
#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub plate_number: String,
    pub model: String,
    pub capacity_kg: f64,
    /// Defaults to `available`
    pub status: Option<String>,
    pub driver_id: Option<Uuid>,
    /// Defaults to the depot
    pub location: Option<Coordinates>,
}

impl CreateVehicleRequest {
    fn validate(self, depot: Coordinates) -> Result<NewVehicle, ValidationError> {
        Ok(NewVehicle {
            plate_number: PlateNumber::new(&self.plate_number)?,
            model: Name::new("model", &self.model)?,
            capacity: Kilograms::new("capacity_kg", self.capacity_kg)?,
            status: parse_filter(self.status.as_deref())?.unwrap_or(VehicleStatus::Available),
            driver_id: self.driver_id,
            location: self.location.map(checked).transpose()?.unwrap_or(depot),
        })
    }
}

/// Update vehicle request; omitted fields are unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateVehicleRequest {
    pub plate_number: Option<String>,
    pub model: Option<String>,
    pub capacity_kg: Option<f64>,
    pub status: Option<String>,
    #[serde(default, with = "double_option")]
    pub driver_id: Option<Option<Uuid>>,
    pub location: Option<Coordinates>,
}

impl UpdateVehicleRequest {
    fn validate(self) -> Result<VehicleChanges, ValidationError> {
        let changes = VehicleChanges {
            plate_number: self.plate_number.as_deref().map(PlateNumber::new).transpose()?,
            model: self.model.map(|m| Name::new("model", &m)).transpose()?,
            capacity: self
                .capacity_kg
                .map(|c| Kilograms::new("capacity_kg", c))
                .transpose()?,
            status: self.status.as_deref().map(str::parse).transpose()?,
            driver_id: self.driver_id,
            location: self.location.map(checked).transpose()?,
        };

        if changes.is_empty() {
            return Err(ValidationError::Empty { field: "update" });
        }
        Ok(changes)
    }
}

/// `PATCH /api/vehicles/{id}` body
#[derive(Debug, Deserialize)]
pub struct VehicleStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListVehiclesQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/vehicles
async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<ListVehiclesQuery>,
) -> ApiResult<Paginated<Vehicle>> {
    let status = parse_filter(query.status.as_deref())?;
    let vehicles = VehicleRepo::new(&state.pool)
        .list(status, page(query.page, query.per_page))
        .await?;
    Ok(ApiResponse::ok(vehicles))
}

/// POST /api/vehicles
async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateVehicleRequest>,
) -> CreatedResult<Vehicle> {
    let new = req.validate(state.tracking.depot)?;
    let vehicle = VehicleRepo::new(&state.pool).create(new).await?;
    Ok(ApiResponse::created(vehicle))
}

/// GET /api/vehicles/{id}
async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<Vehicle> {
    Ok(ApiResponse::ok(VehicleRepo::new(&state.pool).get(id).await?))
}

/// PUT /api/vehicles/{id}
async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<UpdateVehicleRequest>,
) -> ApiResult<Vehicle> {
    let vehicle = VehicleRepo::new(&state.pool).update(id, req.validate()?).await?;
    Ok(ApiResponse::ok(vehicle))
}

/// PATCH /api/vehicles/{id} - status only
async fn set_vehicle_status(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<VehicleStatusRequest>,
) -> ApiResult<Vehicle> {
    let status: VehicleStatus = req.status.parse()?;
    let changes = VehicleChanges {
        status: Some(status),
        ..Default::default()
    };
    let vehicle = VehicleRepo::new(&state.pool).update(id, changes).await?;
    Ok(ApiResponse::ok(vehicle))
}

/// DELETE /api/vehicles/{id}
async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<serde_json::Value> {
    VehicleRepo::new(&state.pool).delete(id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "id": id })))
}

/// Vehicle routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/api/vehicles/{id}",
            get(get_vehicle)
                .put(update_vehicle)
                .patch(set_vehicle_status)
                .delete(delete_vehicle),
        )
}
