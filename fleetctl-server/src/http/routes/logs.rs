//! Vehicle maintenance and accident log endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Utc};
use fleetctl_core::models::{Cost, Description};
use fleetctl_core::{Paginated, ValidationError};
use serde::Deserialize;
use uuid::Uuid;

use super::page;
use crate::db::{AccidentLog, LogRepo, MaintenanceLog, NewAccident, NewMaintenance};
use crate::http::envelope::{ApiResponse, ApiResult, CreatedResult};
use crate::http::extractors::{JsonBody, ValidQuery, ValidUuid};
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    pub description: String,
    pub cost: f64,
    pub performed_at: Option<DateTime<Utc>>,
}

impl MaintenanceRequest {
    fn validate(self) -> Result<NewMaintenance, ValidationError> {
        Ok(NewMaintenance {
            description: Description::new("description", &self.description)?,
            cost: Cost::new(self.cost)?,
            performed_at: self.performed_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AccidentRequest {
    pub description: String,
    pub severity: String,
    pub driver_id: Option<Uuid>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl AccidentRequest {
    fn validate(self) -> Result<NewAccident, ValidationError> {
        Ok(NewAccident {
            description: Description::new("description", &self.description)?,
            severity: self.severity.parse()?,
            driver_id: self.driver_id,
            occurred_at: self.occurred_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/vehicles/{id}/maintenance
async fn list_maintenance(
    State(state): State<Arc<AppState>>,
    ValidUuid(vehicle_id): ValidUuid,
    ValidQuery(query): ValidQuery<LogQuery>,
) -> ApiResult<Paginated<MaintenanceLog>> {
    let logs = LogRepo::new(&state.pool)
        .list_maintenance(vehicle_id, page(query.page, query.per_page))
        .await?;
    Ok(ApiResponse::ok(logs))
}

/// POST /api/vehicles/{id}/maintenance
async fn add_maintenance(
    State(state): State<Arc<AppState>>,
    ValidUuid(vehicle_id): ValidUuid,
    JsonBody(req): JsonBody<MaintenanceRequest>,
) -> CreatedResult<MaintenanceLog> {
    let entry = LogRepo::new(&state.pool)
        .add_maintenance(vehicle_id, req.validate()?)
        .await?;
    Ok(ApiResponse::created(entry))
}

/// GET /api/vehicles/{id}/accidents
async fn list_accidents(
    State(state): State<Arc<AppState>>,
    ValidUuid(vehicle_id): ValidUuid,
    ValidQuery(query): ValidQuery<LogQuery>,
) -> ApiResult<Paginated<AccidentLog>> {
    let logs = LogRepo::new(&state.pool)
        .list_accidents(vehicle_id, page(query.page, query.per_page))
        .await?;
    Ok(ApiResponse::ok(logs))
}

/// POST /api/vehicles/{id}/accidents
async fn add_accident(
    State(state): State<Arc<AppState>>,
    ValidUuid(vehicle_id): ValidUuid,
    JsonBody(req): JsonBody<AccidentRequest>,
) -> CreatedResult<AccidentLog> {
    let entry = LogRepo::new(&state.pool)
        .add_accident(vehicle_id, req.validate()?)
        .await?;
    Ok(ApiResponse::created(entry))
}

/// Log routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/vehicles/{id}/maintenance",
            get(list_maintenance).post(add_maintenance),
        )
        .route(
            "/api/vehicles/{id}/accidents",
            get(list_accidents).post(add_accident),
        )
}
