//! Order endpoints
//!
//! Booking, listing and the status lifecycle. Notifications go out after
//! the order change is committed and never fail the request.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use fleetctl_core::models::{optional_phone, Address, Description, Kilograms, Name};
use fleetctl_core::notify::OrderEvent;
use fleetctl_core::{Paginated, ValidationError};
use serde::Deserialize;
use serde_with::rust::double_option;
use uuid::Uuid;

use super::{page, parse_filter};
use crate::db::{Assignment, NewOrder, Order, OrderFilter, OrderPatch, OrderRepo, StatusChange};
use crate::http::envelope::{ApiResponse, ApiResult, CreatedResult};
use crate::http::extractors::{JsonBody, ValidQuery, ValidUuid};
use crate::http::server::AppState;

/// Book order request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub client_id: Uuid,
    pub pickup_address: String,
    pub delivery_address: String,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub package_description: Option<String>,
    pub weight_kg: f64,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

impl CreateOrderRequest {
    fn validate(self) -> Result<NewOrder, ValidationError> {
        Ok(NewOrder {
            client_id: self.client_id,
            pickup_address: Address::new("pickup_address", &self.pickup_address)?,
            delivery_address: Address::new("delivery_address", &self.delivery_address)?,
            recipient_name: Name::new("recipient_name", &self.recipient_name)?,
            recipient_phone: optional_phone("recipient_phone", self.recipient_phone.as_deref())?,
            package_description: self
                .package_description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(|d| Description::new("package_description", d))
                .transpose()?,
            weight: Kilograms::new("weight_kg", self.weight_kg)?,
            vehicle_id: self.vehicle_id,
            driver_id: self.driver_id,
        })
    }
}

/// Status change and/or assignment; `"vehicle_id": null` unassigns
#[derive(Debug, Default, Deserialize)]
pub struct PatchOrderRequest {
    pub status: Option<String>,
    /// Rejection reason
    pub reason: Option<String>,
    #[serde(default, with = "double_option")]
    pub vehicle_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub driver_id: Option<Option<Uuid>>,
}

impl PatchOrderRequest {
    fn validate(self) -> Result<OrderPatch, ValidationError> {
        let reason = self
            .reason
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|r| Description::new("reason", r))
            .transpose()?;

        let status = match parse_filter(self.status.as_deref())? {
            Some(to) => Some(StatusChange { to, reason }),
            None if reason.is_some() => {
                return Err(ValidationError::InvalidFormat {
                    field: "reason",
                    reason: "only applies when rejecting an order",
                })
            }
            None => None,
        };

        let patch = OrderPatch {
            assignment: Assignment {
                vehicle_id: self.vehicle_id,
                driver_id: self.driver_id,
            },
            status,
        };

        if patch.assignment.is_empty() && patch.status.is_none() {
            return Err(ValidationError::Empty { field: "update" });
        }
        Ok(patch)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/orders
async fn list_orders(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<ListOrdersQuery>,
) -> ApiResult<Paginated<Order>> {
    let filter = OrderFilter {
        status: parse_filter(query.status.as_deref())?,
        client_id: query.client_id,
        vehicle_id: query.vehicle_id,
        driver_id: query.driver_id,
    };
    let orders = OrderRepo::new(&state.pool)
        .list(filter, page(query.page, query.per_page))
        .await?;
    Ok(ApiResponse::ok(orders))
}

/// POST /api/orders - book an order in `pending`
async fn create_order(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> CreatedResult<Order> {
    let order = OrderRepo::new(&state.pool).create(req.validate()?).await?;

    state
        .notifier
        .order_event(&state.pool, &order, OrderEvent::Created)
        .await;

    Ok(ApiResponse::created(order))
}

/// GET /api/orders/{id}
async fn get_order(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<Order> {
    Ok(ApiResponse::ok(OrderRepo::new(&state.pool).get(id).await?))
}

/// PATCH /api/orders/{id} - transition and/or assignment
async fn patch_order(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    JsonBody(req): JsonBody<PatchOrderRequest>,
) -> ApiResult<Order> {
    let (order, transition) = OrderRepo::new(&state.pool)
        .apply_patch(id, req.validate()?, state.tracking.depot)
        .await?;

    if let Some(t) = transition {
        state
            .notifier
            .order_event(&state.pool, &order, OrderEvent::StatusChanged(t))
            .await;
    }

    Ok(ApiResponse::ok(order))
}

/// DELETE /api/orders/{id}
async fn delete_order(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> ApiResult<serde_json::Value> {
    OrderRepo::new(&state.pool).delete(id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "id": id })))
}

/// Order routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route(
            "/api/orders/{id}",
            get(get_order).patch(patch_order).delete(delete_order),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetctl_core::models::OrderStatus;

    #[test]
    fn patch_parses_status_and_unassign() {
        let req: PatchOrderRequest =
            serde_json::from_str(r#"{"status": "In_Transit", "vehicle_id": null}"#).unwrap();
        let patch = req.validate().unwrap();

        assert_eq!(patch.status.unwrap().to, OrderStatus::InTransit);
        assert_eq!(patch.assignment.vehicle_id, Some(None));
        assert_eq!(patch.assignment.driver_id, None);
    }

    #[test]
    fn unknown_status_is_validation_error() {
        let req: PatchOrderRequest = serde_json::from_str(r#"{"status": "lost"}"#).unwrap();
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidVariant { field: "status", .. })
        ));
    }

    #[test]
    fn reason_needs_a_status() {
        let req: PatchOrderRequest = serde_json::from_str(r#"{"reason": "no access"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = PatchOrderRequest::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "update" });
    }

    #[test]
    fn blank_description_is_dropped() {
        let req = CreateOrderRequest {
            client_id: Uuid::new_v4(),
            pickup_address: "Depot".into(),
            delivery_address: "1 High St".into(),
            recipient_name: "Jo".into(),
            recipient_phone: None,
            package_description: Some("   ".into()),
            weight_kg: 3.5,
            vehicle_id: None,
            driver_id: None,
        };
        let new = req.validate().unwrap();
        assert!(new.package_description.is_none());
        assert_eq!(new.weight.value(), 3.5);
    }

    #[test]
    fn zero_weight_is_rejected() {
        let req = CreateOrderRequest {
            client_id: Uuid::new_v4(),
            pickup_address: "Depot".into(),
            delivery_address: "1 High St".into(),
            recipient_name: "Jo".into(),
            recipient_phone: None,
            package_description: None,
            weight_kg: 0.0,
            vehicle_id: None,
            driver_id: None,
        };
        assert!(req.validate().is_err());
    }
}
