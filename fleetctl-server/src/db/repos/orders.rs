//! Order repository
//!
//! Handles order booking and the status lifecycle:
//! - Creation validates client role, vehicle assignability and capacity
//! - Patches (assignment + status change) run in one transaction
//! - Trip start/end drive the assigned vehicle's status

use chrono::{DateTime, Utc};
use fleetctl_core::models::{
    Address, Coordinates, Description, Kilograms, Name, OrderStatus, Phone, UserRole,
    VehicleStatus,
};
use fleetctl_core::{Paginated, Pagination, Transition, ValidationError};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{parse_column, users, vehicles, DbError};

const COLUMNS: &str = "id, client_id, pickup_address, delivery_address, recipient_name, \
     recipient_phone, package_description, weight_kg, status, vehicle_id, driver_id, \
     rejection_reason, lat, lng, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    client_id: Uuid,
    pickup_address: String,
    delivery_address: String,
    recipient_name: String,
    recipient_phone: Option<String>,
    package_description: Option<String>,
    weight_kg: f64,
    status: String,
    vehicle_id: Option<Uuid>,
    driver_id: Option<Uuid>,
    rejection_reason: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Order record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub pickup_address: String,
    pub delivery_address: String,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub package_description: Option<String>,
    pub weight_kg: f64,
    pub status: OrderStatus,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    /// Last known position; set once the trip starts
    pub location: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            pickup_address: row.pickup_address,
            delivery_address: row.delivery_address,
            recipient_name: row.recipient_name,
            recipient_phone: row.recipient_phone,
            package_description: row.package_description,
            weight_kg: row.weight_kg,
            status: parse_column("orders", &row.status)?,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            rejection_reason: row.rejection_reason,
            location: Coordinates::from_columns(row.lat, row.lng),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Validated input for a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_id: Uuid,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub recipient_name: Name,
    pub recipient_phone: Option<Phone>,
    pub package_description: Option<Description>,
    pub weight: Kilograms,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

/// Vehicle/driver assignment; outer `None` leaves a field unchanged,
/// `Some(None)` unassigns
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Assignment {
    pub vehicle_id: Option<Option<Uuid>>,
    pub driver_id: Option<Option<Uuid>>,
}

impl Assignment {
    pub fn is_empty(&self) -> bool {
        self.vehicle_id.is_none() && self.driver_id.is_none()
    }
}

/// Requested status change
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub to: OrderStatus,
    /// Only meaningful for rejection
    pub reason: Option<Description>,
}

/// Everything `PATCH /api/orders/{id}` can change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub assignment: Assignment,
    pub status: Option<StatusChange>,
}

/// List filter
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub client_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

/// Order repository
pub struct OrderRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Book a new order in `pending`.
    pub async fn create(&self, new: NewOrder) -> Result<Order, DbError> {
        let mut tx = self.pool.begin().await?;

        users::ensure_role(&mut *tx, new.client_id, "client_id", UserRole::Client).await?;
        if let Some(vehicle_id) = new.vehicle_id {
            check_vehicle(&mut *tx, vehicle_id, new.weight.value()).await?;
        }
        if let Some(driver_id) = new.driver_id {
            users::ensure_role(&mut *tx, driver_id, "driver_id", UserRole::Driver).await?;
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO orders
                 (id, client_id, pickup_address, delivery_address, recipient_name,
                  recipient_phone, package_description, weight_kg, status, vehicle_id,
                  driver_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             RETURNING {COLUMNS}"
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(new.client_id)
            .bind(new.pickup_address.as_str())
            .bind(new.delivery_address.as_str())
            .bind(new.recipient_name.as_str())
            .bind(new.recipient_phone.as_ref().map(Phone::as_str))
            .bind(new.package_description.as_ref().map(Description::as_str))
            .bind(new.weight.value())
            .bind(OrderStatus::Pending.as_str())
            .bind(new.vehicle_id)
            .bind(new.driver_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let order = Order::try_from(row)?;
        tracing::info!(order_id = %order.id, client_id = %order.client_id, "order booked");
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut *conn, id).await
    }

    /// List orders matching `filter`, newest first.
    pub async fn list(
        &self,
        filter: OrderFilter,
        page: Pagination,
    ) -> Result<Paginated<Order>, DbError> {
        const WHERE: &str = "WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR client_id = ?2)
              AND (?3 IS NULL OR vehicle_id = ?3)
              AND (?4 IS NULL OR driver_id = ?4)";

        let status = filter.status.map(OrderStatus::as_str);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {WHERE}"))
            .bind(status)
            .bind(filter.client_id)
            .bind(filter.vehicle_id)
            .bind(filter.driver_id)
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM orders {WHERE}
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?5 OFFSET ?6"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(status)
            .bind(filter.client_id)
            .bind(filter.vehicle_id)
            .bind(filter.driver_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Most recently booked orders, for the dashboard.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, DbError> {
        let sql = format!("SELECT {COLUMNS} FROM orders ORDER BY created_at DESC, rowid DESC LIMIT ?1");
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Apply an assignment and/or status change atomically.
    ///
    /// Assignment is applied first, so a single patch can assign a vehicle
    /// and start the trip. `depot` is the start position for trips with no
    /// vehicle. Returns the updated order and the transition, if any.
    pub async fn apply_patch(
        &self,
        id: Uuid,
        patch: OrderPatch,
        depot: Coordinates,
    ) -> Result<(Order, Option<Transition>), DbError> {
        let mut tx = self.pool.begin().await?;
        let mut order = fetch(&mut *tx, id).await?;

        if !patch.assignment.is_empty() {
            order.status.ensure_assignable()?;

            if let Some(vehicle_id) = patch.assignment.vehicle_id {
                if let Some(vehicle_id) = vehicle_id {
                    check_vehicle(&mut *tx, vehicle_id, order.weight_kg).await?;
                }
                order.vehicle_id = vehicle_id;
            }

            if let Some(driver_id) = patch.assignment.driver_id {
                if let Some(driver_id) = driver_id {
                    users::ensure_role(&mut *tx, driver_id, "driver_id", UserRole::Driver).await?;
                }
                order.driver_id = driver_id;
            }
        }

        let mut transition = None;
        if let Some(change) = patch.status {
            if change.reason.is_some() && change.to != OrderStatus::Rejected {
                return Err(ValidationError::InvalidFormat {
                    field: "reason",
                    reason: "only applies when rejecting an order",
                }
                .into());
            }

            let t = order.status.transition(change.to)?;

            if t.starts_trip() {
                order.location = Some(match order.vehicle_id {
                    Some(vehicle_id) => {
                        let vehicle = check_vehicle(&mut *tx, vehicle_id, order.weight_kg).await?;
                        vehicles::set_status(&mut *tx, vehicle_id, VehicleStatus::InUse).await?;
                        vehicle.location
                    }
                    None => depot,
                });
            }

            if t.releases_vehicle() {
                if let Some(vehicle_id) = order.vehicle_id {
                    release_vehicle(&mut *tx, vehicle_id, order.id).await?;
                }
            }

            if t.to == OrderStatus::Rejected {
                order.rejection_reason = change.reason.map(Description::into_string);
            }

            order.status = t.to;
            transition = Some(t);
        }

        let sql = format!(
            "UPDATE orders
             SET status = ?2, vehicle_id = ?3, driver_id = ?4, rejection_reason = ?5,
                 lat = ?6, lng = ?7, updated_at = ?8
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(order.status.as_str())
            .bind(order.vehicle_id)
            .bind(order.driver_id)
            .bind(order.rejection_reason.as_deref())
            .bind(order.location.map(|c| c.lat))
            .bind(order.location.map(|c| c.lng))
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Some(t) = transition {
            tracing::info!(order_id = %id, from = %t.from, to = %t.to, "order status changed");
        }

        Ok((Order::try_from(row)?, transition))
    }

    /// Store a new tracked position on an in-transit order and its vehicle.
    /// Orders no longer in transit are returned unchanged.
    pub async fn record_position(&self, id: Uuid, location: Coordinates) -> Result<Order, DbError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE orders SET lat = ?2, lng = ?3, updated_at = ?4
             WHERE id = ?1 AND status = ?5
             RETURNING {COLUMNS}"
        );
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(location.lat)
            .bind(location.lng)
            .bind(Utc::now())
            .bind(OrderStatus::InTransit.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return fetch(&mut *tx, id).await;
        };

        if let Some(vehicle_id) = row.vehicle_id {
            vehicles::set_location(&mut *tx, vehicle_id, location).await?;
        }

        tx.commit().await?;
        Order::try_from(row)
    }

    /// Delete an order. Orders on the road can't be deleted.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let order = fetch(&mut *tx, id).await?;

        if order.status == OrderStatus::InTransit {
            return Err(DbError::Conflict(
                "order is in transit; deliver or reject it first".into(),
            ));
        }

        sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}

/// Load an order on an open connection or transaction.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> Result<Order, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM orders WHERE id = ?1");
    let row: OrderRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("order", id))?;

    Order::try_from(row)
}

/// Vehicle must exist, be assignable and carry `weight_kg`.
async fn check_vehicle(
    conn: &mut SqliteConnection,
    vehicle_id: Uuid,
    weight_kg: f64,
) -> Result<vehicles::Vehicle, DbError> {
    let vehicle = vehicles::fetch(conn, vehicle_id).await?;

    if !vehicle.status.is_assignable() {
        return Err(DbError::Conflict(format!(
            "vehicle {} is {} and can't take orders",
            vehicle.plate_number, vehicle.status
        )));
    }

    if weight_kg > vehicle.capacity_kg {
        return Err(DbError::Conflict(format!(
            "load of {weight_kg} kg exceeds capacity of vehicle {} ({} kg)",
            vehicle.plate_number, vehicle.capacity_kg
        )));
    }

    Ok(vehicle)
}

/// Return a vehicle to `available` unless another trip still uses it or it
/// was taken out of service meanwhile.
async fn release_vehicle(
    conn: &mut SqliteConnection,
    vehicle_id: Uuid,
    finished_order: Uuid,
) -> Result<(), DbError> {
    let other_trips: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE vehicle_id = ?1 AND status = ?2 AND id != ?3",
    )
    .bind(vehicle_id)
    .bind(OrderStatus::InTransit.as_str())
    .bind(finished_order)
    .fetch_one(&mut *conn)
    .await?;

    if other_trips > 0 {
        return Ok(());
    }

    sqlx::query("UPDATE vehicles SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4")
        .bind(vehicle_id)
        .bind(VehicleStatus::Available.as_str())
        .bind(Utc::now())
        .bind(VehicleStatus::InUse.as_str())
        .execute(&mut *conn)
        .await?;

    Ok(())
}
