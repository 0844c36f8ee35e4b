//! Vehicle repository
//!
//! Plate number is the natural key. Status is driven manually (maintenance,
//! out of service) and by the order lifecycle (in use while a trip runs).

use chrono::{DateTime, Utc};
use fleetctl_core::models::{
    Coordinates, Kilograms, Name, OrderStatus, PlateNumber, UserRole, VehicleStatus,
};
use fleetctl_core::{Paginated, Pagination};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{parse_column, users, DbError};

const COLUMNS: &str =
    "id, plate_number, model, capacity_kg, status, driver_id, lat, lng, created_at, updated_at";

#[derive(Debug, FromRow)]
struct VehicleRow {
    id: Uuid,
    plate_number: String,
    model: String,
    capacity_kg: f64,
    status: String,
    driver_id: Option<Uuid>,
    lat: f64,
    lng: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Vehicle record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub model: String,
    pub capacity_kg: f64,
    pub status: VehicleStatus,
    pub driver_id: Option<Uuid>,
    pub location: Coordinates,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = DbError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            plate_number: row.plate_number,
            model: row.model,
            capacity_kg: row.capacity_kg,
            status: parse_column("vehicles", &row.status)?,
            driver_id: row.driver_id,
            location: Coordinates {
                lat: row.lat,
                lng: row.lng,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Validated input for a new vehicle
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub plate_number: PlateNumber,
    pub model: Name,
    pub capacity: Kilograms,
    pub status: VehicleStatus,
    pub driver_id: Option<Uuid>,
    pub location: Coordinates,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct VehicleChanges {
    pub plate_number: Option<PlateNumber>,
    pub model: Option<Name>,
    pub capacity: Option<Kilograms>,
    pub status: Option<VehicleStatus>,
    /// `Some(None)` unassigns the driver
    pub driver_id: Option<Option<Uuid>>,
    pub location: Option<Coordinates>,
}

impl VehicleChanges {
    pub fn is_empty(&self) -> bool {
        self.plate_number.is_none()
            && self.model.is_none()
            && self.capacity.is_none()
            && self.status.is_none()
            && self.driver_id.is_none()
            && self.location.is_none()
    }
}

/// Vehicle repository
pub struct VehicleRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VehicleRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a vehicle. Duplicate plate is a conflict; a driver must have
    /// the driver role.
    pub async fn create(&self, new: NewVehicle) -> Result<Vehicle, DbError> {
        let mut tx = self.pool.begin().await?;

        if let Some(driver_id) = new.driver_id {
            users::ensure_role(&mut *tx, driver_id, "driver_id", UserRole::Driver).await?;
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO vehicles
                 (id, plate_number, model, capacity_kg, status, driver_id, lat, lng, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {COLUMNS}"
        );
        let row: VehicleRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(new.plate_number.as_str())
            .bind(new.model.as_str())
            .bind(new.capacity.value())
            .bind(new.status.as_str())
            .bind(new.driver_id)
            .bind(new.location.lat)
            .bind(new.location.lng)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                DbError::unique(e, format!("plate number '{}' already exists", new.plate_number))
            })?;

        tx.commit().await?;

        let vehicle = Vehicle::try_from(row)?;
        tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate_number, "vehicle created");
        Ok(vehicle)
    }

    pub async fn get(&self, id: Uuid) -> Result<Vehicle, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut *conn, id).await
    }

    /// List vehicles, optionally filtered by status, ordered by plate.
    pub async fn list(
        &self,
        status: Option<VehicleStatus>,
        page: Pagination,
    ) -> Result<Paginated<Vehicle>, DbError> {
        let status = status.map(VehicleStatus::as_str);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vehicles WHERE (?1 IS NULL OR status = ?1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM vehicles
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY plate_number
             LIMIT ?2 OFFSET ?3"
        );
        let rows: Vec<VehicleRow> = sqlx::query_as(&sql)
            .bind(status)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Vehicle::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Apply a partial update.
    pub async fn update(&self, id: Uuid, changes: VehicleChanges) -> Result<Vehicle, DbError> {
        let mut tx = self.pool.begin().await?;
        let current = fetch(&mut *tx, id).await?;

        let driver_id = match changes.driver_id {
            Some(Some(driver_id)) => {
                users::ensure_role(&mut *tx, driver_id, "driver_id", UserRole::Driver).await?;
                Some(driver_id)
            }
            Some(None) => None,
            None => current.driver_id,
        };

        let plate = changes
            .plate_number
            .map(|p| p.as_str().to_owned())
            .unwrap_or(current.plate_number);
        let model = changes.model.map(Name::into_string).unwrap_or(current.model);
        let capacity = match changes.capacity {
            Some(capacity) => {
                ensure_carries_open_orders(&mut *tx, id, capacity.value()).await?;
                capacity.value()
            }
            None => current.capacity_kg,
        };
        let status = changes.status.unwrap_or(current.status);
        let location = changes.location.unwrap_or(current.location);

        let sql = format!(
            "UPDATE vehicles
             SET plate_number = ?2, model = ?3, capacity_kg = ?4, status = ?5,
                 driver_id = ?6, lat = ?7, lng = ?8, updated_at = ?9
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        let row: VehicleRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(&plate)
            .bind(&model)
            .bind(capacity)
            .bind(status.as_str())
            .bind(driver_id)
            .bind(location.lat)
            .bind(location.lng)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DbError::unique(e, format!("plate number '{plate}' already exists")))?;

        tx.commit().await?;

        let vehicle = Vehicle::try_from(row)?;
        if vehicle.status != current.status {
            tracing::info!(
                vehicle_id = %id,
                from = %current.status,
                to = %vehicle.status,
                "vehicle status changed"
            );
        }
        Ok(vehicle)
    }

    /// Delete a vehicle. Orders keep their history with the vehicle unset;
    /// maintenance and accident logs go with it.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("vehicle", id));
        }

        tracing::info!(vehicle_id = %id, "vehicle deleted");
        Ok(())
    }
}

/// Every open order assigned to the vehicle must still fit in `capacity_kg`.
async fn ensure_carries_open_orders(
    conn: &mut SqliteConnection,
    id: Uuid,
    capacity_kg: f64,
) -> Result<(), DbError> {
    let heaviest: Option<f64> = sqlx::query_scalar(
        "SELECT MAX(weight_kg) FROM orders
         WHERE vehicle_id = ?1 AND status NOT IN (?2, ?3)",
    )
    .bind(id)
    .bind(OrderStatus::Delivered.as_str())
    .bind(OrderStatus::Rejected.as_str())
    .fetch_one(&mut *conn)
    .await?;

    match heaviest {
        Some(weight) if weight > capacity_kg => Err(DbError::Conflict(format!(
            "vehicle carries an open order of {weight} kg; capacity can't drop to {capacity_kg} kg"
        ))),
        _ => Ok(()),
    }
}

/// Load a vehicle on an open connection or transaction.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> Result<Vehicle, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM vehicles WHERE id = ?1");
    let row: VehicleRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("vehicle", id))?;

    Vehicle::try_from(row)
}

/// Set status without touching other fields.
pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: VehicleStatus,
) -> Result<(), DbError> {
    sqlx::query("UPDATE vehicles SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Move a vehicle to `location`.
pub(crate) async fn set_location(
    conn: &mut SqliteConnection,
    id: Uuid,
    location: Coordinates,
) -> Result<(), DbError> {
    sqlx::query("UPDATE vehicles SET lat = ?2, lng = ?3, updated_at = ?4 WHERE id = ?1")
        .bind(id)
        .bind(location.lat)
        .bind(location.lng)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{testing, NewOrder, OrderRepo};
    use fleetctl_core::models::Address;

    fn capacity(kg: f64) -> VehicleChanges {
        VehicleChanges {
            capacity: Some(Kilograms::new("capacity_kg", kg).unwrap()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn capacity_cannot_drop_below_open_load() {
        let pool = testing::pool().await;
        let client = testing::user(&pool, "c@example.com", UserRole::Client).await;
        let van = testing::vehicle(&pool, "VAN-5", 1000.0).await;
        OrderRepo::new(&pool)
            .create(NewOrder {
                client_id: client.id,
                pickup_address: Address::new("pickup_address", "Depot").unwrap(),
                delivery_address: Address::new("delivery_address", "Quay 3").unwrap(),
                recipient_name: Name::new("recipient_name", "Lee").unwrap(),
                recipient_phone: None,
                package_description: None,
                weight: Kilograms::new("weight_kg", 500.0).unwrap(),
                vehicle_id: Some(van.id),
                driver_id: None,
            })
            .await
            .unwrap();
        let repo = VehicleRepo::new(&pool);

        let err = repo.update(van.id, capacity(10.0)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert_eq!(repo.get(van.id).await.unwrap().capacity_kg, 1000.0);

        let shrunk = repo.update(van.id, capacity(500.0)).await.unwrap();
        assert_eq!(shrunk.capacity_kg, 500.0);
    }

    #[tokio::test]
    async fn duplicate_plate_conflicts_after_normalization() {
        let pool = testing::pool().await;
        testing::vehicle(&pool, "AB-123", 1000.0).await;

        let err = VehicleRepo::new(&pool)
            .create(NewVehicle {
                plate_number: PlateNumber::new("ab 123").unwrap(),
                model: Name::new("model", "Sprinter").unwrap(),
                capacity: Kilograms::new("capacity_kg", 900.0).unwrap(),
                status: VehicleStatus::Available,
                driver_id: None,
                location: Coordinates::new(0.0, 0.0).unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn driver_must_have_driver_role() {
        let pool = testing::pool().await;
        let client = testing::user(&pool, "client@example.com", UserRole::Client).await;
        let vehicle = testing::vehicle(&pool, "KX-1", 500.0).await;

        let err = VehicleRepo::new(&pool)
            .update(
                vehicle.id,
                VehicleChanges {
                    driver_id: Some(Some(client.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let driver = testing::user(&pool, "driver@example.com", UserRole::Driver).await;
        let updated = VehicleRepo::new(&pool)
            .update(
                vehicle.id,
                VehicleChanges {
                    driver_id: Some(Some(driver.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn status_update_and_filter() {
        let pool = testing::pool().await;
        let repo = VehicleRepo::new(&pool);
        let a = testing::vehicle(&pool, "AA-1", 500.0).await;
        testing::vehicle(&pool, "BB-2", 500.0).await;

        repo.update(
            a.id,
            VehicleChanges {
                status: Some(VehicleStatus::Maintenance),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let in_shop = repo
            .list(Some(VehicleStatus::Maintenance), Pagination::default())
            .await
            .unwrap();
        assert_eq!(in_shop.total, 1);
        assert_eq!(in_shop.items[0].plate_number, "AA-1");
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let pool = testing::pool().await;
        let v = testing::vehicle(&pool, "DEL-1", 100.0).await;
        let repo = VehicleRepo::new(&pool);

        repo.delete(v.id).await.unwrap();
        assert!(matches!(
            repo.delete(v.id).await.unwrap_err(),
            DbError::NotFound { resource: "vehicle", .. }
        ));
    }
}
