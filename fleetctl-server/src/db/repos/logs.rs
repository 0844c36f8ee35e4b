//! Maintenance and accident logs, both owned by a vehicle

use chrono::{DateTime, Utc};
use fleetctl_core::models::{Cost, Description, Severity, UserRole};
use fleetctl_core::{Paginated, Pagination};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{parse_column, users, DbError};

/// Maintenance log entry
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MaintenanceLog {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub description: String,
    pub cost: f64,
    pub performed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AccidentRow {
    id: Uuid,
    vehicle_id: Uuid,
    driver_id: Option<Uuid>,
    description: String,
    severity: String,
    occurred_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// Accident log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccidentLog {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub description: String,
    pub severity: Severity,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccidentRow> for AccidentLog {
    type Error = DbError;

    fn try_from(row: AccidentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            description: row.description,
            severity: parse_column("accident_logs", &row.severity)?,
            occurred_at: row.occurred_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub description: Description,
    pub cost: Cost,
    /// Defaults to now
    pub performed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAccident {
    pub description: Description,
    pub severity: Severity,
    pub driver_id: Option<Uuid>,
    /// Defaults to now
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Repository for both vehicle log kinds
pub struct LogRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LogRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add_maintenance(
        &self,
        vehicle_id: Uuid,
        new: NewMaintenance,
    ) -> Result<MaintenanceLog, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_vehicle(&mut *conn, vehicle_id).await?;

        let now = Utc::now();
        let entry: MaintenanceLog = sqlx::query_as(
            r#"
            INSERT INTO maintenance_logs (id, vehicle_id, description, cost, performed_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, vehicle_id, description, cost, performed_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle_id)
        .bind(new.description.as_str())
        .bind(new.cost.value())
        .bind(new.performed_at.unwrap_or(now))
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::info!(vehicle_id = %vehicle_id, cost = entry.cost, "maintenance logged");
        Ok(entry)
    }

    pub async fn list_maintenance(
        &self,
        vehicle_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<MaintenanceLog>, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_vehicle(&mut *conn, vehicle_id).await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_logs WHERE vehicle_id = ?1")
                .bind(vehicle_id)
                .fetch_one(&mut *conn)
                .await?;

        let items: Vec<MaintenanceLog> = sqlx::query_as(
            r#"
            SELECT id, vehicle_id, description, cost, performed_at, created_at
            FROM maintenance_logs
            WHERE vehicle_id = ?1
            ORDER BY performed_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(vehicle_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok(page.wrap(items, total))
    }

    pub async fn add_accident(
        &self,
        vehicle_id: Uuid,
        new: NewAccident,
    ) -> Result<AccidentLog, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_vehicle(&mut *conn, vehicle_id).await?;
        if let Some(driver_id) = new.driver_id {
            users::ensure_role(&mut *conn, driver_id, "driver_id", UserRole::Driver).await?;
        }

        let now = Utc::now();
        let row: AccidentRow = sqlx::query_as(
            r#"
            INSERT INTO accident_logs
                (id, vehicle_id, driver_id, description, severity, occurred_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, vehicle_id, driver_id, description, severity, occurred_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle_id)
        .bind(new.driver_id)
        .bind(new.description.as_str())
        .bind(new.severity.as_str())
        .bind(new.occurred_at.unwrap_or(now))
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        let entry = AccidentLog::try_from(row)?;
        tracing::warn!(
            vehicle_id = %vehicle_id,
            severity = %entry.severity,
            "accident reported"
        );
        Ok(entry)
    }

    pub async fn list_accidents(
        &self,
        vehicle_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<AccidentLog>, DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_vehicle(&mut *conn, vehicle_id).await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accident_logs WHERE vehicle_id = ?1")
                .bind(vehicle_id)
                .fetch_one(&mut *conn)
                .await?;

        let rows: Vec<AccidentRow> = sqlx::query_as(
            r#"
            SELECT id, vehicle_id, driver_id, description, severity, occurred_at, created_at
            FROM accident_logs
            WHERE vehicle_id = ?1
            ORDER BY occurred_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(vehicle_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        let items = rows
            .into_iter()
            .map(AccidentLog::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }
}

async fn ensure_vehicle(conn: &mut SqliteConnection, id: Uuid) -> Result<(), DbError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = ?1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(DbError::not_found("vehicle", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{testing, VehicleRepo};

    fn service(text: &str, cost: f64) -> NewMaintenance {
        NewMaintenance {
            description: Description::new("description", text).unwrap(),
            cost: Cost::new(cost).unwrap(),
            performed_at: None,
        }
    }

    #[tokio::test]
    async fn maintenance_for_missing_vehicle_is_not_found() {
        let pool = testing::pool().await;
        let err = LogRepo::new(&pool)
            .add_maintenance(Uuid::new_v4(), service("oil change", 80.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "vehicle", .. }));
    }

    #[tokio::test]
    async fn logs_are_listed_per_vehicle() {
        let pool = testing::pool().await;
        let van = testing::vehicle(&pool, "VAN-1", 1200.0).await;
        let truck = testing::vehicle(&pool, "TRK-1", 8000.0).await;
        let repo = LogRepo::new(&pool);

        repo.add_maintenance(van.id, service("oil change", 80.0)).await.unwrap();
        repo.add_maintenance(van.id, service("brake pads", 240.0)).await.unwrap();
        repo.add_maintenance(truck.id, service("tyres", 900.0)).await.unwrap();

        let van_logs = repo.list_maintenance(van.id, Pagination::default()).await.unwrap();
        assert_eq!(van_logs.total, 2);
        assert!(van_logs.items.iter().all(|l| l.vehicle_id == van.id));
    }

    #[tokio::test]
    async fn accident_logs_cascade_with_vehicle() {
        let pool = testing::pool().await;
        let van = testing::vehicle(&pool, "VAN-2", 1200.0).await;
        let repo = LogRepo::new(&pool);

        let entry = repo
            .add_accident(
                van.id,
                NewAccident {
                    description: Description::new("description", "scraped a bollard").unwrap(),
                    severity: Severity::Minor,
                    driver_id: None,
                    occurred_at: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(entry.severity, Severity::Minor);

        VehicleRepo::new(&pool).delete(van.id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accident_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
