//! Admin dashboard aggregates

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use fleetctl_core::models::{OrderStatus, UserRole, VehicleStatus};
use serde::Serialize;
use sqlx::SqlitePool;

use super::{parse_column, DbError, Order, OrderRepo};

const RECENT_ORDERS: i64 = 5;
const ACCIDENT_WINDOW_DAYS: i64 = 30;

/// Fleet-wide counts. Every status/role appears, zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub orders_by_status: BTreeMap<OrderStatus, i64>,
    pub vehicles_by_status: BTreeMap<VehicleStatus, i64>,
    pub users_by_role: BTreeMap<UserRole, i64>,
    pub total_orders: i64,
    pub total_vehicles: i64,
    pub accidents_last_30_days: i64,
    pub recent_orders: Vec<Order>,
}

pub struct DashboardRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DashboardRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self) -> Result<DashboardSummary, DbError> {
        let orders_by_status = self
            .grouped("orders", "status", OrderStatus::ALL)
            .await?;
        let vehicles_by_status = self
            .grouped("vehicles", "status", VehicleStatus::ALL)
            .await?;
        let users_by_role = self.grouped("users", "role", UserRole::ALL).await?;

        let since = Utc::now() - Duration::days(ACCIDENT_WINDOW_DAYS);
        let accidents_last_30_days: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accident_logs WHERE occurred_at >= ?1")
                .bind(since)
                .fetch_one(self.pool)
                .await?;

        let recent_orders = OrderRepo::new(self.pool).recent(RECENT_ORDERS).await?;

        Ok(DashboardSummary {
            total_orders: orders_by_status.values().sum(),
            total_vehicles: vehicles_by_status.values().sum(),
            orders_by_status,
            vehicles_by_status,
            users_by_role,
            accidents_last_30_days,
            recent_orders,
        })
    }

    /// `SELECT column, COUNT(*) ... GROUP BY column`, seeded with zero for
    /// every known variant.
    async fn grouped<T>(
        &self,
        table: &'static str,
        column: &str,
        all: &[T],
    ) -> Result<BTreeMap<T, i64>, DbError>
    where
        T: Copy + Ord + std::str::FromStr<Err = fleetctl_core::ValidationError>,
    {
        let sql = format!("SELECT {column}, COUNT(*) FROM {table} GROUP BY {column}");
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(self.pool).await?;

        let mut counts: BTreeMap<T, i64> = all.iter().map(|v| (*v, 0)).collect();
        for (value, count) in rows {
            counts.insert(parse_column(table, &value)?, count);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{testing, NewOrder};
    use fleetctl_core::models::{Address, Kilograms, Name};

    #[tokio::test]
    async fn empty_fleet_is_zero_filled() {
        let pool = testing::pool().await;
        let summary = DashboardRepo::new(&pool).summary().await.unwrap();

        assert_eq!(summary.orders_by_status.len(), OrderStatus::ALL.len());
        assert!(summary.orders_by_status.values().all(|n| *n == 0));
        assert_eq!(summary.vehicles_by_status[&VehicleStatus::Available], 0);
        assert_eq!(summary.total_orders, 0);
        assert!(summary.recent_orders.is_empty());
    }

    #[tokio::test]
    async fn counts_reflect_fleet() {
        let pool = testing::pool().await;
        let client = testing::user(&pool, "c@example.com", UserRole::Client).await;
        testing::user(&pool, "d@example.com", UserRole::Driver).await;
        testing::vehicle(&pool, "VAN-1", 1000.0).await;

        let repo = OrderRepo::new(&pool);
        for _ in 0..7 {
            repo.create(NewOrder {
                client_id: client.id,
                pickup_address: Address::new("pickup_address", "Depot").unwrap(),
                delivery_address: Address::new("delivery_address", "Home").unwrap(),
                recipient_name: Name::new("recipient_name", "Kim").unwrap(),
                recipient_phone: None,
                package_description: None,
                weight: Kilograms::new("weight_kg", 2.0).unwrap(),
                vehicle_id: None,
                driver_id: None,
            })
            .await
            .unwrap();
        }

        let summary = DashboardRepo::new(&pool).summary().await.unwrap();

        assert_eq!(summary.orders_by_status[&OrderStatus::Pending], 7);
        assert_eq!(summary.total_orders, 7);
        assert_eq!(summary.total_vehicles, 1);
        assert_eq!(summary.users_by_role[&UserRole::Driver], 1);
        assert_eq!(summary.recent_orders.len(), RECENT_ORDERS as usize);
    }
}
