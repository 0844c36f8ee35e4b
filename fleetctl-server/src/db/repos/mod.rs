//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows these patterns:
//! - Rely on UNIQUE constraints for natural keys, map violations to conflicts
//! - Check references explicitly before deletes and role changes
//! - Transactions for multi-step operations (status transitions, assignment)
//! - Rows are decoded into String-typed records, then parsed into domain enums

pub mod dashboard;
pub mod logs;
pub mod notifications;
pub mod orders;
pub mod users;
pub mod vehicles;

pub use dashboard::{DashboardRepo, DashboardSummary};
pub use logs::{AccidentLog, LogRepo, MaintenanceLog, NewAccident, NewMaintenance};
pub use notifications::{Notification, NotificationFilter, NotificationRepo};
pub use orders::{Assignment, NewOrder, Order, OrderFilter, OrderPatch, OrderRepo, StatusChange};
pub use users::{NewUser, User, UserChanges, UserRepo};
pub use vehicles::{NewVehicle, Vehicle, VehicleChanges, VehicleRepo};

use fleetctl_core::{LifecycleError, ValidationError};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("unreadable row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Map UNIQUE violations to `Conflict(message)`, everything else to `Sqlx`.
    pub(crate) fn unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(message.into()),
            _ => Self::Sqlx(err),
        }
    }
}

/// Parse a TEXT column into a domain enum, reporting the table on failure.
pub(crate) fn parse_column<T>(table: &'static str, value: &str) -> Result<T, DbError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    value.parse().map_err(|e: ValidationError| DbError::Corrupt {
        table,
        reason: e.to_string(),
    })
}
