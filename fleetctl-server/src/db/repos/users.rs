//! User repository
//!
//! Users are clients (who book orders), drivers (assigned to vehicles and
//! orders) and admins. Email is the natural key.

use chrono::{DateTime, Utc};
use fleetctl_core::models::{Email, Name, Phone, UserRole};
use fleetctl_core::{Paginated, Pagination};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{parse_column, DbError};

const COLUMNS: &str = "id, name, email, phone, role, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// User record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: parse_column("users", &row.role)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Validated input for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Name,
    pub email: Email,
    pub phone: Option<Phone>,
    pub role: UserRole,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<Name>,
    pub email: Option<Email>,
    /// `Some(None)` clears the phone number
    pub phone: Option<Option<Phone>>,
    pub role: Option<UserRole>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.role.is_none()
    }
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. Duplicate email is a conflict.
    pub async fn create(&self, new: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, name, email, phone, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {COLUMNS}"
        );

        let row: UserRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(new.name.as_str())
            .bind(new.email.as_str())
            .bind(new.phone.as_ref().map(Phone::as_str))
            .bind(new.role.as_str())
            .bind(now)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::unique(e, format!("email '{}' is already registered", new.email.as_str())))?;

        let user = User::try_from(row)?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut *conn, id).await
    }

    /// List users, optionally filtered by role, newest first.
    pub async fn list(
        &self,
        role: Option<UserRole>,
        page: Pagination,
    ) -> Result<Paginated<User>, DbError> {
        let role = role.map(UserRole::as_str);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE (?1 IS NULL OR role = ?1)",
        )
        .bind(role)
        .fetch_one(self.pool)
        .await?;

        let sql = format!(
            "SELECT {COLUMNS} FROM users
             WHERE (?1 IS NULL OR role = ?1)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2 OFFSET ?3"
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(role)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    /// Apply a partial update.
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;
        let current = fetch(&mut *tx, id).await?;

        let name = changes.name.map(Name::into_string).unwrap_or(current.name);
        let email = changes
            .email
            .map(|e| e.as_str().to_owned())
            .unwrap_or(current.email);
        let phone = match changes.phone {
            Some(phone) => phone.map(|p| p.as_str().to_owned()),
            None => current.phone,
        };
        let role = changes.role.unwrap_or(current.role);

        if role != current.role {
            let refs = references(&mut *tx, id).await?;
            if current.role == UserRole::Client && refs.client_orders > 0 {
                return Err(DbError::Conflict(format!(
                    "user has {} order(s) as client; role can't change",
                    refs.client_orders
                )));
            }
            if current.role == UserRole::Driver && (refs.driver_orders > 0 || refs.vehicles > 0) {
                return Err(DbError::Conflict(format!(
                    "user drives {} order(s) and {} vehicle(s); role can't change",
                    refs.driver_orders, refs.vehicles
                )));
            }
        }

        let sql = format!(
            "UPDATE users SET name = ?2, email = ?3, phone = ?4, role = ?5, updated_at = ?6
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(&name)
            .bind(&email)
            .bind(phone.as_deref())
            .bind(role.as_str())
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DbError::unique(e, format!("email '{email}' is already registered")))?;

        tx.commit().await?;
        User::try_from(row)
    }

    /// Delete a user. Users referenced by orders, as client or driver,
    /// can't be deleted.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        fetch(&mut *tx, id).await?;

        let refs = references(&mut *tx, id).await?;
        let orders = refs.client_orders + refs.driver_orders;
        if orders > 0 {
            return Err(DbError::Conflict(format!("user is referenced by {orders} order(s)")));
        }

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

/// Rows that point at a user in a role-specific way
#[derive(Debug, Clone, Copy, Default)]
struct References {
    client_orders: i64,
    driver_orders: i64,
    vehicles: i64,
}

async fn references(conn: &mut SqliteConnection, id: Uuid) -> Result<References, DbError> {
    let (client_orders, driver_orders, vehicles): (i64, i64, i64) = sqlx::query_as(
        "SELECT
             (SELECT COUNT(*) FROM orders WHERE client_id = ?1),
             (SELECT COUNT(*) FROM orders WHERE driver_id = ?1),
             (SELECT COUNT(*) FROM vehicles WHERE driver_id = ?1)",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(References {
        client_orders,
        driver_orders,
        vehicles,
    })
}

/// Load a user on an open connection or transaction.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> Result<User, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
    let row: UserRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))?;

    User::try_from(row)
}

/// Ensure `id` refers to a user with `role`.
pub(crate) async fn ensure_role(
    conn: &mut SqliteConnection,
    id: Uuid,
    field: &'static str,
    role: UserRole,
) -> Result<User, DbError> {
    let user = fetch(conn, id).await?;
    if user.role != role {
        return Err(fleetctl_core::ValidationError::InvalidVariant {
            field,
            value: format!("{} (user is a {}, expected {})", id, user.role, role),
        }
        .into());
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{testing, NewOrder, OrderRepo, VehicleChanges, VehicleRepo};
    use fleetctl_core::models::{Address, Kilograms};

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            name: Name::new("name", "Priya Raman").unwrap(),
            email: Email::new(email).unwrap(),
            phone: Some(Phone::new("phone", "+44 20 7946 0958").unwrap()),
            role,
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let pool = testing::pool().await;
        let repo = UserRepo::new(&pool);

        let created = repo.create(new_user("priya@example.com", UserRole::Client)).await.unwrap();
        let fetched = repo.get(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.phone.as_deref(), Some("+442079460958"));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let pool = testing::pool().await;
        let repo = UserRepo::new(&pool);

        repo.create(new_user("dup@example.com", UserRole::Client)).await.unwrap();
        let err = repo.create(new_user("DUP@example.com", UserRole::Driver)).await.unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_filters_by_role() {
        let pool = testing::pool().await;
        let repo = UserRepo::new(&pool);

        repo.create(new_user("a@example.com", UserRole::Client)).await.unwrap();
        repo.create(new_user("b@example.com", UserRole::Driver)).await.unwrap();
        repo.create(new_user("c@example.com", UserRole::Driver)).await.unwrap();

        let drivers = repo.list(Some(UserRole::Driver), Pagination::default()).await.unwrap();
        assert_eq!(drivers.total, 2);
        assert!(drivers.items.iter().all(|u| u.role == UserRole::Driver));

        let everyone = repo.list(None, Pagination::new(1, 2)).await.unwrap();
        assert_eq!(everyone.total, 3);
        assert_eq!(everyone.items.len(), 2);
    }

    #[tokio::test]
    async fn update_clears_phone() {
        let pool = testing::pool().await;
        let repo = UserRepo::new(&pool);
        let user = repo.create(new_user("p@example.com", UserRole::Client)).await.unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    phone: Some(None),
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.phone, None);
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.email, "p@example.com");
    }

    fn booking(client_id: Uuid, driver_id: Option<Uuid>) -> NewOrder {
        NewOrder {
            client_id,
            pickup_address: Address::new("pickup_address", "1 Warehouse Way").unwrap(),
            delivery_address: Address::new("delivery_address", "42 Elm Street").unwrap(),
            recipient_name: Name::new("recipient_name", "Sam Doe").unwrap(),
            recipient_phone: None,
            package_description: None,
            weight: Kilograms::new("weight_kg", 3.0).unwrap(),
            vehicle_id: None,
            driver_id,
        }
    }

    fn role_change(role: UserRole) -> UserChanges {
        UserChanges {
            role: Some(role),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn client_with_orders_cannot_be_deleted() {
        let pool = testing::pool().await;
        let client = testing::user(&pool, "owner@example.com", UserRole::Client).await;
        OrderRepo::new(&pool).create(booking(client.id, None)).await.unwrap();

        let err = UserRepo::new(&pool).delete(client.id).await.unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
        assert!(UserRepo::new(&pool).get(client.id).await.is_ok());
    }

    #[tokio::test]
    async fn assigned_driver_cannot_be_deleted() {
        let pool = testing::pool().await;
        let client = testing::user(&pool, "c@example.com", UserRole::Client).await;
        let driver = testing::user(&pool, "d@example.com", UserRole::Driver).await;
        let order = OrderRepo::new(&pool)
            .create(booking(client.id, Some(driver.id)))
            .await
            .unwrap();

        let err = UserRepo::new(&pool).delete(driver.id).await.unwrap_err();

        assert!(matches!(err, DbError::Conflict(_)));
        let order = OrderRepo::new(&pool).get(order.id).await.unwrap();
        assert_eq!(order.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn unreferenced_user_is_deleted() {
        let pool = testing::pool().await;
        let user = testing::user(&pool, "gone@example.com", UserRole::Client).await;
        let repo = UserRepo::new(&pool);

        repo.delete(user.id).await.unwrap();

        assert!(matches!(
            repo.get(user.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn role_locked_while_referenced() {
        let pool = testing::pool().await;
        let client = testing::user(&pool, "c@example.com", UserRole::Client).await;
        let driver = testing::user(&pool, "d@example.com", UserRole::Driver).await;
        let repo = UserRepo::new(&pool);
        OrderRepo::new(&pool)
            .create(booking(client.id, Some(driver.id)))
            .await
            .unwrap();

        let err = repo.update(client.id, role_change(UserRole::Driver)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let err = repo.update(driver.id, role_change(UserRole::Client)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        assert_eq!(repo.get(client.id).await.unwrap().role, UserRole::Client);
        assert_eq!(repo.get(driver.id).await.unwrap().role, UserRole::Driver);
    }

    #[tokio::test]
    async fn vehicle_driver_role_locked() {
        let pool = testing::pool().await;
        let driver = testing::user(&pool, "d@example.com", UserRole::Driver).await;
        let van = testing::vehicle(&pool, "VAN-7", 1000.0).await;
        VehicleRepo::new(&pool)
            .update(
                van.id,
                VehicleChanges {
                    driver_id: Some(Some(driver.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = UserRepo::new(&pool)
            .update(driver.id, role_change(UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let pool = testing::pool().await;
        let err = UserRepo::new(&pool).delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }
}
