//! Schema for the fleet tables
//!
//! Every statement is idempotent, so `run` is safe on every startup.

use sqlx::SqlitePool;

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BLOB PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT,
            role TEXT NOT NULL CHECK (role IN ('admin', 'client', 'driver')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "vehicles",
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id BLOB PRIMARY KEY NOT NULL,
            plate_number TEXT NOT NULL UNIQUE,
            model TEXT NOT NULL,
            capacity_kg REAL NOT NULL CHECK (capacity_kg > 0),
            status TEXT NOT NULL
                CHECK (status IN ('available', 'in_use', 'maintenance', 'out_of_service')),
            driver_id BLOB REFERENCES users(id) ON DELETE SET NULL,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "orders",
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id BLOB PRIMARY KEY NOT NULL,
            client_id BLOB NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
            pickup_address TEXT NOT NULL,
            delivery_address TEXT NOT NULL,
            recipient_name TEXT NOT NULL,
            recipient_phone TEXT,
            package_description TEXT,
            weight_kg REAL NOT NULL CHECK (weight_kg > 0),
            status TEXT NOT NULL
                CHECK (status IN ('pending', 'received', 'in_transit', 'delivered', 'rejected')),
            vehicle_id BLOB REFERENCES vehicles(id) ON DELETE SET NULL,
            driver_id BLOB REFERENCES users(id) ON DELETE SET NULL,
            rejection_reason TEXT,
            lat REAL,
            lng REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "maintenance_logs",
        r#"
        CREATE TABLE IF NOT EXISTS maintenance_logs (
            id BLOB PRIMARY KEY NOT NULL,
            vehicle_id BLOB NOT NULL REFERENCES vehicles(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            cost REAL NOT NULL CHECK (cost >= 0),
            performed_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "accident_logs",
        r#"
        CREATE TABLE IF NOT EXISTS accident_logs (
            id BLOB PRIMARY KEY NOT NULL,
            vehicle_id BLOB NOT NULL REFERENCES vehicles(id) ON DELETE CASCADE,
            driver_id BLOB REFERENCES users(id) ON DELETE SET NULL,
            description TEXT NOT NULL,
            severity TEXT NOT NULL CHECK (severity IN ('minor', 'major', 'critical')),
            occurred_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "notifications",
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id BLOB PRIMARY KEY NOT NULL,
            user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            order_id BLOB REFERENCES orders(id) ON DELETE SET NULL,
            channel TEXT NOT NULL CHECK (channel IN ('email', 'sms')),
            recipient TEXT NOT NULL,
            subject TEXT NOT NULL,
            message TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_orders_client ON orders(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)",
    "CREATE INDEX IF NOT EXISTS idx_orders_vehicle ON orders(vehicle_id)",
    "CREATE INDEX IF NOT EXISTS idx_vehicles_status ON vehicles(status)",
    "CREATE INDEX IF NOT EXISTS idx_maintenance_vehicle ON maintenance_logs(vehicle_id)",
    "CREATE INDEX IF NOT EXISTS idx_accidents_vehicle ON accident_logs(vehicle_id)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, read)",
];

/// Create tables and indexes that don't exist yet.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("running fleet migrations");

    let mut tx = pool.begin().await?;
    for (table, ddl) in SCHEMA {
        tracing::debug!(table, "ensuring table");
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    for ddl in INDEXES {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("fleet migrations complete");
    Ok(())
}
