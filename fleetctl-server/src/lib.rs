//! fleetctl-server: HTTP backend for a small delivery fleet
//!
//! Orders with a status lifecycle, vehicles and their logs, users,
//! simulated tracking and email/SMS notifications, all over JSON.

pub mod db;
pub mod error;
pub mod http;
pub mod notify;

use std::path::Path;

use fleetctl_core::FleetConfig;

pub use error::{ServerError, ServerResult};
pub use http::{build_router, run_server, AppState, ServerConfig};

/// Connect, migrate and serve until shutdown.
pub async fn serve(config: &FleetConfig) -> ServerResult<()> {
    let server_config = ServerConfig::from_config(config)?;

    if let Some(parent) = database_dir(&config.database.url) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool =
        db::create_pool_with_options(&config.database.url, config.database.max_connections).await?;
    db::migrations::run(&pool).await?;

    let state = AppState::from_config(pool, config)?;
    tracing::info!(
        database = %config.database.url,
        notifications = state.notifier.is_enabled(),
        "fleetctl server starting"
    );

    run_server(state, server_config).await
}

/// Directory holding a file-backed SQLite database, if any.
fn database_dir(url: &str) -> Option<&Path> {
    if url.contains(":memory:") {
        return None;
    }
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path).parent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_dir_for_file_urls() {
        assert_eq!(
            database_dir("sqlite:///var/lib/fleet/fleet.db?mode=rwc"),
            Some(Path::new("/var/lib/fleet"))
        );
        assert_eq!(database_dir("sqlite::memory:"), None);
        assert_eq!(database_dir("postgres://localhost/x"), None);
    }
}
