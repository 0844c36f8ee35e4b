//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use fleetctl_core::models::Coordinates;
use fleetctl_core::{ConfigError, FleetConfig};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::error::ServerError;
use crate::notify::{LogDispatcher, Notifier};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
        }
    }
}

impl ServerConfig {
    pub fn from_config(config: &FleetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: config.bind_addr()?,
            cors_permissive: config.server.cors_permissive,
        })
    }
}

/// Simulated tracking parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSettings {
    /// Max per-axis movement per poll, in degrees
    pub jitter_degrees: f64,
    /// Start position for trips with no vehicle
    pub depot: Coordinates,
}

impl TrackingSettings {
    pub fn from_config(config: &FleetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            jitter_degrees: config.tracking.jitter_degrees,
            depot: config.tracking.depot()?,
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub notifier: Notifier,
    pub tracking: TrackingSettings,
}

impl AppState {
    pub fn new(pool: SqlitePool, notifier: Notifier, tracking: TrackingSettings) -> Self {
        Self {
            pool,
            notifier,
            tracking,
        }
    }

    /// State with the log dispatcher and settings from `config`.
    pub fn from_config(pool: SqlitePool, config: &FleetConfig) -> Result<Self, ConfigError> {
        let notifier = Notifier::new(
            Arc::new(LogDispatcher::new(&config.notifications)),
            config.notifications.enabled,
        );
        Ok(Self::new(pool, notifier, TrackingSettings::from_config(config)?))
    }
}

/// Build the application router with all routes.
pub fn build_router(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let cors = if cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:3030"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:3030"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::users::router())
        .merge(routes::orders::router())
        .merge(routes::vehicles::router())
        .merge(routes::logs::router())
        .merge(routes::tracking::router())
        .merge(routes::notifications::router())
        .merge(routes::dashboard::router())
        .layer(middleware)
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url).await?;
/// let state = AppState::from_config(pool, &config)?;
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(Arc::new(state), config.cors_permissive);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn settings_follow_fleet_config() {
        let mut fleet = FleetConfig::default();
        fleet.server.bind = "0.0.0.0:8080".into();
        fleet.tracking.jitter_degrees = 0.002;

        let server = ServerConfig::from_config(&fleet).unwrap();
        assert_eq!(server.bind_addr.port(), 8080);

        let tracking = TrackingSettings::from_config(&fleet).unwrap();
        assert_eq!(tracking.jitter_degrees, 0.002);
        assert_eq!(tracking.depot, fleet.tracking.depot().unwrap());
    }
}
