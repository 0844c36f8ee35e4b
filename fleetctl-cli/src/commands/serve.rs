//! HTTP server command
//!
//! Flags override `~/.fleetctl/config.toml` and the environment.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use fleetctl_core::FleetConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:3030)
    #[arg(long, short = 'b', env = "FLEETCTL_BIND")]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL, e.g. sqlite://fleet.db
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Don't store or send order notifications
    #[arg(long)]
    pub no_notifications: bool,
}

impl ServeArgs {
    fn apply(self, config: &mut FleetConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind.to_string();
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if self.no_notifications {
            config.notifications.enabled = false;
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = FleetConfig::load().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    tracing::info!("Starting fleetctl server on {}", config.server.bind);

    fleetctl_server::serve(&config)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = ServeArgs::parse_from([
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--database-url",
            "sqlite::memory:",
            "--no-notifications",
        ]);
        let mut config = FleetConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(!config.notifications.enabled);
        assert!(!config.server.cors_permissive);
    }
}
