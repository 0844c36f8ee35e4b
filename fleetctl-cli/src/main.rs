//! fleetctl CLI - delivery fleet backend and client
//!
//! - Run the HTTP server (`serve`, with the `server` feature)
//! - Manage `~/.fleetctl/config.toml` (`config`)
//! - Book and move orders through their lifecycle (`orders`)
//! - Inspect vehicles, live tracking and notifications

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(
    name = "fleetctl",
    author,
    version,
    about = "Delivery fleet backend: orders, vehicles, tracking and notifications"
)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    #[cfg(feature = "server")]
    Serve(commands::serve::ServeArgs),
    /// Manage fleetctl configuration (path, show, init)
    Config(config::ConfigArgs),
    /// Book, inspect and update orders
    Orders(commands::orders::OrdersArgs),
    /// List vehicles
    Vehicles(commands::vehicles::VehiclesArgs),
    /// Show the live position of an order
    Track(commands::track::TrackArgs),
    /// List and acknowledge notifications
    Notifications(commands::notifications::NotificationsArgs),
}

fn init_tracing(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug).ok();

    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Config(args) => config::run_config(args)?,
        Commands::Orders(args) => commands::run_orders(args).await?,
        Commands::Vehicles(args) => commands::run_vehicles(args).await?,
        Commands::Track(args) => commands::run_track(args).await?,
        Commands::Notifications(args) => commands::run_notifications(args).await?,
    }
    Ok(())
}
