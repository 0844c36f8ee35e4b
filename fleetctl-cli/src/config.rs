use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleetctl_core::FleetConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default config file
    Init(InitArgs),
    /// Print the effective config (file + environment) as TOML
    Show,
    /// Validate the effective config
    Validate,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Validate => run_validate(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = FleetConfig::config_path();
    write_default(&config_path, args.force)?;

    println!("✓ Config created at {}", config_path.display());
    println!("\nEdit it, or override with DATABASE_URL, FLEETCTL_BIND and FLEETCTL_ENDPOINT.");
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}\n\nUse --force to overwrite",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let toml = FleetConfig::default().to_toml()?;
    std::fs::write(path, toml).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn run_show() -> Result<()> {
    let config = FleetConfig::load().context("Failed to load config")?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn run_validate() -> Result<()> {
    let config = FleetConfig::load().context("Config is invalid")?;
    println!("✓ Config is valid");
    println!("  server:   {}", config.server.bind);
    println!("  database: {}", config.database.url);
    println!("  endpoint: {}", config.client.endpoint);
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", FleetConfig::config_path().display());
    Ok(())
}
