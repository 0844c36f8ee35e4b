//! Vehicle commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetctl_core::Paginated;

use super::client::{
    build_client, get_output_format, handle_response, more_pages, with_query, ApiArgs, Location,
    OutputFormat,
};

#[derive(Parser, Debug)]
pub struct VehiclesArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: VehiclesCommands,
}

#[derive(Subcommand, Debug)]
pub enum VehiclesCommands {
    /// List vehicles
    List(ListArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Filter by status (available, in_use, maintenance, out_of_service)
    #[arg(long)]
    pub status: Option<String>,

    /// Page number
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Results per page (max 100)
    #[arg(long, default_value = "20")]
    pub per_page: u32,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, conflicts_with = "output")]
    pub json: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct VehicleView {
    id: Uuid,
    plate_number: String,
    model: String,
    capacity_kg: f64,
    status: String,
    driver_id: Option<Uuid>,
    location: Location,
}

pub async fn run_vehicles(args: VehiclesArgs) -> Result<()> {
    let endpoint = args.api.endpoint();

    match args.command {
        VehiclesCommands::List(list_args) => run_list(&endpoint, list_args).await,
    }
}

async fn run_list(endpoint: &str, args: ListArgs) -> Result<()> {
    let client = build_client()?;
    let format = get_output_format(args.output, args.json);

    let url = with_query(
        format!("{endpoint}/api/vehicles"),
        &[
            ("status", args.status),
            ("page", Some(args.page.to_string())),
            ("per_page", Some(args.per_page.to_string())),
        ],
    );

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let page: Paginated<VehicleView> = handle_response(response).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.items)?),
        OutputFormat::Quiet => {
            for vehicle in &page.items {
                println!("{}", vehicle.id);
            }
        }
        OutputFormat::Human => {
            println!("┌─ vehicles ({} total)", page.total);
            if page.items.is_empty() {
                println!("└─ (no vehicles)");
            }
            for (i, v) in page.items.iter().enumerate() {
                let prefix = if i + 1 == page.items.len() { "└─" } else { "├─" };
                println!(
                    "{} {:<12} {:<16} {:<14} {:>8.0} kg  @ {:.4}, {:.4}",
                    prefix,
                    v.plate_number,
                    v.model,
                    v.status,
                    v.capacity_kg,
                    v.location.lat,
                    v.location.lng
                );
            }
            if let Some(footer) = more_pages(&page) {
                println!("{footer}");
            }
        }
    }

    Ok(())
}
