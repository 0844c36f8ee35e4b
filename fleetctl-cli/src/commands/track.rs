//! Live tracking command
//!
//! Each poll of an in-transit order moves it a little; `--watch` keeps
//! polling until the order leaves transit or Ctrl+C.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetctl_core::notify::short_id;

use super::client::{build_client, handle_response, ApiArgs, Location};

#[derive(Parser, Debug)]
pub struct TrackArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Order ID
    pub id: Uuid,

    /// Keep polling every N seconds
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackingView {
    order_id: Uuid,
    status: String,
    location: Option<Location>,
    vehicle_plate: Option<String>,
    updated_at: String,
}

pub async fn run_track(args: TrackArgs) -> Result<()> {
    let endpoint = args.api.endpoint();
    let client = build_client()?;
    let url = format!("{endpoint}/api/clients/tracking/{}", args.id);

    loop {
        let response = client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to fleetctl API")?;
        let view: TrackingView = handle_response(response).await?;

        if args.json {
            println!("{}", serde_json::to_string(&view)?);
        } else {
            print_view(&view);
        }

        let Some(secs) = args.watch else { break };
        if view.status != "in_transit" {
            break;
        }
        tokio::time::sleep(Duration::from_secs(secs.max(1))).await;
    }

    Ok(())
}

fn print_view(view: &TrackingView) {
    let vehicle = view.vehicle_plate.as_deref().unwrap_or("no vehicle");
    match view.location {
        Some(loc) => println!(
            "{} [{}] {} @ {:.5}, {:.5} ({})",
            short_id(view.order_id),
            view.status,
            vehicle,
            loc.lat,
            loc.lng,
            view.updated_at
        ),
        None => println!(
            "{} [{}] {} - not on the road yet",
            short_id(view.order_id),
            view.status,
            vehicle
        ),
    }
}
