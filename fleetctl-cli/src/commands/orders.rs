//! Order commands: list, show, create, status, assign
//!
//! ```bash
//! fleetctl orders create --client <uuid> --pickup "Depot" --deliver "1 High St" \
//!     --recipient "Sam" --weight 4.5
//! fleetctl orders status <order-id> in_transit
//! fleetctl orders list --status pending --json | jq '.[].id'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use fleetctl_core::notify::short_id;
use fleetctl_core::Paginated;

use super::client::{
    build_client, get_output_format, handle_response, more_pages, with_query, ApiArgs, OrderView,
    OutputFormat,
};

#[derive(Parser, Debug)]
pub struct OrdersArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: OrdersCommands,
}

#[derive(Subcommand, Debug)]
pub enum OrdersCommands {
    /// List orders
    List(ListArgs),
    /// Show one order
    Show(ShowArgs),
    /// Book a new order
    Create(CreateArgs),
    /// Move an order to a new status
    Status(StatusArgs),
    /// Assign or unassign a vehicle and driver
    Assign(AssignArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Filter by status (pending, received, in_transit, delivered, rejected)
    #[arg(long)]
    pub status: Option<String>,

    /// Filter by client
    #[arg(long)]
    pub client: Option<Uuid>,

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

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Order ID
    pub id: Uuid,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Client user ID
    #[arg(long)]
    pub client: Uuid,

    /// Pickup address
    #[arg(long)]
    pub pickup: String,

    /// Delivery address
    #[arg(long)]
    pub deliver: String,

    /// Recipient name
    #[arg(long)]
    pub recipient: String,

    /// Recipient phone
    #[arg(long)]
    pub recipient_phone: Option<String>,

    /// Package description
    #[arg(long, short)]
    pub description: Option<String>,

    /// Package weight in kg
    #[arg(long)]
    pub weight: f64,

    /// Vehicle to assign
    #[arg(long)]
    pub vehicle: Option<Uuid>,

    /// Driver to assign
    #[arg(long)]
    pub driver: Option<Uuid>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Order ID
    pub id: Uuid,

    /// New status (received, in_transit, delivered, rejected)
    pub status: String,

    /// Rejection reason
    #[arg(long)]
    pub reason: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct AssignArgs {
    /// Order ID
    pub id: Uuid,

    /// Vehicle to assign
    #[arg(long, conflicts_with = "no_vehicle")]
    pub vehicle: Option<Uuid>,

    /// Remove the assigned vehicle
    #[arg(long)]
    pub no_vehicle: bool,

    /// Driver to assign
    #[arg(long, conflicts_with = "no_driver")]
    pub driver: Option<Uuid>,

    /// Remove the assigned driver
    #[arg(long)]
    pub no_driver: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AssignArgs {
    /// PATCH body; `null` unassigns, absent keys stay unchanged.
    fn body(&self) -> Value {
        let mut body = Map::new();
        if let Some(vehicle) = self.vehicle {
            body.insert("vehicle_id".into(), json!(vehicle));
        } else if self.no_vehicle {
            body.insert("vehicle_id".into(), Value::Null);
        }
        if let Some(driver) = self.driver {
            body.insert("driver_id".into(), json!(driver));
        } else if self.no_driver {
            body.insert("driver_id".into(), Value::Null);
        }
        Value::Object(body)
    }
}

pub async fn run_orders(args: OrdersArgs) -> Result<()> {
    let endpoint = args.api.endpoint();

    match args.command {
        OrdersCommands::List(list_args) => run_list(&endpoint, list_args).await,
        OrdersCommands::Show(show_args) => run_show(&endpoint, show_args).await,
        OrdersCommands::Create(create_args) => run_create(&endpoint, create_args).await,
        OrdersCommands::Status(status_args) => run_status(&endpoint, status_args).await,
        OrdersCommands::Assign(assign_args) => run_assign(&endpoint, assign_args).await,
    }
}

async fn run_list(endpoint: &str, args: ListArgs) -> Result<()> {
    let client = build_client()?;
    let format = get_output_format(args.output, args.json);

    let url = with_query(
        format!("{endpoint}/api/orders"),
        &[
            ("status", args.status),
            ("client_id", args.client.map(|c| c.to_string())),
            ("page", Some(args.page.to_string())),
            ("per_page", Some(args.per_page.to_string())),
        ],
    );

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let page: Paginated<OrderView> = handle_response(response).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.items)?),
        OutputFormat::Quiet => {
            for order in &page.items {
                println!("{}", order.id);
            }
        }
        OutputFormat::Human => {
            println!("┌─ orders (page {}, {} total)", page.page, page.total);
            if page.items.is_empty() {
                println!("└─ (no orders)");
            }
            for (i, order) in page.items.iter().enumerate() {
                let prefix = if i + 1 == page.items.len() { "└─" } else { "├─" };
                println!(
                    "{} {}  {:<10}  {:>8.1} kg  → {}",
                    prefix,
                    short_id(order.id),
                    order.status,
                    order.weight_kg,
                    order.delivery_address
                );
            }
            if let Some(footer) = more_pages(&page) {
                println!("{footer}");
            }
        }
    }

    Ok(())
}

async fn run_show(endpoint: &str, args: ShowArgs) -> Result<()> {
    let client = build_client()?;
    let response = client
        .get(format!("{endpoint}/api/orders/{}", args.id))
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let order: OrderView = handle_response(response).await?;

    print_order(&order, args.json)
}

async fn run_create(endpoint: &str, args: CreateArgs) -> Result<()> {
    let client = build_client()?;
    let body = json!({
        "client_id": args.client,
        "pickup_address": args.pickup,
        "delivery_address": args.deliver,
        "recipient_name": args.recipient,
        "recipient_phone": args.recipient_phone,
        "package_description": args.description,
        "weight_kg": args.weight,
        "vehicle_id": args.vehicle,
        "driver_id": args.driver,
    });

    let response = client
        .post(format!("{endpoint}/api/orders"))
        .json(&body)
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let order: OrderView = handle_response(response).await?;

    if !args.json {
        println!("✓ Order {} booked", short_id(order.id));
    }
    print_order(&order, args.json)
}

async fn run_status(endpoint: &str, args: StatusArgs) -> Result<()> {
    let client = build_client()?;
    let body = json!({ "status": args.status, "reason": args.reason });

    let response = client
        .patch(format!("{endpoint}/api/orders/{}", args.id))
        .json(&body)
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let order: OrderView = handle_response(response).await?;

    if !args.json {
        println!("✓ Order {} is now {}", short_id(order.id), order.status);
    }
    print_order(&order, args.json)
}

async fn run_assign(endpoint: &str, args: AssignArgs) -> Result<()> {
    let body = args.body();
    if body.as_object().is_some_and(Map::is_empty) {
        anyhow::bail!("Nothing to assign. Use --vehicle, --driver, --no-vehicle or --no-driver");
    }

    let client = build_client()?;
    let response = client
        .patch(format!("{endpoint}/api/orders/{}", args.id))
        .json(&body)
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let order: OrderView = handle_response(response).await?;

    print_order(&order, args.json)
}

fn print_order(order: &OrderView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(order)?);
        return Ok(());
    }

    let none = || "-".to_string();
    println!("┌─ order {}", order.id);
    println!("│  status:    {}", order.status);
    println!("│  client:    {}", order.client_id);
    println!("│  pickup:    {}", order.pickup_address);
    println!("│  deliver:   {} ({})", order.delivery_address, order.recipient_name);
    println!("│  weight:    {} kg", order.weight_kg);
    println!("│  vehicle:   {}", order.vehicle_id.map_or_else(none, |v| v.to_string()));
    println!("│  driver:    {}", order.driver_id.map_or_else(none, |d| d.to_string()));
    if let Some(reason) = &order.rejection_reason {
        println!("│  rejected:  {reason}");
    }
    match order.location {
        Some(loc) => println!("└─ location:  {:.5}, {:.5}", loc.lat, loc.lng),
        None => println!("└─ location:  (not started)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_body_distinguishes_unassign() {
        let order = Uuid::new_v4().to_string();
        let vehicle = Uuid::new_v4();
        let vehicle_arg = vehicle.to_string();
        let args = AssignArgs::parse_from([
            "assign",
            order.as_str(),
            "--vehicle",
            vehicle_arg.as_str(),
            "--no-driver",
        ]);
        let body = args.body();

        assert_eq!(body["vehicle_id"], json!(vehicle));
        assert_eq!(body["driver_id"], Value::Null);
        assert!(body.as_object().unwrap().contains_key("driver_id"));
    }

    #[test]
    fn assign_without_flags_is_empty() {
        let order = Uuid::new_v4().to_string();
        let args = AssignArgs::parse_from(["assign", order.as_str()]);
        assert!(args.body().as_object().unwrap().is_empty());
    }
}
