//! Notification commands: list, read

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use fleetctl_core::notify::short_id;
use fleetctl_core::Paginated;

use super::client::{
    build_client, get_output_format, handle_response, more_pages, with_query, ApiArgs,
    OutputFormat,
};

#[derive(Parser, Debug)]
pub struct NotificationsArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: NotificationsCommands,
}

#[derive(Subcommand, Debug)]
pub enum NotificationsCommands {
    /// List notifications
    List(ListArgs),
    /// Mark a notification read, or all of a user's with --all
    Read(ReadArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only this user's notifications
    #[arg(long)]
    pub user: Option<Uuid>,

    /// Only this order's notifications
    #[arg(long)]
    pub order: Option<Uuid>,

    /// Only unread notifications
    #[arg(long)]
    pub unread: bool,

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
pub struct ReadArgs {
    /// Notification ID
    #[arg(required_unless_present = "all")]
    pub id: Option<Uuid>,

    /// Mark every notification of this user read
    #[arg(long, value_name = "USER_ID", conflicts_with = "id")]
    pub all: Option<Uuid>,

    /// Mark unread instead
    #[arg(long, conflicts_with = "all")]
    pub unread: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct NotificationView {
    id: Uuid,
    user_id: Uuid,
    order_id: Option<Uuid>,
    channel: String,
    recipient: String,
    subject: String,
    read: bool,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct ReadAllView {
    updated: u64,
}

pub async fn run_notifications(args: NotificationsArgs) -> Result<()> {
    let endpoint = args.api.endpoint();

    match args.command {
        NotificationsCommands::List(list_args) => run_list(&endpoint, list_args).await,
        NotificationsCommands::Read(read_args) => run_read(&endpoint, read_args).await,
    }
}

async fn run_list(endpoint: &str, args: ListArgs) -> Result<()> {
    let client = build_client()?;
    let format = get_output_format(args.output, args.json);

    let url = with_query(
        format!("{endpoint}/api/notifications"),
        &[
            ("user_id", args.user.map(|u| u.to_string())),
            ("order_id", args.order.map(|o| o.to_string())),
            ("unread", args.unread.then(|| "true".to_string())),
            ("page", Some(args.page.to_string())),
            ("per_page", Some(args.per_page.to_string())),
        ],
    );

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let page: Paginated<NotificationView> = handle_response(response).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.items)?),
        OutputFormat::Quiet => {
            for n in &page.items {
                println!("{}", n.id);
            }
        }
        OutputFormat::Human => {
            println!("┌─ notifications ({} total)", page.total);
            if page.items.is_empty() {
                println!("└─ (no notifications)");
            }
            for (i, n) in page.items.iter().enumerate() {
                let prefix = if i + 1 == page.items.len() { "└─" } else { "├─" };
                let status = if n.read { "[read]" } else { "[unread]" };
                println!(
                    "{} {} {} {:<5} → {}: {}",
                    prefix,
                    short_id(n.id),
                    status,
                    n.channel,
                    n.recipient,
                    n.subject
                );
            }
            if let Some(footer) = more_pages(&page) {
                println!("{footer}");
            }
        }
    }

    Ok(())
}

async fn run_read(endpoint: &str, args: ReadArgs) -> Result<()> {
    let client = build_client()?;

    if let Some(user_id) = args.all {
        let url = format!("{endpoint}/api/notifications/read-all?user_id={user_id}");
        let response = client
            .post(&url)
            .send()
            .await
            .context("Failed to connect to fleetctl API")?;
        let result: ReadAllView = handle_response(response).await?;
        println!("✓ Marked {} notification(s) read", result.updated);
        return Ok(());
    }

    let id = args
        .id
        .context("Notification ID required (or use --all <USER_ID>)")?;
    let response = client
        .patch(format!("{endpoint}/api/notifications/{id}"))
        .json(&json!({ "read": !args.unread }))
        .send()
        .await
        .context("Failed to connect to fleetctl API")?;
    let n: NotificationView = handle_response(response).await?;

    let state = if n.read { "read" } else { "unread" };
    println!("✓ Notification {} marked {}", short_id(n.id), state);
    Ok(())
}
