//! HTTP client helpers shared by the API commands
//!
//! Every command talks to a running `fleetctl serve` through its JSON API
//! and unwraps the `{success, data}` envelope.

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use fleetctl_core::{FleetConfig, Paginated};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection flags shared by every API command
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// API endpoint (default from config: http://127.0.0.1:3030)
    #[arg(long, env = "FLEETCTL_ENDPOINT", global = true)]
    pub endpoint: Option<String>,
}

impl ApiArgs {
    /// Priority: flag/env > config.toml > default
    pub fn endpoint(&self) -> String {
        let endpoint = match &self.endpoint {
            Some(ep) => ep.clone(),
            None => FleetConfig::load()
                .map(|c| c.client.endpoint)
                .unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "config unavailable, using default endpoint");
                    FleetConfig::default().client.endpoint
                }),
        };
        endpoint.trim_end_matches('/').to_owned()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (for piping to jq)
    Json,
    /// Quiet mode - IDs only
    Quiet,
}

pub fn get_output_format(output: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        OutputFormat::Json
    } else {
        output
    }
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("fleetctl/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Unwrap a success envelope or turn an error envelope into an error.
pub async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        let envelope: Envelope<T> = response.json().await.context("Failed to parse response")?;
        Ok(envelope.data)
    } else {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&error_text) {
            Err(anyhow!("{} ({}): {}", status, error_resp.error, error_resp.message))
        } else {
            Err(anyhow!("{}: {}", status, error_text))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Order fields the CLI shows
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub client_id: Uuid,
    pub pickup_address: String,
    pub delivery_address: String,
    pub recipient_name: String,
    pub weight_kg: f64,
    pub status: String,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub location: Option<Location>,
    pub updated_at: String,
}

/// Footer under a list table when more pages follow.
pub fn more_pages<T>(page: &Paginated<T>) -> Option<String> {
    page.has_next().then(|| {
        format!(
            "   page {} of {}; --page {} for more",
            page.page,
            page.total_pages(),
            page.page + 1
        )
    })
}

/// Append `key=value` pairs with encoded values, skipping `None`.
pub fn with_query(mut url: String, params: &[(&str, Option<String>)]) -> String {
    let mut sep = if url.contains('?') { '&' } else { '?' };
    for (key, value) in params {
        if let Some(value) = value {
            url.push(sep);
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            sep = '&';
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetctl_core::Pagination;

    #[test]
    fn query_skips_missing_values() {
        let url = with_query(
            "http://x/api/orders".into(),
            &[
                ("status", Some("in_transit".into())),
                ("client_id", None),
                ("page", Some("2".into())),
            ],
        );
        assert_eq!(url, "http://x/api/orders?status=in_transit&page=2");
    }

    #[test]
    fn query_encodes_values() {
        let url = with_query("http://x/a?b=1".into(), &[("q", Some("a b&c".into()))]);
        assert_eq!(url, "http://x/a?b=1&q=a%20b%26c");
    }

    #[test]
    fn footer_only_when_more_pages() {
        let first = Pagination::new(1, 20).wrap(vec![(); 20], 41);
        assert_eq!(
            more_pages(&first).as_deref(),
            Some("   page 1 of 3; --page 2 for more")
        );

        let last = Pagination::new(3, 20).wrap(vec![()], 41);
        assert_eq!(more_pages(&last), None);
    }

    #[test]
    fn json_flag_wins() {
        assert_eq!(get_output_format(OutputFormat::Human, true), OutputFormat::Json);
        assert_eq!(get_output_format(OutputFormat::Quiet, false), OutputFormat::Quiet);
    }
}
