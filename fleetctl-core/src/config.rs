//! Configuration for the fleetctl server and CLI
//!
//! Loaded from `~/.fleetctl/config.toml`. Every section is optional and
//! falls back to defaults, so a missing file is not an error. Environment
//! variables override the file:
//!
//! | variable                 | overrides                  |
//! |--------------------------|----------------------------|
//! | `DATABASE_URL`           | `database.url`             |
//! | `FLEETCTL_BIND`          | `server.bind`              |
//! | `FLEETCTL_NOTIFICATIONS` | `notifications.enabled`    |
//! | `FLEETCTL_ENDPOINT`      | `client.endpoint`          |

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Coordinates;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file (invalid TOML): {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub tracking: TrackingSection,
    pub notifications: NotificationSection,
    pub client: ClientSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to
    pub bind: String,
    /// Allow any origin (default: localhost only)
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3030".to_string(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// sqlx connection string, e.g. `sqlite://fleet.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let path = FleetConfig::home_dir().join("fleetctl.db");
        Self {
            url: format!("sqlite://{}", path.display()),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSection {
    /// Maximum per-axis movement per tracking poll, in degrees
    pub jitter_degrees: f64,
    /// Start position for trips without an assigned vehicle
    pub depot_lat: f64,
    pub depot_lng: f64,
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            jitter_degrees: 0.01,
            depot_lat: 51.5072,
            depot_lng: -0.1276,
        }
    }
}

impl TrackingSection {
    pub fn depot(&self) -> Result<Coordinates, ConfigError> {
        Coordinates::new(self.depot_lat, self.depot_lng)
            .map_err(|e| ConfigError::Invalid(format!("tracking depot: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSection {
    pub enabled: bool,
    /// Sender shown on outgoing email
    pub email_from: String,
    /// Sender id shown on outgoing SMS
    pub sms_from: String,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            email_from: "dispatch@fleetctl.local".to_string(),
            sms_from: "FLEETCTL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Server the CLI talks to
    pub endpoint: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3030".to_string(),
        }
    }
}

impl FleetConfig {
    /// Load `~/.fleetctl/config.toml` (defaults if absent), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load a specific file without env overrides. Missing file → defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Config directory: ~/.fleetctl
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fleetctl")
    }

    /// Config file path: ~/.fleetctl/config.toml
    pub fn config_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Apply overrides from a variable lookup (normally the process env).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(bind) = lookup("FLEETCTL_BIND") {
            self.server.bind = bind;
        }
        if let Some(flag) = lookup("FLEETCTL_NOTIFICATIONS") {
            self.notifications.enabled = parse_flag(&flag);
        }
        if let Some(endpoint) = lookup("FLEETCTL_ENDPOINT") {
            self.client.endpoint = endpoint;
        }
    }

    /// Check values that serde can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        self.tracking.depot()?;

        let jitter = self.tracking.jitter_degrees;
        if !jitter.is_finite() || !(0.0..=1.0).contains(&jitter) {
            return Err(ConfigError::Invalid(format!(
                "tracking.jitter_degrees must be between 0 and 1, got {jitter}"
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind: '{}'", self.server.bind)))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = FleetConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, FleetConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [server]
            bind = "0.0.0.0:8080"

            [tracking]
            jitter_degrees = 0.002
            "#,
        )
        .unwrap();

        let config = FleetConfig::load_from(&path).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(!config.server.cors_permissive);
        assert_eq!(config.tracking.jitter_degrees, 0.002);
        assert_eq!(config.tracking.depot_lat, 51.5072);
        assert!(config.notifications.enabled);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nbind = 1").unwrap();
        assert!(matches!(
            FleetConfig::load_from(&path).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn env_overrides_file() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite::memory:"),
            ("FLEETCTL_BIND", "127.0.0.1:9999"),
            ("FLEETCTL_NOTIFICATIONS", "off"),
        ]
        .into_iter()
        .collect();

        let mut config = FleetConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.bind_addr().unwrap().port(), 9999);
        assert!(!config.notifications.enabled);
        assert_eq!(config.client.endpoint, "http://127.0.0.1:3030");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = FleetConfig::default();
        config.server.bind = "not an address".into();
        assert!(config.validate().is_err());

        let mut config = FleetConfig::default();
        config.tracking.depot_lat = 123.0;
        assert!(config.validate().is_err());

        let mut config = FleetConfig::default();
        config.tracking.jitter_degrees = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = FleetConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: FleetConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag(" no "));
    }
}
