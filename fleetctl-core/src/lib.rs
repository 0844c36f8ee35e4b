//! fleetctl-core: domain layer for the fleetctl delivery backend
//!
//! - Validated field types (names, contacts, plates, quantities, coordinates)
//! - Order status lifecycle and its transition rules
//! - Notification templates for lifecycle events
//! - Layered configuration (`~/.fleetctl/config.toml` + env)

pub mod config;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod pagination;

pub use config::{ConfigError, FleetConfig};
pub use lifecycle::{LifecycleError, Transition};
pub use models::ValidationError;
pub use pagination::{Paginated, Pagination};
