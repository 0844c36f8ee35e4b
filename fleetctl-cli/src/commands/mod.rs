//! Command implementations for fleetctl CLI

pub mod client;
pub mod notifications;
pub mod orders;
#[cfg(feature = "server")]
pub mod serve;
pub mod track;
pub mod vehicles;

// Re-export main dispatcher functions for flat access from main.rs
pub use notifications::run_notifications;
pub use orders::run_orders;
#[cfg(feature = "server")]
pub use serve::run_serve;
pub use track::run_track;
pub use vehicles::run_vehicles;
