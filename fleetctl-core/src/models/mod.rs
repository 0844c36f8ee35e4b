//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod text;
pub mod contact;
pub mod plate;
pub mod quantity;
pub mod kinds;
pub mod geo;

pub use validation::ValidationError;
pub use text::{Address, Description, Name};
pub use contact::{optional_phone, Email, Phone};
pub use plate::PlateNumber;
pub use quantity::{Cost, Kilograms, MAX_KILOGRAMS};
pub use kinds::{Channel, OrderStatus, Severity, UserRole, VehicleStatus};
pub use geo::Coordinates;
