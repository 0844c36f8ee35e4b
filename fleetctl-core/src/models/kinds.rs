//! Closed sets of string values stored as TEXT and sent as snake_case JSON

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum.
macro_rules! string_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(ValidationError::InvalidVariant {
                        field: $field,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Delivery order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Received,
    InTransit,
    Delivered,
    Rejected,
}

string_enum!(OrderStatus, "status", {
    Pending => "pending",
    Received => "received",
    InTransit => "in_transit",
    Delivered => "delivered",
    Rejected => "rejected",
});

impl OrderStatus {
    /// Human label used in notification subjects.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Order placed",
            Self::Received => "Order received",
            Self::InTransit => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Rejected => "Rejected",
        }
    }
}

/// Vehicle availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
    OutOfService,
}

string_enum!(VehicleStatus, "vehicle status", {
    Available => "available",
    InUse => "in_use",
    Maintenance => "maintenance",
    OutOfService => "out_of_service",
});

impl VehicleStatus {
    /// Whether orders may be assigned to a vehicle in this state.
    pub fn is_assignable(self) -> bool {
        matches!(self, Self::Available | Self::InUse)
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Client,
    Driver,
}

string_enum!(UserRole, "role", {
    Admin => "admin",
    Client => "client",
    Driver => "driver",
});

/// Accident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

string_enum!(Severity, "severity", {
    Minor => "minor",
    Major => "major",
    Critical => "critical",
});

/// Notification delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

string_enum!(Channel, "channel", {
    Email => "email",
    Sms => "sms",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_variant() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        for status in VehicleStatus::ALL {
            assert_eq!(status.as_str().parse::<VehicleStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("IN_TRANSIT".parse::<OrderStatus>().unwrap(), OrderStatus::InTransit);
        assert_eq!(" Driver ".parse::<UserRole>().unwrap(), UserRole::Driver);
    }

    #[test]
    fn unknown_value_names_field() {
        let err = "parked".parse::<VehicleStatus>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidVariant {
                field: "vehicle status",
                value: "parked".into()
            }
        );
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
        let json = serde_json::to_string(&VehicleStatus::OutOfService).unwrap();
        assert_eq!(json, "\"out_of_service\"");
    }

    #[test]
    fn assignable_vehicle_states() {
        assert!(VehicleStatus::Available.is_assignable());
        assert!(VehicleStatus::InUse.is_assignable());
        assert!(!VehicleStatus::Maintenance.is_assignable());
        assert!(!VehicleStatus::OutOfService.is_assignable());
    }
}
