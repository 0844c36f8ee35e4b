//! Coordinates and simulated movement for live tracking

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// WGS84 point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    ///
    /// # Example
    /// ```
    /// use fleetctl_core::models::Coordinates;
    ///
    /// assert!(Coordinates::new(51.5072, -0.1276).is_ok());
    /// assert!(Coordinates::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::OutOfRange {
                field: "lat",
                min: -90.0,
                max: 90.0,
            });
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::OutOfRange {
                field: "lng",
                min: -180.0,
                max: 180.0,
            });
        }
        Ok(Self { lat, lng })
    }

    /// Build from a nullable column pair; both halves must be present.
    pub fn from_columns(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }

    /// Move each axis by a uniform offset in `[-max_delta, max_delta]`.
    ///
    /// The result is clamped to valid ranges so repeated polls near a pole
    /// or the antimeridian never produce an invalid point.
    pub fn jitter<R: Rng + ?Sized>(self, rng: &mut R, max_delta: f64) -> Self {
        let delta = max_delta.abs();
        if delta == 0.0 {
            return self;
        }

        let lat = self.lat + rng.gen_range(-delta..=delta);
        let lng = self.lng + rng.gen_range(-delta..=delta);

        Self {
            lat: lat.clamp(-90.0, 90.0),
            lng: lng.clamp(-180.0, 180.0),
        }
    }
}
