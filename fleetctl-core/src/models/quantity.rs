//! Numeric quantities: weights, capacities, costs

use serde::Serialize;

use super::ValidationError;

/// Upper bound for any single load or vehicle capacity
pub const MAX_KILOGRAMS: f64 = 100_000.0;

/// Positive mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Kilograms(f64);

impl Kilograms {
    /// Create a mass for `field`.
    ///
    /// # Rules
    /// - Finite
    /// - Strictly positive
    /// - At most 100 000 kg
    pub fn new(field: &'static str, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 || value > MAX_KILOGRAMS {
            return Err(ValidationError::OutOfRange {
                field,
                min: 0.0,
                max: MAX_KILOGRAMS,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether this load fits a vehicle of `capacity`.
    pub fn fits_in(self, capacity: Kilograms) -> bool {
        self.0 <= capacity.0
    }
}

/// Non-negative monetary amount
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Cost(f64);

impl Cost {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "cost",
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kilograms_bounds() {
        assert!(Kilograms::new("weight_kg", 0.5).is_ok());
        assert!(Kilograms::new("weight_kg", MAX_KILOGRAMS).is_ok());
        assert!(Kilograms::new("weight_kg", 0.0).is_err());
        assert!(Kilograms::new("weight_kg", -1.0).is_err());
        assert!(Kilograms::new("weight_kg", f64::NAN).is_err());
        assert!(Kilograms::new("weight_kg", MAX_KILOGRAMS + 1.0).is_err());
    }

    #[test]
    fn fits_in_capacity() {
        let load = Kilograms::new("weight_kg", 750.0).unwrap();
        let van = Kilograms::new("capacity_kg", 1000.0).unwrap();
        let bike = Kilograms::new("capacity_kg", 20.0).unwrap();
        assert!(load.fits_in(van));
        assert!(!load.fits_in(bike));
    }

    #[test]
    fn cost_allows_zero() {
        assert!(Cost::new(0.0).is_ok());
        assert!(Cost::new(-0.01).is_err());
        assert!(Cost::new(f64::INFINITY).is_err());
    }
}
