//! Vehicle plate number validation
//!
//! Plates are the natural key for vehicles, so they are normalized to
//! uppercase before the uniqueness constraint sees them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::ValidationError;

/// Maximum length for plate numbers
const MAX_PLATE_LEN: usize = 12;

/// Uppercase alphanumeric with dashes, starting alphanumeric, 2-12 chars
static PLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9][A-Z0-9-]{1,11}$").expect("invalid plate regex")
});

/// Validated plate number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlateNumber(String);

impl PlateNumber {
    /// Create a plate number.
    ///
    /// Inner spaces are replaced by dashes so `"ab 123"` and `"AB-123"`
    /// collide on the unique index.
    ///
    /// # Example
    /// ```
    /// use fleetctl_core::models::PlateNumber;
    ///
    /// assert_eq!(PlateNumber::new("ab 123").unwrap().as_str(), "AB-123");
    /// assert!(PlateNumber::new("-AB").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_uppercase().replace(' ', "-");

        if normalized.is_empty() {
            return Err(ValidationError::Empty {
                field: "plate_number",
            });
        }

        if normalized.len() > MAX_PLATE_LEN {
            return Err(ValidationError::TooLong {
                field: "plate_number",
                max: MAX_PLATE_LEN,
            });
        }

        if !PLATE_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "plate_number",
                reason: "must be 2-12 letters, digits or dashes, starting with a letter or digit",
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlateNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_plates() {
        assert!(PlateNumber::new("KA01AB1234").is_ok());
        assert!(PlateNumber::new("xy-99").is_ok());
        assert!(PlateNumber::new("7A").is_ok());
    }

    #[test]
    fn rejects_bad_plates() {
        assert!(matches!(
            PlateNumber::new("").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(matches!(
            PlateNumber::new("A").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
        assert!(matches!(
            PlateNumber::new("ABCDEFGHIJKLM").unwrap_err(),
            ValidationError::TooLong { max: 12, .. }
        ));
        assert!(PlateNumber::new("AB_12").is_err());
    }
}
