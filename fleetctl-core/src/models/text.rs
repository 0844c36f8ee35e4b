//! Free-text fields: names, addresses, descriptions

use serde::Serialize;

use super::validation::{bounded_text, ValidationError};

/// Maximum length for person and model names
const MAX_NAME_LEN: usize = 120;

/// Maximum length for postal addresses
const MAX_ADDRESS_LEN: usize = 256;

/// Maximum length for descriptions and free-form notes
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Validated display name (user name, recipient, vehicle model)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Create a name for `field`.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 120 characters
    ///
    /// # Example
    /// ```
    /// use fleetctl_core::models::Name;
    ///
    /// assert!(Name::new("name", "Ada Lovelace").is_ok());
    /// assert!(Name::new("name", "   ").is_err());
    /// ```
    pub fn new(field: &'static str, s: &str) -> Result<Self, ValidationError> {
        bounded_text(field, s, MAX_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(field: &'static str, s: &str) -> Result<Self, ValidationError> {
        bounded_text(field, s, MAX_ADDRESS_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated free-form description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    pub fn new(field: &'static str, s: &str) -> Result<Self, ValidationError> {
        bounded_text(field, s, MAX_DESCRIPTION_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        let name = Name::new("name", "  Grace Hopper  ").unwrap();
        assert_eq!(name.as_str(), "Grace Hopper");
    }

    #[test]
    fn rejects_empty_with_field_name() {
        let err = Address::new("pickup_address", "").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "pickup_address" });
    }

    #[test]
    fn max_lengths() {
        assert!(Name::new("name", &"a".repeat(120)).is_ok());
        assert!(matches!(
            Name::new("name", &"a".repeat(121)).unwrap_err(),
            ValidationError::TooLong { max: 120, .. }
        ));

        assert!(Address::new("address", &"a".repeat(256)).is_ok());
        assert!(Address::new("address", &"a".repeat(257)).is_err());

        assert!(Description::new("description", &"a".repeat(2000)).is_ok());
        assert!(Description::new("description", &"a".repeat(2001)).is_err());
    }
}
