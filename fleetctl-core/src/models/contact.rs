//! Contact fields: email addresses and phone numbers

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::ValidationError;

/// RFC 5321 path limit
const MAX_EMAIL_LEN: usize = 254;

/// E.164 allows at most 15 digits
const MAX_PHONE_DIGITS: usize = 15;
const MIN_PHONE_DIGITS: usize = 7;

/// Pragmatic shape check: `local@domain.tld`, no whitespace
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

/// Validated email address, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create an email address.
    ///
    /// # Example
    /// ```
    /// use fleetctl_core::models::Email;
    ///
    /// let email = Email::new(" Dispatch@Example.COM ").unwrap();
    /// assert_eq!(email.as_str(), "dispatch@example.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if normalized.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@domain.tld",
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated phone number, normalized to digits with an optional leading `+`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Create a phone number for `field`.
    ///
    /// Spaces, dashes, dots and parentheses are stripped before checking.
    pub fn new(field: &'static str, s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field });
        }

        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len() + 1);
        if plus {
            digits.push('+');
        }
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => {
                    return Err(ValidationError::InvalidFormat {
                        field,
                        reason: "may only contain digits, spaces, dashes and a leading +",
                    })
                }
            }
        }

        let count = digits.trim_start_matches('+').len();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&count) {
            return Err(ValidationError::InvalidFormat {
                field,
                reason: "must contain between 7 and 15 digits",
            });
        }

        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate an optional phone, treating blank input as absent.
pub fn optional_phone(
    field: &'static str,
    s: Option<&str>,
) -> Result<Option<Phone>, ValidationError> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Phone::new(field, value).map(Some),
    }
}
