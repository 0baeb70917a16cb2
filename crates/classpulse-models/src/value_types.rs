//! Validated domain primitives.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{ValidateEmail, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    InvalidEmail(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(msg) => write!(f, "{}", msg),
        }
    }
}

/// A validated, normalized (trimmed, lower-cased) email address.
///
/// Emails are compared case-insensitively, so normalization happens once here
/// and the stored value is always canonical.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, sqlx::Type, ToSchema)]
#[serde(transparent)]
#[sqlx(transparent)]
#[schema(value_type = String, format = "email", example = "alice@example.com")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, ValueTypeError> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail("Email is required".into()));
        }
        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(
                "Please provide a valid email".into(),
            ));
        }

        Ok(Self(email))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Email::new(s).map_err(serde::de::Error::custom)
    }
}

/// `validator` hook for academic year labels such as `2024-2025`: two four-digit
/// years where the second immediately follows the first.
pub fn validate_academic_year_label(value: &str) -> Result<(), ValidationError> {
    let invalid = |message: &'static str| {
        let mut err = ValidationError::new("academic_year");
        err.message = Some(Cow::Borrowed(message));
        err
    };

    let (start, end) = value
        .split_once('-')
        .filter(|(a, b)| {
            a.len() == 4
                && b.len() == 4
                && a.chars().all(|c| c.is_ascii_digit())
                && b.chars().all(|c| c.is_ascii_digit())
        })
        .ok_or_else(|| invalid("Academic year must be in format YYYY-YYYY"))?;

    let start: u32 = start
        .parse()
        .map_err(|_| invalid("Academic year must be in format YYYY-YYYY"))?;
    let end: u32 = end
        .parse()
        .map_err(|_| invalid("Academic year must be in format YYYY-YYYY"))?;

    if end != start + 1 {
        return Err(invalid("Academic year must span consecutive years"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let email = Email::new("  Alice@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_invalid_emails() {
        assert!(Email::new("").is_err());
        assert!(Email::new("not-an-email").is_err());
        assert!("@example.com".parse::<Email>().is_err());
    }

    #[test]
    fn test_email_deserialize_validates() {
        let ok: Email = serde_json::from_str(r#""bob@example.com""#).unwrap();
        assert_eq!(ok.to_string(), "bob@example.com");
        assert!(serde_json::from_str::<Email>(r#""bob""#).is_err());
    }

    #[test]
    fn test_academic_year_label() {
        assert!(validate_academic_year_label("2024-2025").is_ok());
        assert!(validate_academic_year_label("2024-2026").is_err());
        assert!(validate_academic_year_label("2025-2024").is_err());
        assert!(validate_academic_year_label("24-25").is_err());
        assert!(validate_academic_year_label("2024/2025").is_err());
        assert!(validate_academic_year_label("abcd-efgh").is_err());
        assert!(validate_academic_year_label("+024-2025").is_err());
    }
}
