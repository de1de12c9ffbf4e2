//! Email address type used for login and registration.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not have exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    BadAtSymbol,
    /// The local part (before @) or the domain (after @) is empty.
    #[error("email must have text on both sides of the @ symbol")]
    MissingPart,
}

/// An email address, trimmed and with a lower-cased domain.
///
/// Validation is structural only; the backend owns the real rules. The
/// client just avoids sending obviously malformed credentials.
///
/// ```
/// use shopfront_core::Email;
///
/// let email = Email::parse("  Jane.Doe@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Jane.Doe@example.com");
/// assert!(Email::parse("jane@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Email::MAX_LENGTH`], or is not of the form `local@domain`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::BadAtSymbol);
        };
        if local.is_empty() || domain.is_empty() {
            return Err(EmailError::MissingPart);
        }

        Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase())))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_domain_only() {
        let email = Email::parse("Shopper@Store.Example").unwrap();
        assert_eq!(email.as_str(), "Shopper@store.example");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at"), Err(EmailError::BadAtSymbol));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::BadAtSymbol));
        assert_eq!(Email::parse("@store.example"), Err(EmailError::MissingPart));
        assert_eq!(Email::parse("shopper@"), Err(EmailError::MissingPart));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        ));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email: Email = "user@example.com".parse().unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"user@example.com\"");
    }
}
