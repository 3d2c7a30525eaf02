//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("Email is required")]
    Empty,
    /// The input string is too long.
    #[error("Email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not shaped like `local@domain.tld`.
    #[error("Enter a valid email address")]
    Invalid,
}

/// An email address.
///
/// Input is trimmed before validation. The check is structural only: one
/// `@`, a non-empty local part, and a domain containing a dot that neither
/// starts nor ends with it. Deliverability is the store API's concern.
///
/// ## Examples
///
/// ```
/// use storedesk_core::Email;
///
/// assert!(Email::parse("admin@shop.ng").is_ok());
/// assert!(Email::parse("  jane.doe+orders@mail.co.uk ").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 254
    /// characters, or not structurally an address.
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

        let (local, domain) = s.split_once('@').ok_or(EmailError::Invalid)?;
        if local.is_empty()
            || domain.contains('@')
            || s.chars().any(char::is_whitespace)
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(EmailError::Invalid);
        }

        Ok(Self(s.to_owned()))
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

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
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
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let email = Email::parse("  ops@store.ng\n").unwrap();
        assert_eq!(email.as_str(), "ops@store.ng");
        assert_eq!(email.domain(), "store.ng");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("@store.ng"), Err(EmailError::Invalid));
        assert_eq!(Email::parse("a@@store.ng"), Err(EmailError::Invalid));
        assert_eq!(Email::parse("a@store"), Err(EmailError::Invalid));
        assert_eq!(Email::parse("a@.store"), Err(EmailError::Invalid));
        assert_eq!(Email::parse("a b@store.ng"), Err(EmailError::Invalid));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = format!("{}@store.ng", "a".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(EmailError::Invalid.to_string(), "Enter a valid email address");
    }
}
