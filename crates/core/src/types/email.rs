//! Email address type used for checkout billing and customer accounts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace between characters.
    #[error("email cannot contain whitespace")]
    Whitespace,
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    /// The mailbox (before @) is empty.
    #[error("email mailbox cannot be empty")]
    EmptyMailbox,
    /// The domain (after @) is not a dotted host name.
    #[error("email domain `{0}` is not valid")]
    InvalidDomain(String),
}

/// A checked email address.
///
/// Surrounding whitespace is trimmed and the domain is lowercased, so
/// `" Ali@Example.PK "` and `"Ali@example.pk"` compare equal.
///
/// ```
/// use azlan_core::Email;
///
/// let email = Email::parse(" Ali@Example.PK ").unwrap();
/// assert_eq!(email.as_str(), "Ali@example.pk");
/// assert!(Email::parse("ali@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let mut parts = s.split('@');
        let (Some(mailbox), Some(domain), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(EmailError::AtSymbol);
        };
        if mailbox.is_empty() {
            return Err(EmailError::EmptyMailbox);
        }
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains("..");
        if !domain_ok {
            return Err(EmailError::InvalidDomain(domain.to_owned()));
        }

        Ok(Self(format!("{mailbox}@{}", domain.to_lowercase())))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, d)| d)
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

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
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
    fn test_parse_accepts_common_addresses() {
        assert!(Email::parse("customer@gmail.com").is_ok());
        assert!(Email::parse("first.last+orders@shop.com.pk").is_ok());
    }

    #[test]
    fn test_parse_normalizes_domain_and_whitespace() {
        let email = Email::parse("  Ali.Raza@GMAIL.com\n").unwrap();
        assert_eq!(email.as_str(), "Ali.Raza@gmail.com");
        assert_eq!(email.domain(), "gmail.com");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("ali raza@gmail.com"), Err(EmailError::Whitespace));
        assert_eq!(Email::parse("no-at-symbol"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.com"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@gmail.com"), Err(EmailError::EmptyMailbox));
        assert!(matches!(
            Email::parse("ali@gmail"),
            Err(EmailError::InvalidDomain(_))
        ));
        assert!(matches!(
            Email::parse("ali@gmail..com"),
            Err(EmailError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"ali@gmail.com\"").unwrap();
        assert_eq!(ok.to_string(), "ali@gmail.com");
        assert!(serde_json::from_str::<Email>("\"not an email\"").is_err());
    }
}
