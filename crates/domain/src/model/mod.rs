//! Core account model shared by the HTTP surface and the storage adapter.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Maximum accepted length for an email address, per RFC 5321.
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Errors emitted when user-supplied email addresses fail validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailFormatError {
    #[error("email address must not be empty")]
    Empty,
    #[error("email address must be at most {EMAIL_MAX_LENGTH} characters")]
    TooLong,
    #[error("email address must contain exactly one `@` with text on both sides")]
    MalformedAddress,
}

/// Canonical account identity. Stored and compared lowercase so lookups and
/// the uniqueness constraint are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, EmailFormatError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailFormatError::Empty);
        }
        if trimmed.len() > EMAIL_MAX_LENGTH {
            return Err(EmailFormatError::TooLong);
        }

        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(EmailFormatError::MalformedAddress);
        }

        let mut owned = trimmed.to_string();
        owned.make_ascii_lowercase();
        Ok(Self(owned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub email: EmailAddress,
    pub display_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating an account. The password arrives already hashed;
/// plaintext never crosses the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: EmailAddress,
    pub display_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_parse_accepts_and_canonicalizes() {
        let email = EmailAddress::parse("  Admin@Gmail.COM ").unwrap();
        assert_eq!(email.as_str(), "admin@gmail.com");
    }

    #[test]
    fn email_parse_rejects_invalid_inputs() {
        assert_eq!(EmailAddress::parse("   "), Err(EmailFormatError::Empty));
        assert_eq!(
            EmailAddress::parse("no-at-sign.example.com"),
            Err(EmailFormatError::MalformedAddress)
        );
        assert_eq!(
            EmailAddress::parse("@example.com"),
            Err(EmailFormatError::MalformedAddress)
        );
        assert_eq!(
            EmailAddress::parse("user@"),
            Err(EmailFormatError::MalformedAddress)
        );
        assert_eq!(
            EmailAddress::parse("user@nodot"),
            Err(EmailFormatError::MalformedAddress)
        );
        assert_eq!(
            EmailAddress::parse("two words@example.com"),
            Err(EmailFormatError::MalformedAddress)
        );

        let long = format!("{}@example.com", "a".repeat(EMAIL_MAX_LENGTH));
        assert_eq!(EmailAddress::parse(&long), Err(EmailFormatError::TooLong));
    }
}
