//! Validated disposable mailbox addresses.

use crate::error::{Error, Result};
use email_address::EmailAddress;
use std::fmt;
use std::str::FromStr;

/// A disposable mailbox address, split into local part and domain.
///
/// Construction goes through [`MailAddress::parse`], which validates the raw
/// string with the `email_address` crate so downstream code never sees an
/// address without an `@`.
///
/// # Example
///
/// ```
/// use mailwatch::MailAddress;
///
/// let addr = MailAddress::parse("abc123@esiix.com").unwrap();
/// assert_eq!(addr.local(), "abc123");
/// assert_eq!(addr.domain(), "esiix.com");
/// assert_eq!(addr.to_string(), "abc123@esiix.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailAddress {
    local: String,
    domain: String,
}

impl MailAddress {
    /// Parses and validates a raw address string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the input is not a well-formed
    /// email address.
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed = EmailAddress::from_str(raw).map_err(|_| Error::InvalidAddress {
            email: raw.to_string(),
        })?;

        Ok(Self {
            local: parsed.local_part().to_string(),
            domain: parsed.domain().to_string(),
        })
    }

    /// Returns the local part (before the `@`).
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Returns the domain (after the `@`).
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

impl FromStr for MailAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let addr = MailAddress::parse("user@1secmail.com").unwrap();
        assert_eq!(addr.local(), "user");
        assert_eq!(addr.domain(), "1secmail.com");
    }

    #[test]
    fn test_parse_no_at_sign() {
        let result = MailAddress::parse("not-an-address");
        assert!(matches!(result, Err(Error::InvalidAddress { .. })));
    }

    #[test]
    fn test_parse_empty() {
        assert!(MailAddress::parse("").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let addr: MailAddress = "abc@wwjmp.com".parse().unwrap();
        assert_eq!(addr.to_string(), "abc@wwjmp.com");
    }
}
