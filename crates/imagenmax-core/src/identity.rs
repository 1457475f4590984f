//! Account identity.
//!
//! An identity is the email address a purchase is linked to. It doubles as the
//! persistence key for the account, so two spellings of the same address
//! (`Ada@Example.com ` and `ada@example.com`) must map to the same record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of an email identity.
const MAX_IDENTITY_LEN: usize = 254;

/// A normalised email identity.
///
/// Construction trims surrounding whitespace and lower-cases the address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parse and normalise an email identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a plausible email address.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let normalised = input.trim().to_lowercase();

        if normalised.is_empty() {
            return Err(IdentityError::Empty);
        }
        if normalised.len() > MAX_IDENTITY_LEN {
            return Err(IdentityError::TooLong);
        }
        if normalised.chars().any(char::is_whitespace) {
            return Err(IdentityError::InvalidEmail);
        }

        let mut parts = normalised.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(normalised))
            }
            _ => Err(IdentityError::InvalidEmail),
        }
    }

    /// Return the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing an identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The input was empty or whitespace.
    #[error("email address is empty")]
    Empty,

    /// The input exceeds the maximum email length.
    #[error("email address is too long")]
    TooLong,

    /// The input is not shaped like `local@domain`.
    #[error("invalid email address")]
    InvalidEmail,
}
