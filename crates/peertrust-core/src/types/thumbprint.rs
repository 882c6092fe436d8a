//! Certificate thumbprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TrustError;

/// Lowercase hex digest of a certificate's DER encoding.
///
/// A thumbprint is an allow-list key. It says "this exact certificate was
/// accepted before", nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Thumbprint(String);

impl Thumbprint {
    /// Build a thumbprint from raw digest bytes.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Hex string view.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Thumbprint {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.len() % 2 != 0 {
            return Err(TrustError::InvalidArgument(format!(
                "thumbprint must be a non-empty even-length hex string, got <{s}>"
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TrustError::InvalidArgument(format!(
                "thumbprint contains non-hex characters: <{s}>"
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Thumbprint {
    type Error = TrustError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Thumbprint> for String {
    fn from(value: Thumbprint) -> Self {
        value.0
    }
}

impl AsRef<str> for Thumbprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
