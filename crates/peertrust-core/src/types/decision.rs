//! Trust decisions and the context handed to whoever makes them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Direction;

/// Outcome of asking whether an unverifiable certificate should be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustDecision {
    /// Reject the certificate
    DoNotTrust,
    /// Trust it now and after restarts
    TrustAlways,
    /// Trust it until the process exits
    TrustThisSessionOnly,
}

impl fmt::Display for TrustDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoNotTrust => write!(f, "do not trust"),
            Self::TrustAlways => write!(f, "trust always"),
            Self::TrustThisSessionOnly => write!(f, "trust this session only"),
        }
    }
}

/// Why a trust decision is being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptReason {
    /// Name of the application asking
    pub application_name: String,
    /// Side of the connection being validated
    pub direction: Direction,
    /// Identities the caller expected (empty: none requested)
    pub identities: Vec<String>,
    /// Subject of the leaf certificate
    pub subject: String,
    /// What the failed check reported
    pub detail: String,
}

impl PromptReason {
    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> String {
        let app = &self.application_name;
        if self.identities.is_empty() {
            return format!(
                "{app} cannot verify the identity of the peer certificate <{}>. \
                 Trusting it means the connection may not be private.",
                self.subject
            );
        }

        let ids = self.identities.join(", ");
        match self.direction {
            Direction::Server => format!(
                "{app} cannot verify the identity of the server when connecting to <{ids}>. \
                 The certificate <{}> is not trusted, which means the server's identity \
                 cannot be automatically verified.",
                self.subject
            ),
            Direction::Client => format!(
                "{app} cannot verify the identity of the peer <{ids}>. \
                 The certificate <{}> presented by the peer is not trusted.",
                self.subject
            ),
        }
    }
}

impl fmt::Display for PromptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(direction: Direction, identities: &[&str]) -> PromptReason {
        PromptReason {
            application_name: "peertrust".into(),
            direction,
            identities: identities.iter().map(|s| (*s).to_string()).collect(),
            subject: "CN=peer".into(),
            detail: "unknown issuer".into(),
        }
    }

    #[test]
    fn message_distinguishes_cases() {
        let none = reason(Direction::Server, &[]).message();
        let server = reason(Direction::Server, &["example.com"]).message();
        let client = reason(Direction::Client, &["bob@example.com"]).message();

        assert!(!none.contains("example.com"));
        assert!(server.contains("server"));
        assert!(server.contains("example.com"));
        assert!(client.contains("peer <bob@example.com>"));
        assert_ne!(server, client);
    }

    #[test]
    fn display_includes_detail() {
        let text = reason(Direction::Server, &[]).to_string();
        assert!(text.ends_with("(unknown issuer)"));
    }
}
