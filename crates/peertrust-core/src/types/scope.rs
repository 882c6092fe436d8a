//! Verification scopes and their configuration keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base name under which trust records are stored.
pub const TRUST_KEY_PREFIX: &str = "peertrust.certservice";

/// Configuration key of the "accept everything" flag.
pub const ALWAYS_TRUST_KEY: &str = "peertrust.always_trust";

/// Configuration key of the "never prompt" flag.
pub const NO_USER_INTERACTION_KEY: &str = "peertrust.no_user_interaction";

/// The context a trust decision applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum VerificationScope {
    /// No specific peer identity was requested
    Global,
    /// One expected identity (hostname, SIP or e-mail address)
    Identity(String),
}

impl VerificationScope {
    /// Scope for one expected identity.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::Identity(name.into())
    }

    /// Scopes for a list of identities, `[Global]` when the list is empty.
    #[must_use]
    pub fn for_identities(identities: &[String]) -> Vec<Self> {
        if identities.is_empty() {
            vec![Self::Global]
        } else {
            identities.iter().cloned().map(Self::Identity).collect()
        }
    }

    /// Configuration key holding this scope's persistent trust record.
    #[must_use]
    pub fn config_key(&self) -> String {
        match self {
            Self::Global => format!("{TRUST_KEY_PREFIX}.global"),
            Self::Identity(name) => format!("{TRUST_KEY_PREFIX}.param.{name}"),
        }
    }
}

impl fmt::Display for VerificationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "<any identity>"),
            Self::Identity(name) => write!(f, "{name}"),
        }
    }
}

/// Which side of the connection is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// We are a client validating a server
    Server,
    /// We are a server validating a client
    Client,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_keys_are_deterministic() {
        assert_eq!(
            VerificationScope::Global.config_key(),
            "peertrust.certservice.global"
        );
        assert_eq!(
            VerificationScope::identity("alice@example.com").config_key(),
            "peertrust.certservice.param.alice@example.com"
        );
        assert_eq!(
            VerificationScope::identity("x").config_key(),
            VerificationScope::identity("x").config_key()
        );
    }

    #[test]
    fn empty_identities_map_to_global() {
        assert_eq!(
            VerificationScope::for_identities(&[]),
            vec![VerificationScope::Global]
        );
        let scopes = VerificationScope::for_identities(&["a".into(), "b".into()]);
        assert_eq!(
            scopes,
            vec![VerificationScope::identity("a"), VerificationScope::identity("b")]
        );
    }
}
