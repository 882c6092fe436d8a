use std::fmt;

use thiserror::Error;

/// Result type alias for trust-engine operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Why a certificate ended up rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Path validation failed and the peer was not trusted explicitly
    UntrustedChain(String),
    /// None of the expected identities matched and the peer was not trusted explicitly
    IdentityMismatch(String),
    /// No thumbprint could be computed, so no stored decision can apply
    Unidentifiable(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UntrustedChain(detail) => write!(f, "untrusted certificate chain: {detail}"),
            Self::IdentityMismatch(detail) => write!(f, "identity mismatch: {detail}"),
            Self::Unidentifiable(detail) => write!(f, "certificate cannot be identified: {detail}"),
        }
    }
}

/// Errors that can occur while deciding whether to trust a peer
#[derive(Error, Debug)]
pub enum TrustError {
    /// The requested digest algorithm is not available
    #[error("digest algorithm not available: {algorithm}")]
    DigestUnavailable {
        /// Name of the requested algorithm
        algorithm: String,
    },

    /// The certificate has no usable DER encoding
    #[error("certificate encoding error: {0}")]
    Encoding(String),

    /// The certificate could not be parsed
    #[error("certificate parse error: {0}")]
    CertificateParse(String),

    /// AIA chain completion failed (always recovered internally)
    #[error("chain repair failed: {0}")]
    ChainRepair(String),

    /// The platform validator refused the chain
    #[error("path validation failed: {0}")]
    PathValidation(String),

    /// None of the expected identities matched the leaf certificate
    #[error("none of <{}> matched the certificate with subject <{subject}>", .expected.join(", "))]
    IdentityMismatch {
        /// Identities the caller expected
        expected: Vec<String>,
        /// Subject of the leaf certificate
        subject: String,
    },

    /// Terminal rejection of the peer certificate
    #[error("the peer provided certificate with subject <{subject}> is not trusted ({reason})")]
    CertificateRejected {
        /// Subject of the leaf certificate
        subject: String,
        /// What made the verification fail before the decision
        reason: RejectReason,
    },

    /// API misuse
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem I/O error
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl TrustError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error is an expected outcome of checking a peer
    /// chain (untrusted path, wrong identity, unreadable certificate)
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PathValidation(_)
                | Self::IdentityMismatch { .. }
                | Self::ChainRepair(_)
                | Self::CertificateParse(_)
        )
    }
}
