//! Certificate thumbprints via `ring::digest`.

use ring::digest::{self, Algorithm};
use rustls_pki_types::CertificateDer;
use std::fmt;
use std::str::FromStr;

use peertrust_core::{Result, Thumbprint, TrustError};

/// Digest algorithms usable for thumbprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// SHA-1, the historical thumbprint digest
    #[default]
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    fn ring_algorithm(self) -> &'static Algorithm {
        match self {
            Self::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => &digest::SHA256,
            Self::Sha384 => &digest::SHA384,
            Self::Sha512 => &digest::SHA512,
        }
    }

    /// Digest of arbitrary bytes as a thumbprint.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Thumbprint {
        let digest = digest::digest(self.ring_algorithm(), data);
        Thumbprint::from_digest(digest.as_ref())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SHA1" | "SHA-1" => Ok(Self::Sha1),
            "SHA256" | "SHA-256" => Ok(Self::Sha256),
            "SHA384" | "SHA-384" => Ok(Self::Sha384),
            "SHA512" | "SHA-512" => Ok(Self::Sha512),
            _ => Err(TrustError::DigestUnavailable {
                algorithm: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        };
        f.write_str(name)
    }
}

/// Thumbprint of a certificate's DER encoding.
///
/// # Errors
///
/// `TrustError::Encoding` if the certificate carries no DER bytes.
pub fn thumbprint(cert: &CertificateDer<'_>, algorithm: DigestAlgorithm) -> Result<Thumbprint> {
    if cert.as_ref().is_empty() {
        return Err(TrustError::Encoding(
            "certificate has no DER encoding".into(),
        ));
    }
    Ok(algorithm.digest(cert.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn sha1_of_known_input() {
        let tp = DigestAlgorithm::Sha1.digest(b"hello world");
        assert_eq!(tp.as_str(), "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[test]
    fn identical_der_gives_identical_thumbprint() {
        let root = testutil::Authority::root("Test Root");
        let der = root.der();
        let copy = CertificateDer::from(der.as_ref().to_vec());

        let a = thumbprint(&der, DigestAlgorithm::Sha1).unwrap();
        let b = thumbprint(&copy, DigestAlgorithm::Sha1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 40);
        assert!(a.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn algorithm_names() {
        assert_eq!("sha-1".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha1);
        assert_eq!("SHA256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert!(matches!(
            "MD5".parse::<DigestAlgorithm>(),
            Err(TrustError::DigestUnavailable { .. })
        ));
    }

    #[test]
    fn empty_der_is_an_encoding_error() {
        let empty = CertificateDer::from(Vec::new());
        assert!(matches!(
            thumbprint(&empty, DigestAlgorithm::Sha1),
            Err(TrustError::Encoding(_))
        ));
    }

    #[test]
    fn sha256_width() {
        let tp = DigestAlgorithm::Sha256.digest(b"hello world");
        assert_eq!(
            tp.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
