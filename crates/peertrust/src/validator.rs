//! Standard X.509 path validation, delegated to rustls' webpki verifiers.

use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::server::danger::ClientCertVerifier;
use rustls::server::WebPkiClientVerifier;
use rustls::{CertificateError, DistinguishedName, RootCertStore};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use peertrust_core::{Result, TrustError};

/// Stand-in name when the caller has none; name errors are ignored anyway.
const PLACEHOLDER_NAME: &str = "peertrust.invalid";

/// Platform path validation: anchors, signatures, validity periods, usage.
///
/// Hostname or identity checks are not part of this contract.
pub trait PathValidator: Send + Sync + fmt::Debug {
    fn check_server_trusted(
        &self,
        chain: &[CertificateDer<'static>],
        server_name: Option<&ServerName<'_>>,
        now: UnixTime,
    ) -> Result<()>;

    fn check_client_trusted(&self, chain: &[CertificateDer<'static>], now: UnixTime) -> Result<()>;

    /// Subjects of the trust anchors.
    fn accepted_issuers(&self) -> &[DistinguishedName];
}

/// [`PathValidator`] over a rustls root store.
#[derive(Debug)]
pub struct WebPkiPathValidator {
    server: Arc<WebPkiServerVerifier>,
    client: Arc<dyn ClientCertVerifier>,
    issuers: Vec<DistinguishedName>,
}

impl WebPkiPathValidator {
    /// Validator anchored at `roots`.
    pub fn new(roots: RootCertStore) -> Result<Self> {
        if roots.is_empty() {
            return Err(TrustError::Config("no trust anchors available".into()));
        }
        let issuers = roots.subjects();
        let roots = Arc::new(roots);
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let server = WebPkiServerVerifier::builder_with_provider(roots.clone(), provider.clone())
            .build()
            .map_err(|e| TrustError::Config(format!("server verifier: {e}")))?;
        let client = WebPkiClientVerifier::builder_with_provider(roots, provider)
            .build()
            .map_err(|e| TrustError::Config(format!("client verifier: {e}")))?;

        Ok(Self {
            server,
            client,
            issuers,
        })
    }

    /// Validator anchored at the given certificates.
    pub fn from_certificates(
        anchors: impl IntoIterator<Item = CertificateDer<'static>>,
    ) -> Result<Self> {
        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(anchors);
        debug!(added, ignored, "loaded trust anchors");
        Self::new(roots)
    }

    /// Validator anchored at the operating system's trust store.
    pub fn with_native_roots() -> Result<Self> {
        Self::new(native_root_store())
    }

    /// Native anchors plus `extra`.
    pub fn with_native_roots_and(
        extra: impl IntoIterator<Item = CertificateDer<'static>>,
    ) -> Result<Self> {
        let mut roots = native_root_store();
        let (added, ignored) = roots.add_parsable_certificates(extra);
        debug!(added, ignored, "loaded extra trust anchors");
        Self::new(roots)
    }

    /// Signature algorithms of the provider the verifiers were built with.
    pub fn crypto_provider() -> Arc<CryptoProvider> {
        Arc::new(rustls::crypto::ring::default_provider())
    }
}

impl PathValidator for WebPkiPathValidator {
    fn check_server_trusted(
        &self,
        chain: &[CertificateDer<'static>],
        server_name: Option<&ServerName<'_>>,
        now: UnixTime,
    ) -> Result<()> {
        let (end_entity, intermediates) = split(chain)?;
        let placeholder;
        let name = match server_name {
            Some(name) => name,
            None => {
                placeholder = ServerName::try_from(PLACEHOLDER_NAME)
                    .map_err(|e| TrustError::InvalidArgument(e.to_string()))?;
                &placeholder
            }
        };

        match self
            .server
            .verify_server_cert(end_entity, intermediates, name, &[], now)
        {
            Ok(_) => Ok(()),
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
            )) => Ok(()),
            Err(e) => Err(TrustError::PathValidation(e.to_string())),
        }
    }

    fn check_client_trusted(&self, chain: &[CertificateDer<'static>], now: UnixTime) -> Result<()> {
        let (end_entity, intermediates) = split(chain)?;
        self.client
            .verify_client_cert(end_entity, intermediates, now)
            .map(|_| ())
            .map_err(|e| TrustError::PathValidation(e.to_string()))
    }

    fn accepted_issuers(&self) -> &[DistinguishedName] {
        &self.issuers
    }
}

fn split<'a>(
    chain: &'a [CertificateDer<'static>],
) -> Result<(&'a CertificateDer<'static>, &'a [CertificateDer<'static>])> {
    chain
        .split_first()
        .ok_or_else(|| TrustError::InvalidArgument("empty certificate chain".into()))
}

/// Root store of the operating system; unreadable entries are skipped.
pub fn native_root_store() -> RootCertStore {
    let result = rustls_native_certs::load_native_certs();
    for error in &result.errors {
        warn!(error = %error, "error loading native certificates");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(result.certs);
    debug!(added, ignored, "loaded native trust anchors");
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Authority;

    #[test]
    fn complete_chain_validates_regardless_of_name() {
        let root = Authority::root("Test Root");
        let ca = root.intermediate("Test Intermediate", &[]);
        let leaf = ca.leaf("leaf.example.com", &["leaf.example.com"]);
        let validator = WebPkiPathValidator::from_certificates([root.der()]).unwrap();

        let chain = vec![leaf.clone(), ca.der()];
        assert!(validator
            .check_server_trusted(&chain, None, UnixTime::now())
            .is_ok());
        let other = ServerName::try_from("other.example.org").unwrap();
        assert!(validator
            .check_server_trusted(&chain, Some(&other), UnixTime::now())
            .is_ok());

        // Leaf alone cannot reach the anchor.
        assert!(matches!(
            validator.check_server_trusted(&[leaf], None, UnixTime::now()),
            Err(TrustError::PathValidation(_))
        ));
    }

    #[test]
    fn client_chains_and_issuers() {
        let root = Authority::root("Test Root");
        let stranger = Authority::root("Other Root");
        let validator = WebPkiPathValidator::from_certificates([root.der()]).unwrap();

        let alice = root.email_leaf("Alice", &["alice@example.com"]);
        let mallory = stranger.email_leaf("Mallory", &["mallory@example.com"]);
        assert!(validator.check_client_trusted(&[alice], UnixTime::now()).is_ok());
        assert!(validator
            .check_client_trusted(&[mallory], UnixTime::now())
            .is_err());
        assert_eq!(validator.accepted_issuers().len(), 1);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let root = Authority::root("Test Root");
        let validator = WebPkiPathValidator::from_certificates([root.der()]).unwrap();
        assert!(matches!(
            validator.check_server_trusted(&[], None, UnixTime::now()),
            Err(TrustError::InvalidArgument(_))
        ));
        assert!(matches!(
            WebPkiPathValidator::new(RootCertStore::empty()),
            Err(TrustError::Config(_))
        ));
    }
}
