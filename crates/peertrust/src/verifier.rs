//! The trust decision for one presented chain.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{DigitallySignedStruct, DistinguishedName, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use peertrust_core::{
    Direction, PromptReason, RejectReason, Result, TrustDecision, TrustError, VerificationScope,
};

use crate::cert;
use crate::matcher::IdentityMatcher;
use crate::service::ServiceInner;
use crate::validator::WebPkiPathValidator;

/// Decides whether a peer chain is trusted for a fixed set of identities.
///
/// Created by [`TrustService::trust_verifier`](crate::TrustService::trust_verifier).
/// Usable directly or installed into rustls as a server or client
/// certificate verifier.
#[derive(Debug, Clone)]
pub struct TrustVerifier {
    service: Arc<ServiceInner>,
    identities: Vec<String>,
    client_matcher: Arc<dyn IdentityMatcher>,
    server_matcher: Arc<dyn IdentityMatcher>,
    provider: Arc<CryptoProvider>,
}

impl TrustVerifier {
    pub(crate) fn new(
        service: Arc<ServiceInner>,
        identities: Vec<String>,
        client_matcher: Arc<dyn IdentityMatcher>,
        server_matcher: Arc<dyn IdentityMatcher>,
    ) -> Self {
        Self {
            service,
            identities,
            client_matcher,
            server_matcher,
            provider: WebPkiPathValidator::crypto_provider(),
        }
    }

    /// Identities this verifier expects.
    pub fn identities(&self) -> &[String] {
        &self.identities
    }

    /// We are the client; `chain` came from a server.
    pub fn check_server_trusted(
        &self,
        chain: &[CertificateDer<'static>],
        server_name: Option<&ServerName<'_>>,
        now: UnixTime,
    ) -> Result<()> {
        self.check_trusted(chain, Direction::Server, server_name, now)
    }

    /// We are the server; `chain` came from a client.
    pub fn check_client_trusted(&self, chain: &[CertificateDer<'static>], now: UnixTime) -> Result<()> {
        self.check_trusted(chain, Direction::Client, None, now)
    }

    /// Subjects of the validator's trust anchors.
    pub fn accepted_issuers(&self) -> &[DistinguishedName] {
        self.service.validator.accepted_issuers()
    }

    /// Full decision: flags, chain repair, validation, identity, stored
    /// decisions, then the prompt.
    ///
    /// # Errors
    ///
    /// `CertificateRejected` when the chain is neither verifiable nor
    /// explicitly trusted, `InvalidArgument` for an empty chain, or a
    /// configuration error if a `TrustAlways` decision cannot be stored.
    pub fn check_trusted(
        &self,
        chain: &[CertificateDer<'static>],
        direction: Direction,
        server_name: Option<&ServerName<'_>>,
        now: UnixTime,
    ) -> Result<()> {
        if chain.is_empty() {
            return Err(TrustError::InvalidArgument("empty certificate chain".into()));
        }
        if self.service.always_trust() {
            info!(direction = %direction, "always-trust flag set, accepting certificate");
            return Ok(());
        }

        let chain = self.service.completer.complete_chain(chain);
        let failure = match self.validate(&chain, direction, server_name, now) {
            Ok(()) => {
                debug!(direction = %direction, "certificate chain verified");
                return Ok(());
            }
            Err(e) => e,
        };

        let leaf = &chain[0];
        let subject = cert::subject(leaf);
        if failure.is_recoverable() {
            debug!(direction = %direction, subject = %subject, error = %failure, "verification failed, checking stored decisions");
        } else {
            warn!(direction = %direction, subject = %subject, error = %failure, "validator error, treating chain as unverified");
        }
        let reason = match &failure {
            TrustError::IdentityMismatch { .. } => RejectReason::IdentityMismatch(failure.to_string()),
            other => RejectReason::UntrustedChain(other.to_string()),
        };

        let tp = match self.service.thumbprint(leaf) {
            Ok(tp) => tp,
            Err(e) => {
                warn!(subject = %subject, error = %e, "cannot compute thumbprint");
                return Err(TrustError::CertificateRejected {
                    subject,
                    reason: RejectReason::Unidentifiable(e.to_string()),
                });
            }
        };

        let scopes = VerificationScope::for_identities(&self.identities);
        if scopes.iter().any(|scope| self.service.store.is_trusted(scope, &tp)) {
            debug!(thumbprint = %tp, "certificate trusted by stored decision");
            return Ok(());
        }

        match self.ask(&chain, direction, &subject, &failure) {
            TrustDecision::DoNotTrust => {
                info!(subject = %subject, "certificate not trusted");
                Err(TrustError::CertificateRejected { subject, reason })
            }
            TrustDecision::TrustAlways => {
                for scope in &scopes {
                    self.service.store.trust_always(scope, &tp)?;
                }
                info!(subject = %subject, thumbprint = %tp, "certificate trusted permanently");
                Ok(())
            }
            TrustDecision::TrustThisSessionOnly => {
                for scope in &scopes {
                    self.service.store.trust_session(scope, &tp);
                }
                info!(subject = %subject, thumbprint = %tp, "certificate trusted for this session");
                Ok(())
            }
        }
    }

    fn validate(
        &self,
        chain: &[CertificateDer<'static>],
        direction: Direction,
        server_name: Option<&ServerName<'_>>,
        now: UnixTime,
    ) -> Result<()> {
        let validator = &self.service.validator;
        let matcher = match direction {
            Direction::Server => {
                validator.check_server_trusted(chain, server_name, now)?;
                &self.server_matcher
            }
            Direction::Client => {
                validator.check_client_trusted(chain, now)?;
                &self.client_matcher
            }
        };

        if self.identities.is_empty() {
            return Ok(());
        }
        matcher.verify(&self.identities, &chain[0])
    }

    fn ask(
        &self,
        chain: &[CertificateDer<'static>],
        direction: Direction,
        subject: &str,
        failure: &TrustError,
    ) -> TrustDecision {
        if self.service.no_user_interaction() {
            info!(subject = %subject, "user interaction disabled, not trusting");
            return TrustDecision::DoNotTrust;
        }
        let Some(prompt) = &self.service.prompt else {
            error!(subject = %subject, "no decision prompt installed, not trusting");
            return TrustDecision::DoNotTrust;
        };

        let reason = PromptReason {
            application_name: self.service.settings.application_name.clone(),
            direction,
            identities: self.identities.clone(),
            subject: subject.to_string(),
            detail: failure.to_string(),
        };
        prompt.ask(chain, &reason)
    }

    fn schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn owned_chain(
    end_entity: &CertificateDer<'_>,
    intermediates: &[CertificateDer<'_>],
) -> Vec<CertificateDer<'static>> {
    std::iter::once(end_entity)
        .chain(intermediates)
        .map(|der| der.clone().into_owned())
        .collect()
}

fn to_rustls(e: &TrustError) -> rustls::Error {
    rustls::Error::General(e.to_string())
}

impl ServerCertVerifier for TrustVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let chain = owned_chain(end_entity, intermediates);
        self.check_server_trusted(&chain, Some(server_name), now)
            .map(|()| ServerCertVerified::assertion())
            .map_err(|e| to_rustls(&e))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes()
    }
}

impl ClientCertVerifier for TrustVerifier {
    fn offer_client_auth(&self) -> bool {
        true
    }

    fn client_auth_mandatory(&self) -> bool {
        true
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        self.accepted_issuers()
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> std::result::Result<ClientCertVerified, rustls::Error> {
        let chain = owned_chain(end_entity, intermediates);
        self.check_client_trusted(&chain, now)
            .map(|()| ClientCertVerified::assertion())
            .map_err(|e| to_rustls(&e))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes()
    }
}
