//! The long-lived owner of trust state.

use rustls_pki_types::CertificateDer;
use std::sync::Arc;
use tracing::{debug, info};

use peertrust_core::{
    Result, Thumbprint, TrustDecision, TrustError, TrustSettings, VerificationScope,
    ALWAYS_TRUST_KEY, NO_USER_INTERACTION_KEY,
};

use crate::aia::{ChainCompleter, HttpIssuerFetcher, IssuerFetcher};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigStore, MemoryConfigStore};
use crate::matcher::{EmailMatcher, HostnameMatcher, IdentityMatcher};
use crate::prompt::DecisionPrompt;
use crate::store::TrustStore;
use crate::thumbprint::{thumbprint, DigestAlgorithm};
use crate::validator::{PathValidator, WebPkiPathValidator};
use crate::verifier::TrustVerifier;

/// Shared trust state: configuration, stored decisions, AIA cache,
/// validator and decision prompt.
///
/// Cheap to clone. Verifiers handed out by one service share its session
/// decisions and its AIA cache.
#[derive(Debug, Clone)]
pub struct TrustService {
    inner: Arc<ServiceInner>,
}

#[derive(Debug)]
pub(crate) struct ServiceInner {
    pub(crate) settings: TrustSettings,
    pub(crate) algorithm: DigestAlgorithm,
    pub(crate) config: Arc<dyn ConfigStore>,
    pub(crate) store: TrustStore,
    pub(crate) completer: ChainCompleter,
    pub(crate) validator: Arc<dyn PathValidator>,
    pub(crate) prompt: Option<Arc<dyn DecisionPrompt>>,
}

impl ServiceInner {
    /// `peertrust.always_trust`, read on every call.
    pub(crate) fn always_trust(&self) -> bool {
        self.config
            .get_bool(ALWAYS_TRUST_KEY, self.settings.always_trust)
    }

    /// `peertrust.no_user_interaction`, read on every call.
    pub(crate) fn no_user_interaction(&self) -> bool {
        self.config
            .get_bool(NO_USER_INTERACTION_KEY, self.settings.no_user_interaction)
    }

    pub(crate) fn thumbprint(&self, cert: &CertificateDer<'_>) -> Result<Thumbprint> {
        thumbprint(cert, self.algorithm)
    }
}

impl TrustService {
    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> TrustServiceBuilder {
        TrustServiceBuilder::new()
    }

    pub fn settings(&self) -> &TrustSettings {
        &self.inner.settings
    }

    /// Stored trust decisions.
    pub fn store(&self) -> &TrustStore {
        &self.inner.store
    }

    /// AIA chain completion with this service's cache.
    pub fn completer(&self) -> &ChainCompleter {
        &self.inner.completer
    }

    pub fn config(&self) -> &Arc<dyn ConfigStore> {
        &self.inner.config
    }

    /// Thumbprint with the configured digest.
    pub fn thumbprint(&self, cert: &CertificateDer<'_>) -> Result<Thumbprint> {
        self.inner.thumbprint(cert)
    }

    /// Verifier for the given expected identities, default matchers.
    ///
    /// No identities means any certificate passing path validation is
    /// accepted, and decisions are stored in the global scope.
    pub fn trust_verifier<I, S>(&self, identities: I) -> TrustVerifier
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trust_verifier_with_matchers(identities, None, None)
    }

    /// Verifier with custom matchers. `None` keeps the default for that
    /// direction: e-mail for clients, hostname for servers.
    pub fn trust_verifier_with_matchers<I, S>(
        &self,
        identities: I,
        client_matcher: Option<Arc<dyn IdentityMatcher>>,
        server_matcher: Option<Arc<dyn IdentityMatcher>>,
    ) -> TrustVerifier
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identities: Vec<String> = identities.into_iter().map(Into::into).collect();
        TrustVerifier::new(
            self.inner.clone(),
            identities,
            client_matcher.unwrap_or_else(|| Arc::new(EmailMatcher)),
            server_matcher.unwrap_or_else(|| Arc::new(HostnameMatcher)),
        )
    }

    /// Record a decision for `cert` without any verification.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for [`TrustDecision::DoNotTrust`], which has nothing
    /// to record.
    pub fn add_certificate_to_trust(
        &self,
        cert: &CertificateDer<'_>,
        scope: &VerificationScope,
        decision: TrustDecision,
    ) -> Result<Thumbprint> {
        let tp = self.inner.thumbprint(cert)?;
        match decision {
            TrustDecision::DoNotTrust => {
                return Err(TrustError::InvalidArgument(
                    "cannot record a DoNotTrust decision".into(),
                ))
            }
            TrustDecision::TrustAlways => self.inner.store.trust_always(scope, &tp)?,
            TrustDecision::TrustThisSessionOnly => self.inner.store.trust_session(scope, &tp),
        }
        info!(scope = %scope, thumbprint = %tp, decision = %decision, "certificate added to trust");
        Ok(tp)
    }
}

/// Builder for [`TrustService`]
#[derive(Debug, Default)]
pub struct TrustServiceBuilder {
    settings: TrustSettings,
    config: Option<Arc<dyn ConfigStore>>,
    validator: Option<Arc<dyn PathValidator>>,
    fetcher: Option<Arc<dyn IssuerFetcher>>,
    clock: Option<Arc<dyn Clock>>,
    prompt: Option<Arc<dyn DecisionPrompt>>,
}

impl TrustServiceBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn settings(mut self, settings: TrustSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Configuration store (default: in memory)
    #[must_use]
    pub fn config(mut self, config: Arc<dyn ConfigStore>) -> Self {
        self.config = Some(config);
        self
    }

    /// Path validator (default: native trust store)
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn PathValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Issuer fetcher (default: HTTP with the configured timeout)
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn IssuerFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Decision prompt (default: none, which rejects)
    #[must_use]
    pub fn prompt(mut self, prompt: Arc<dyn DecisionPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Build the service
    pub fn build(self) -> Result<TrustService> {
        let settings = self.settings;
        let algorithm: DigestAlgorithm = settings.thumbprint_algorithm.parse()?;

        let validator: Arc<dyn PathValidator> = match self.validator {
            Some(v) => v,
            None => Arc::new(WebPkiPathValidator::with_native_roots()?),
        };
        let fetcher = self.fetcher.unwrap_or_else(|| {
            Arc::new(
                HttpIssuerFetcher::builder()
                    .timeout(settings.aia.fetch_timeout())
                    .user_agent(format!(
                        "{}/{}",
                        settings.application_name,
                        env!("CARGO_PKG_VERSION")
                    ))
                    .build(),
            )
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let config = self
            .config
            .unwrap_or_else(|| Arc::new(MemoryConfigStore::new()));

        debug!(
            application = %settings.application_name,
            algorithm = %algorithm,
            max_hops = settings.aia.max_hops,
            "trust service ready"
        );

        Ok(TrustService {
            inner: Arc::new(ServiceInner {
                completer: ChainCompleter::new(fetcher, clock, &settings.aia),
                store: TrustStore::new(config.clone()),
                settings,
                algorithm,
                config,
                validator,
                prompt: self.prompt,
            }),
        })
    }
}
