//! Chain completion through the Authority Information Access extension.
//!
//! Servers regularly send only their leaf certificate. When the leaf names
//! where its issuer can be downloaded (`caIssuers`), the missing
//! intermediates are fetched and appended so that path validation has a
//! chance to succeed.

mod cache;
mod fetch;

pub use cache::{AiaCache, Cached};
pub use fetch::{HttpIssuerFetcher, HttpIssuerFetcherBuilder, IssuerFetcher, MAX_BODY_BYTES};

use rustls_pki_types::CertificateDer;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use peertrust_core::{AiaSettings, Result, TrustError};

use crate::cert;
use crate::clock::Clock;

/// Repairs leaf-only chains by downloading issuers.
#[derive(Debug)]
pub struct ChainCompleter {
    fetcher: Arc<dyn IssuerFetcher>,
    clock: Arc<dyn Clock>,
    cache: AiaCache,
    max_hops: usize,
}

impl ChainCompleter {
    /// Create a completer with its own cache.
    pub fn new(fetcher: Arc<dyn IssuerFetcher>, clock: Arc<dyn Clock>, settings: &AiaSettings) -> Self {
        Self {
            fetcher,
            clock,
            cache: AiaCache::new(settings.cache_ttl()),
            max_hops: settings.max_hops,
        }
    }

    /// The fetch cache.
    pub const fn cache(&self) -> &AiaCache {
        &self.cache
    }

    /// Best-effort completion; any failure yields the chain as presented.
    pub fn complete_chain(&self, chain: &[CertificateDer<'static>]) -> Vec<CertificateDer<'static>> {
        match self.try_complete(chain) {
            Ok(completed) => completed,
            Err(e) => {
                debug!(error = %e, "keeping the presented chain");
                chain.to_vec()
            }
        }
    }

    /// Completion that reports why it could not run.
    ///
    /// Chains of more than one certificate and self-signed leaves come back
    /// unchanged. The result never grows by more than `max_hops`.
    pub fn try_complete(&self, chain: &[CertificateDer<'static>]) -> Result<Vec<CertificateDer<'static>>> {
        let [leaf] = chain else {
            return Ok(chain.to_vec());
        };
        if cert::is_self_signed(&parse_for_repair(leaf)?) {
            return Ok(chain.to_vec());
        }

        let mut completed = chain.to_vec();
        let mut current = leaf.clone();
        for hop in 0..self.max_hops {
            let next = {
                let parsed = parse_for_repair(&current)?;
                if !cert::has_authority_info_access(&parsed) {
                    debug!(hop, subject = %parsed.subject(), "no AIA extension, stopping");
                    break;
                }
                self.next_issuer(&parsed)
            };

            let Some(issuer) = next else {
                break;
            };
            debug!(hop, subject = %cert::subject(&issuer), "appending fetched issuer");
            completed.push(issuer.clone());
            current = issuer;
        }

        Ok(completed)
    }

    /// First non-self-signed certificate behind the usable `caIssuers` URIs.
    fn next_issuer(&self, current: &x509_parser::prelude::X509Certificate<'_>) -> Option<CertificateDer<'static>> {
        for uri in usable_uris(current) {
            let Some(issuer) = self.resolve(&uri) else {
                continue;
            };
            match cert::parse(issuer.as_ref()).map(|parsed| cert::is_self_signed(&parsed)) {
                Ok(true) => debug!(uri = %uri, "fetched issuer is self-signed, not appending"),
                Ok(false) => return Some(issuer),
                Err(e) => debug!(uri = %uri, error = %e, "fetched issuer unreadable"),
            }
        }
        None
    }

    fn resolve(&self, uri: &Url) -> Option<CertificateDer<'static>> {
        if let Some(hit) = self.cache.lookup(uri.as_str(), self.clock.now()) {
            debug!(uri = %uri, "AIA cache hit");
            return match hit {
                Cached::Certificate(der) => Some(der),
                Cached::Failed => None,
            };
        }

        let outcome = match self
            .fetcher
            .fetch(uri)
            .and_then(|body| cert::decode_certificate(&body))
        {
            Ok(der) => Cached::Certificate(der),
            Err(e) => {
                debug!(uri = %uri, error = %e, "issuer fetch failed");
                Cached::Failed
            }
        };
        self.cache.store(uri.as_str(), outcome.clone(), self.clock.now());

        match outcome {
            Cached::Certificate(der) => Some(der),
            Cached::Failed => None,
        }
    }
}

fn parse_for_repair<'a>(der: &'a CertificateDer<'_>) -> Result<x509_parser::prelude::X509Certificate<'a>> {
    cert::parse(der.as_ref()).map_err(|e| TrustError::ChainRepair(e.to_string()))
}

/// `caIssuers` URIs with an http or https scheme, in extension order.
fn usable_uris(cert: &x509_parser::prelude::X509Certificate<'_>) -> Vec<Url> {
    cert::ca_issuer_uris(cert)
        .into_iter()
        .filter_map(|raw| match Url::parse(&raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            Ok(_) => {
                debug!(uri = %raw, "ignoring non-HTTP issuer location");
                None
            }
            Err(e) => {
                debug!(uri = %raw, error = %e, "ignoring malformed issuer location");
                None
            }
        })
        .collect()
}
