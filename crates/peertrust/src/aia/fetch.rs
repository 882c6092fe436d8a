//! Issuer certificate downloads.

use std::fmt;
use std::io::Read;
use std::time::Duration;
use tracing::debug;
use url::Url;

use peertrust_core::{Result, TrustError};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest issuer certificate body accepted, in bytes.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Downloads the body behind an AIA `caIssuers` URI.
pub trait IssuerFetcher: Send + Sync + fmt::Debug {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher built on `reqwest`.
///
/// Every request runs on a scoped worker thread with its own client, so the
/// fetcher can be called from handshake code running inside an async
/// runtime without tripping reqwest's blocking-client guard. The caller
/// still waits for the worker, up to the configured timeout.
///
/// Bodies larger than [`MAX_BODY_BYTES`] are rejected.
#[derive(Debug, Clone)]
pub struct HttpIssuerFetcher {
    timeout: Duration,
    user_agent: String,
}

impl HttpIssuerFetcher {
    /// Fetcher with default settings
    #[must_use]
    pub fn new() -> Self {
        HttpIssuerFetcherBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> HttpIssuerFetcherBuilder {
        HttpIssuerFetcherBuilder::new()
    }

    fn fetch_blocking(&self, uri: &Url) -> Result<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| TrustError::Http(e.to_string()))?;

        debug!(uri = %uri, "GET issuer certificate");
        let response = client
            .get(uri.as_str())
            .send()
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrustError::Http(format!("{uri} returned {status}")));
        }

        if let Some(len) = response.content_length().filter(|len| *len > MAX_BODY_BYTES) {
            return Err(TrustError::Http(format!(
                "{uri} announced {len} bytes, limit is {MAX_BODY_BYTES}"
            )));
        }

        let mut body = Vec::new();
        response
            .take(MAX_BODY_BYTES + 1)
            .read_to_end(&mut body)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut => TrustError::Timeout(self.timeout.as_secs()),
                _ => TrustError::Http(format!("reading {uri}: {e}")),
            })?;
        if u64::try_from(body.len()).map_or(true, |len| len > MAX_BODY_BYTES) {
            return Err(TrustError::Http(format!(
                "{uri} body exceeds {MAX_BODY_BYTES} bytes"
            )));
        }
        Ok(body)
    }

    fn map_error(&self, e: &reqwest::Error) -> TrustError {
        if e.is_timeout() {
            TrustError::Timeout(self.timeout.as_secs())
        } else {
            TrustError::Http(e.to_string())
        }
    }
}

impl Default for HttpIssuerFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl IssuerFetcher for HttpIssuerFetcher {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>> {
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.fetch_blocking(uri))
                .join()
                .unwrap_or_else(|_| Err(TrustError::Http(format!("fetch worker for {uri} panicked"))))
        })
    }
}

/// Builder for [`HttpIssuerFetcher`]
#[derive(Debug, Clone)]
pub struct HttpIssuerFetcherBuilder {
    timeout: Duration,
    user_agent: String,
}

impl HttpIssuerFetcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("peertrust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Build the fetcher
    #[must_use]
    pub fn build(self) -> HttpIssuerFetcher {
        HttpIssuerFetcher {
            timeout: self.timeout,
            user_agent: self.user_agent,
        }
    }
}

impl Default for HttpIssuerFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
