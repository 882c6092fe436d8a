//! # peertrust
//!
//! Certificate trust-decision engine for TLS peers.
//!
//! Standard path validation answers "does this chain lead to a root I
//! know?". Real deployments need more: servers that forget to send their
//! intermediate, peers identified by an e-mail address instead of a
//! hostname, and users who knowingly accept a self-signed certificate once
//! and expect not to be asked again.
//!
//! ## Decision Flow
//!
//! ```text
//! chain ──► always-trust flag? ──yes──► accept
//!             │ no
//!             ▼
//!       AIA chain completion (best effort, cached, hop-bounded)
//!             │
//!             ▼
//!       platform path validation ──fail──┐
//!             │ ok                        │
//!             ▼                           │
//!       identity matcher ───────fail──────┤
//!             │ ok                        ▼
//!           accept            stored thumbprint for scope? ──yes──► accept
//!                                         │ no
//!                                         ▼
//!                             ask the decision prompt
//!                          DoNotTrust ► reject
//!                          TrustAlways ► persist, accept
//!                          TrustThisSessionOnly ► remember, accept
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use peertrust::{TrustService, WebPkiPathValidator, MemoryConfigStore};
//!
//! let service = TrustService::builder()
//!     .validator(Arc::new(WebPkiPathValidator::with_native_roots()?))
//!     .config(Arc::new(MemoryConfigStore::new()))
//!     .build()?;
//!
//! let verifier = service.trust_verifier(["sip.example.com"]);
//! let config = rustls::ClientConfig::builder()
//!     .dangerous()
//!     .with_custom_certificate_verifier(Arc::new(verifier))
//!     .with_no_client_auth();
//! ```

#![doc(html_root_url = "https://docs.rs/peertrust/0.3.0")]

pub mod aia;
pub mod cert;
pub mod clock;
pub mod config;
pub mod matcher;
pub mod prompt;
mod service;
pub mod store;
pub mod thumbprint;
pub mod validator;
mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use aia::{AiaCache, ChainCompleter, HttpIssuerFetcher, HttpIssuerFetcherBuilder, IssuerFetcher};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use matcher::{EmailMatcher, HostnameMatcher, IdentityMatcher};
pub use prompt::{DecisionPrompt, NonInteractivePrompt};
pub use service::{TrustService, TrustServiceBuilder};
pub use store::TrustStore;
pub use thumbprint::{thumbprint, DigestAlgorithm};
pub use validator::{PathValidator, WebPkiPathValidator};
pub use verifier::TrustVerifier;

pub use peertrust_core::*;
