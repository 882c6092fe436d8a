//! Whoever decides about certificates the checks could not vouch for.

use rustls_pki_types::CertificateDer;
use std::fmt;

use peertrust_core::{PromptReason, TrustDecision};

/// Makes the three-way trust decision, usually by asking a person.
///
/// Called synchronously from the handshake path; implementations may block.
pub trait DecisionPrompt: Send + Sync + fmt::Debug {
    fn ask(&self, chain: &[CertificateDer<'static>], reason: &PromptReason) -> TrustDecision;
}

/// Refuses everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompt;

impl DecisionPrompt for NonInteractivePrompt {
    fn ask(&self, _chain: &[CertificateDer<'static>], reason: &PromptReason) -> TrustDecision {
        tracing::info!(subject = %reason.subject, "no interactive prompt, not trusting");
        TrustDecision::DoNotTrust
    }
}
