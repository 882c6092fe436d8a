//! Terminal trust prompt.

use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use rustls_pki_types::CertificateDer;

use peertrust::cert;
use peertrust::{DecisionPrompt, DigestAlgorithm, PromptReason, TrustDecision};

/// Asks on the terminal, showing subject and thumbprint of every certificate.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    algorithm: DigestAlgorithm,
}

impl TerminalPrompt {
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }
}

const CHOICES: [(&str, TrustDecision); 3] = [
    ("Do not trust", TrustDecision::DoNotTrust),
    ("Trust always", TrustDecision::TrustAlways),
    ("Trust this session only", TrustDecision::TrustThisSessionOnly),
];

impl DecisionPrompt for TerminalPrompt {
    fn ask(&self, chain: &[CertificateDer<'static>], reason: &PromptReason) -> TrustDecision {
        eprintln!();
        eprintln!("{} {}", "Warning:".yellow().bold(), reason.message());
        eprintln!("  {} {}", "reason:".dimmed(), reason.detail);
        for (i, der) in chain.iter().enumerate() {
            let tp = peertrust::thumbprint(der, self.algorithm)
                .map_or_else(|e| e.to_string(), |tp| tp.to_string());
            eprintln!("  [{i}] {}", cert::subject(der).bold());
            eprintln!("      {} {}", format!("{}:", self.algorithm).dimmed(), tp);
        }
        eprintln!();

        let items: Vec<&str> = CHOICES.iter().map(|(label, _)| *label).collect();
        match Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Trust this certificate?")
            .items(&items)
            .default(0)
            .interact()
        {
            Ok(index) => CHOICES
                .get(index)
                .map_or(TrustDecision::DoNotTrust, |(_, decision)| *decision),
            Err(e) => {
                tracing::warn!(error = %e, "prompt failed, not trusting");
                TrustDecision::DoNotTrust
            }
        }
    }
}
