//! Identity matching against the leaf certificate.
//!
//! Path validation proves a chain is anchored; a matcher proves the leaf
//! belongs to the peer we meant to talk to. Servers are named by host,
//! clients (SIP, XMPP, mail peers) by e-mail address.

use rustls_pki_types::CertificateDer;
use std::fmt;
use std::net::IpAddr;
use x509_parser::prelude::X509Certificate;

use peertrust_core::{Result, TrustError};

use crate::cert;

/// Checks that a leaf certificate belongs to one of the expected identities.
pub trait IdentityMatcher: Send + Sync + fmt::Debug {
    /// Succeeds when at least one expected identity matches.
    fn verify(&self, expected: &[String], leaf: &CertificateDer<'_>) -> Result<()>;
}

/// Hostname and IP-literal matching (RFC 6125 style).
#[derive(Debug, Clone, Copy, Default)]
pub struct HostnameMatcher;

impl IdentityMatcher for HostnameMatcher {
    fn verify(&self, expected: &[String], leaf: &CertificateDer<'_>) -> Result<()> {
        let parsed = cert::parse(leaf.as_ref())?;
        if expected.iter().any(|id| host_matches(&parsed, id)) {
            return Ok(());
        }
        Err(mismatch(expected, &parsed))
    }
}

/// E-mail address matching.
///
/// Uses SAN rfc822Name entries, then `emailAddress` attributes of the subject.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailMatcher;

impl IdentityMatcher for EmailMatcher {
    fn verify(&self, expected: &[String], leaf: &CertificateDer<'_>) -> Result<()> {
        let parsed = cert::parse(leaf.as_ref())?;
        let mut emails = cert::san_emails(&parsed);
        emails.extend(cert::subject_emails(&parsed));

        let found = expected
            .iter()
            .any(|id| emails.iter().any(|email| email.eq_ignore_ascii_case(id.trim())));
        if found {
            return Ok(());
        }
        Err(mismatch(expected, &parsed))
    }
}

fn mismatch(expected: &[String], cert: &X509Certificate<'_>) -> TrustError {
    TrustError::IdentityMismatch {
        expected: expected.to_vec(),
        subject: cert.subject().to_string(),
    }
}

fn host_matches(cert: &X509Certificate<'_>, identity: &str) -> bool {
    let identity = identity.trim();
    let literal = identity.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return cert::san_ip_addresses(cert).contains(&ip);
    }

    let host = normalize(identity);
    let dns_names = cert::san_dns_names(cert);
    if !dns_names.is_empty() {
        return dns_names.iter().any(|pattern| pattern_matches(pattern, &host));
    }

    // CN only counts when there is no dNSName SAN.
    cert::common_names(cert)
        .iter()
        .any(|cn| pattern_matches(cn, &host))
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Match `host` against a certificate name, possibly `*.domain`.
fn pattern_matches(pattern: &str, host: &str) -> bool {
    let pattern = normalize(pattern);
    let Some(base) = pattern.strip_prefix("*.") else {
        return pattern == host;
    };

    if base.contains('*') || base.split('.').count() < 2 {
        return false;
    }
    match host.split_once('.') {
        Some((label, rest)) => !label.is_empty() && rest == base,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Authority;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn wildcard_rules() {
        assert!(pattern_matches("*.example.com", "www.example.com"));
        assert!(pattern_matches("*.Example.COM.", "WWW.example.com"));
        assert!(!pattern_matches("*.example.com", "a.b.example.com"));
        assert!(!pattern_matches("*.example.com", "example.com"));
        assert!(!pattern_matches("*.com", "example.com"));
        assert!(!pattern_matches("w*.example.com", "www.example.com"));
        assert!(pattern_matches("example.com", "example.com"));
    }

    #[test]
    fn hostname_against_san() {
        let root = Authority::root("Test Root");
        let leaf = root.leaf("ignored.example.org", &["*.example.com", "example.net"]);

        assert!(HostnameMatcher.verify(&ids(&["www.example.com"]), &leaf).is_ok());
        assert!(HostnameMatcher.verify(&ids(&["example.net."]), &leaf).is_ok());
        // CN is not consulted when dNSName SANs exist.
        assert!(HostnameMatcher
            .verify(&ids(&["ignored.example.org"]), &leaf)
            .is_err());
    }

    #[test]
    fn hostname_falls_back_to_cn() {
        let root = Authority::root("Test Root");
        let leaf = root.leaf("legacy.example.com", &[]);
        assert!(HostnameMatcher.verify(&ids(&["legacy.example.com"]), &leaf).is_ok());
    }

    #[test]
    fn ip_identities_use_ip_sans() {
        let root = Authority::root("Test Root");
        let leaf = root.leaf("10.0.0.1", &["192.0.2.7", "2001:db8::1"]);

        assert!(HostnameMatcher.verify(&ids(&["192.0.2.7"]), &leaf).is_ok());
        assert!(HostnameMatcher.verify(&ids(&["[2001:db8::1]"]), &leaf).is_ok());
        assert!(HostnameMatcher.verify(&ids(&["10.0.0.1"]), &leaf).is_err());
    }

    #[test]
    fn email_matching_is_or_over_identities() {
        let root = Authority::root("Test Root");
        let leaf = root.email_leaf("Alice", &["alice@example.com"]);

        let ok = EmailMatcher.verify(&ids(&["bob@example.com", "ALICE@example.com"]), &leaf);
        assert!(ok.is_ok());

        let err = EmailMatcher
            .verify(&ids(&["bob@example.com", "carol@example.com"]), &leaf)
            .unwrap_err();
        match err {
            TrustError::IdentityMismatch { expected, subject } => {
                assert_eq!(expected, ids(&["bob@example.com", "carol@example.com"]));
                assert!(subject.contains("Alice"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn email_from_subject_attribute() {
        let root = Authority::root("Test Root");
        let leaf = root.subject_email_leaf("Carol", "carol@example.com");
        assert!(EmailMatcher.verify(&ids(&["carol@example.com"]), &leaf).is_ok());
    }
}
