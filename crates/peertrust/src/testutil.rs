//! Certificate fixtures minted with `rcgen`.

use parking_lot::Mutex;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CustomExtension, DistinguishedName, DnType,
    IsCa, KeyPair, SanType,
};
use rustls_pki_types::CertificateDer;
use std::collections::HashMap;
use url::Url;

use peertrust_core::{PromptReason, Result, TrustDecision, TrustError};

use crate::aia::IssuerFetcher;
use crate::prompt::DecisionPrompt;

/// `id-pe-authorityInfoAccess`.
const OID_PE_AIA: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 1];

/// DER body of the `id-ad-caIssuers` OID.
pub const CA_ISSUERS: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02];

/// DER body of the `id-ad-ocsp` OID.
pub const OCSP: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01];

/// A CA able to sign test certificates.
pub struct Authority {
    cert: Certificate,
    key: KeyPair,
}

impl Authority {
    /// Self-signed root CA.
    pub fn root(cn: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = ca_params(cn, &[]).self_signed(&key).unwrap();
        Self { cert, key }
    }

    /// Intermediate CA signed by `self`, optionally carrying AIA entries.
    pub fn intermediate(&self, cn: &str, aia: &[(&[u8], &str)]) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = ca_params(cn, aia)
            .signed_by(&key, &self.cert, &self.key)
            .unwrap();
        Self { cert, key }
    }

    /// DER of this CA's certificate.
    pub fn der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    /// Leaf with DNS names (or IP literals) as SANs.
    pub fn leaf(&self, cn: &str, dns_names: &[&str]) -> CertificateDer<'static> {
        let sans = dns_names
            .iter()
            .map(|name| match name.parse() {
                Ok(ip) => SanType::IpAddress(ip),
                Err(_) => SanType::DnsName((*name).try_into().unwrap()),
            })
            .collect();
        self.leaf_with(cn, sans, &[], None)
    }

    /// Leaf with e-mail SANs.
    pub fn email_leaf(&self, cn: &str, emails: &[&str]) -> CertificateDer<'static> {
        let sans = emails
            .iter()
            .map(|email| SanType::Rfc822Name((*email).try_into().unwrap()))
            .collect();
        self.leaf_with(cn, sans, &[], None)
    }

    /// Leaf without SANs whose only identity is an `emailAddress` in the subject.
    pub fn subject_email_leaf(&self, cn: &str, email: &str) -> CertificateDer<'static> {
        self.leaf_with(cn, Vec::new(), &[], Some(email))
    }

    /// Leaf carrying AIA entries.
    pub fn leaf_with_aia(&self, cn: &str, aia: &[(&[u8], &str)]) -> CertificateDer<'static> {
        self.leaf_with(cn, Vec::new(), aia, None)
    }

    fn leaf_with(
        &self,
        cn: &str,
        sans: Vec<SanType>,
        aia: &[(&[u8], &str)],
        subject_email: Option<&str>,
    ) -> CertificateDer<'static> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        if let Some(email) = subject_email {
            dn.push(DnType::CustomDnType(vec![1, 2, 840, 113_549, 1, 9, 1]), email);
        }
        params.distinguished_name = dn;
        params.subject_alt_names = sans;
        if !aia.is_empty() {
            params.custom_extensions.push(aia_extension(aia));
        }
        params
            .signed_by(&key, &self.cert, &self.key)
            .unwrap()
            .der()
            .clone()
    }
}

fn ca_params(cn: &str, aia: &[(&[u8], &str)]) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    if !aia.is_empty() {
        params.custom_extensions.push(aia_extension(aia));
    }
    params
}

/// Hand-encoded `AuthorityInfoAccessSyntax` with URI locations.
fn aia_extension(entries: &[(&[u8], &str)]) -> CustomExtension {
    let mut descs = Vec::new();
    for (method, uri) in entries {
        let mut desc = Vec::new();
        desc.extend(tlv(0x06, method));
        desc.extend(tlv(0x86, uri.as_bytes()));
        descs.extend(tlv(0x30, &desc));
    }
    CustomExtension::from_oid_content(OID_PE_AIA, tlv(0x30, &descs))
}

fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = value.len();
    if len < 0x80 {
        out.push(u8::try_from(len).unwrap());
    } else if len <= 0xff {
        out.push(0x81);
        out.push(u8::try_from(len).unwrap());
    } else {
        out.push(0x82);
        out.extend(u16::try_from(len).unwrap().to_be_bytes());
    }
    out.extend_from_slice(value);
    out
}

/// In-memory issuer fetcher counting requests per URI.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticFetcher {
    pub fn serve(&self, uri: &str, body: impl Into<Vec<u8>>) {
        self.bodies.lock().insert(uri.to_string(), body.into());
    }

    pub fn calls(&self, uri: &str) -> usize {
        self.calls.lock().get(uri).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

impl IssuerFetcher for StaticFetcher {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>> {
        *self.calls.lock().entry(uri.to_string()).or_insert(0) += 1;
        self.bodies
            .lock()
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| TrustError::Http(format!("{uri} returned 404 Not Found")))
    }
}

/// Decision prompt answering from a script and recording what it was asked.
#[derive(Debug)]
pub struct ScriptedPrompt {
    decision: TrustDecision,
    asked: Mutex<Vec<PromptReason>>,
}

impl ScriptedPrompt {
    pub fn new(decision: TrustDecision) -> Self {
        Self {
            decision,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<PromptReason> {
        self.asked.lock().clone()
    }
}

impl DecisionPrompt for ScriptedPrompt {
    fn ask(&self, _chain: &[CertificateDer<'static>], reason: &PromptReason) -> TrustDecision {
        self.asked.lock().push(reason.clone());
        self.decision
    }
}
