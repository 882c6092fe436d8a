//! X.509 helpers on top of `x509-parser`.

use rustls_pki_types::CertificateDer;
use std::net::IpAddr;
use std::path::Path;
use tracing::debug;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::{FromDer, X509Certificate};

use peertrust_core::{Result, TrustError};

/// `id-ad-caIssuers` access method of the AIA extension.
const OID_AD_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

/// Parse a DER-encoded X.509 certificate.
pub fn parse(der: &[u8]) -> Result<X509Certificate<'_>> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| TrustError::CertificateParse(e.to_string()))?;
    Ok(cert)
}

/// Human-readable subject of a certificate, for messages and logs.
pub fn subject(der: &CertificateDer<'_>) -> String {
    parse(der.as_ref()).map_or_else(
        |_| String::from("<unparseable certificate>"),
        |cert| cert.subject().to_string(),
    )
}

/// Subject and issuer are the same name.
pub fn is_self_signed(cert: &X509Certificate<'_>) -> bool {
    cert.subject().as_raw() == cert.issuer().as_raw()
}

/// URIs of all `caIssuers` access descriptions, in extension order.
pub fn ca_issuer_uris(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut uris = Vec::new();
    for ext in cert.extensions() {
        let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() else {
            continue;
        };
        for desc in &aia.accessdescs {
            if desc.access_method.to_id_string() != OID_AD_CA_ISSUERS {
                continue;
            }
            if let GeneralName::URI(uri) = &desc.access_location {
                uris.push((*uri).to_string());
            }
        }
    }
    uris
}

/// Whether the certificate carries an AIA extension at all.
pub fn has_authority_info_access(cert: &X509Certificate<'_>) -> bool {
    cert.extensions()
        .iter()
        .any(|ext| matches!(ext.parsed_extension(), ParsedExtension::AuthorityInfoAccess(_)))
}

/// SAN dNSName entries.
pub fn san_dns_names(cert: &X509Certificate<'_>) -> Vec<String> {
    san_entries(cert, |gn| match gn {
        GeneralName::DNSName(name) => Some((*name).to_string()),
        _ => None,
    })
}

/// SAN rfc822Name (e-mail) entries.
pub fn san_emails(cert: &X509Certificate<'_>) -> Vec<String> {
    san_entries(cert, |gn| match gn {
        GeneralName::RFC822Name(email) => Some((*email).to_string()),
        _ => None,
    })
}

/// SAN iPAddress entries.
pub fn san_ip_addresses(cert: &X509Certificate<'_>) -> Vec<IpAddr> {
    san_entries(cert, |gn| match gn {
        GeneralName::IPAddress(bytes) => ip_from_bytes(bytes),
        _ => None,
    })
}

fn san_entries<T>(
    cert: &X509Certificate<'_>,
    pick: impl Fn(&GeneralName<'_>) -> Option<T>,
) -> Vec<T> {
    match cert.subject_alternative_name() {
        Ok(Some(san)) => san.value.general_names.iter().filter_map(pick).collect(),
        Ok(None) => Vec::new(),
        Err(e) => {
            debug!(error = %e, "ignoring malformed subjectAltName");
            Vec::new()
        }
    }
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

/// Common Name attributes of the subject.
pub fn common_names(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.subject()
        .iter_common_name()
        .filter_map(|attr| attr.as_str().ok().map(str::to_string))
        .collect()
}

/// `emailAddress` attributes of the subject.
pub fn subject_emails(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.subject()
        .iter_email()
        .filter_map(|attr| attr.as_str().ok().map(str::to_string))
        .collect()
}

/// Decode a downloaded certificate, DER or PEM.
///
/// The bytes are checked to really be a certificate before being returned.
pub fn decode_certificate(bytes: &[u8]) -> Result<CertificateDer<'static>> {
    let der = if bytes.starts_with(b"-----BEGIN") {
        let pems = pem::parse_many(bytes).map_err(|e| TrustError::CertificateParse(e.to_string()))?;
        pems.into_iter()
            .find(|p| p.tag() == "CERTIFICATE")
            .map(pem::Pem::into_contents)
            .ok_or_else(|| TrustError::CertificateParse("no CERTIFICATE block in PEM".into()))?
    } else {
        bytes.to_vec()
    };

    parse(&der)?;
    Ok(CertificateDer::from(der))
}

/// Load every certificate of a PEM bundle or a single DER file.
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let path_str = path.display().to_string();
    let content = std::fs::read(path).map_err(|e| TrustError::io(&path_str, e))?;

    if !content.starts_with(b"-----BEGIN") {
        return decode_certificate(&content).map(|der| vec![der]);
    }

    let pems = pem::parse_many(&content).map_err(|e| TrustError::CertificateParse(format!(
        "{path_str}: {e}"
    )))?;

    let mut certs = Vec::new();
    for p in pems {
        if p.tag() != "CERTIFICATE" {
            continue;
        }
        if let Err(e) = parse(p.contents()) {
            debug!(path = %path_str, error = %e, "skipping cert in bundle");
            continue;
        }
        certs.push(CertificateDer::from(p.into_contents()));
    }

    if certs.is_empty() {
        return Err(TrustError::CertificateParse(format!(
            "{path_str}: no certificate found"
        )));
    }
    Ok(certs)
}

/// Encode certificates as a PEM bundle.
pub fn to_pem(chain: &[CertificateDer<'_>]) -> String {
    let pems: Vec<pem::Pem> = chain
        .iter()
        .map(|der| pem::Pem::new("CERTIFICATE", der.as_ref().to_vec()))
        .collect();
    pem::encode_many(&pems)
}
