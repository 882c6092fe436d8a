//! `peertrust check` - TLS handshake with the trust engine as verifier.

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use peertrust::{
    cert, DecisionPrompt, DigestAlgorithm, NonInteractivePrompt, PathValidator, TrustService,
    WebPkiPathValidator,
};

use super::Context;
use crate::cli::args::CheckArgs;
use crate::output::{print_json, OutputFormat};
use crate::prompt::TerminalPrompt;

/// Default TLS port
const DEFAULT_PORT: u16 = 443;

#[derive(Debug, Serialize)]
struct Report {
    host: String,
    port: u16,
    identities: Vec<String>,
    trusted: bool,
    protocol: Option<String>,
    cipher_suite: Option<String>,
    error: Option<String>,
}

pub async fn execute(ctx: &Context, args: CheckArgs) -> Result<()> {
    let (host, port) = split_target(&args.target)?;
    let identities = if args.identities.is_empty() {
        vec![host.clone()]
    } else {
        args.identities.clone()
    };

    let settings = ctx.settings()?;
    let algorithm: DigestAlgorithm = settings.thumbprint_algorithm.parse()?;
    let validator: Arc<dyn PathValidator> = match &args.ca_file {
        Some(path) => Arc::new(WebPkiPathValidator::with_native_roots_and(
            cert::load_certificates(path)?,
        )?),
        None => Arc::new(WebPkiPathValidator::with_native_roots()?),
    };
    let prompt: Arc<dyn DecisionPrompt> = if args.non_interactive {
        Arc::new(NonInteractivePrompt)
    } else {
        Arc::new(TerminalPrompt::new(algorithm))
    };

    let service = TrustService::builder()
        .settings(settings)
        .config(ctx.paths.open_store()?)
        .validator(validator)
        .prompt(prompt)
        .build()?;
    let verifier = Arc::new(service.trust_verifier(identities.clone()));

    let config = ClientConfig::builder_with_provider(WebPkiPathValidator::crypto_provider())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.clone())
        .with_context(|| format!("invalid server name: {host}"))?;

    let tcp = TcpStream::connect((host.as_str(), port))
        .await
        .with_context(|| format!("connecting to {host}:{port}"))?;
    tracing::debug!(host = %host, port, "TCP connected, starting handshake");

    let mut report = Report {
        host: host.clone(),
        port,
        identities,
        trusted: false,
        protocol: None,
        cipher_suite: None,
        error: None,
    };
    match connector.connect(server_name, tcp).await {
        Ok(tls) => {
            let (_, conn) = tls.get_ref();
            report.trusted = true;
            report.protocol = conn.protocol_version().map(|v| format!("{v:?}"));
            report.cipher_suite = conn
                .negotiated_cipher_suite()
                .map(|s| format!("{:?}", s.suite()));
        }
        Err(e) => report.error = Some(e.to_string()),
    }

    match ctx.output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => {
            let target = format!("{}:{}", report.host, report.port);
            if report.trusted {
                println!("{} {} is trusted", "Success:".green().bold(), target.cyan());
                if let (Some(proto), Some(suite)) = (&report.protocol, &report.cipher_suite) {
                    println!("  {} {proto}, {suite}", "negotiated:".dimmed());
                }
            } else {
                println!("{} {} is not trusted", "Rejected:".red().bold(), target.cyan());
            }
        }
    }

    match report.error {
        Some(error) => anyhow::bail!("TLS handshake with {host}:{port} failed: {error}"),
        None => Ok(()),
    }
}

/// `host`, `host:port`, `[v6]` or `[v6]:port`.
fn split_target(target: &str) -> Result<(String, u16)> {
    if let Some(rest) = target.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| anyhow::anyhow!("unterminated IPv6 literal: {target}"))?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().with_context(|| format!("invalid port in {target}"))?,
            None if tail.is_empty() => DEFAULT_PORT,
            None => anyhow::bail!("unexpected text after IPv6 literal: {target}"),
        };
        return Ok((host.to_string(), port));
    }

    match target.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            let port = port.parse().with_context(|| format!("invalid port in {target}"))?;
            Ok((host.to_string(), port))
        }
        _ => Ok((target.to_string(), DEFAULT_PORT)),
    }
}
