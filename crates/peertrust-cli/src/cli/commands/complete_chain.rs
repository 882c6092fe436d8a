//! `peertrust complete-chain` - fetch missing intermediates.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use peertrust::cert;

use super::Context;
use crate::cli::args::CompleteChainArgs;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct Link {
    subject: String,
    issuer: String,
    fetched: bool,
}

pub async fn execute(ctx: &Context, args: CompleteChainArgs) -> Result<()> {
    let settings = ctx.settings()?;
    let presented = cert::load_certificates(&args.file)?;
    let presented_len = presented.len();

    let completer = ctx.completer(&settings);
    let chain = tokio::task::spawn_blocking(move || completer.complete_chain(&presented))
        .await
        .context("chain completion task failed")?;

    let mut links = Vec::with_capacity(chain.len());
    for (i, der) in chain.iter().enumerate() {
        let parsed = cert::parse(der.as_ref())?;
        links.push(Link {
            subject: parsed.subject().to_string(),
            issuer: parsed.issuer().to_string(),
            fetched: i >= presented_len,
        });
    }

    if let Some(out) = &args.out {
        std::fs::write(out, cert::to_pem(&chain))
            .with_context(|| format!("writing {}", out.display()))?;
    }

    match ctx.output_format {
        OutputFormat::Json => print_json(&links)?,
        OutputFormat::Pretty => {
            for (i, link) in links.iter().enumerate() {
                let marker = if link.fetched { " (fetched)".green().to_string() } else { String::new() };
                println!("[{i}] {}{marker}", link.subject.bold());
                println!("    {} {}", "issuer:".dimmed(), link.issuer);
            }
            let added = chain.len() - presented_len;
            if added == 0 {
                println!("{} chain unchanged", "Note:".yellow().bold());
            } else {
                println!("{} {added} certificate(s) fetched", "Success:".green().bold());
            }
            if let Some(out) = &args.out {
                println!("{} {}", "Wrote".dimmed(), out.display());
            }
        }
    }
    Ok(())
}
