//! `peertrust thumbprint` - digest every certificate of a file.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use peertrust::{cert, thumbprint, DigestAlgorithm};

use super::Context;
use crate::cli::args::ThumbprintArgs;
use crate::output::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct Entry {
    subject: String,
    algorithm: String,
    thumbprint: String,
}

pub fn execute(ctx: &Context, args: ThumbprintArgs) -> Result<()> {
    let algorithm: DigestAlgorithm = match args.algorithm {
        Some(name) => name.parse()?,
        None => ctx.settings()?.thumbprint_algorithm.parse()?,
    };

    let certs = cert::load_certificates(&args.file)?;
    let mut entries = Vec::with_capacity(certs.len());
    for der in &certs {
        entries.push(Entry {
            subject: cert::subject(der),
            algorithm: algorithm.to_string(),
            thumbprint: thumbprint(der, algorithm)?.to_string(),
        });
    }

    match ctx.output_format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Pretty => {
            for entry in &entries {
                println!("{}", entry.subject.bold());
                println!("  {} {}", format!("{}:", entry.algorithm).dimmed(), entry.thumbprint.cyan());
            }
        }
    }
    Ok(())
}
