//! `peertrust trust` - manage stored trust decisions.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use peertrust::{cert, thumbprint, DigestAlgorithm, Thumbprint, TrustStore, VerificationScope};

use super::Context;
use crate::cli::args::{TrustArgs, TrustCommands};
use crate::output::{print_json, OutputFormat};

pub fn execute(ctx: &Context, args: TrustArgs) -> Result<()> {
    match args.command {
        TrustCommands::Add { file, identities } => add(ctx, &file, &identities),
        TrustCommands::List => list(ctx),
        TrustCommands::Remove {
            thumbprint,
            identities,
        } => remove(ctx, &thumbprint, &identities),
    }
}

fn open(ctx: &Context) -> Result<TrustStore> {
    Ok(TrustStore::new(ctx.paths.open_store()?))
}

#[derive(Debug, Serialize)]
struct Change {
    scope: String,
    thumbprint: String,
    changed: bool,
}

fn add(ctx: &Context, file: &Path, identities: &[String]) -> Result<()> {
    let algorithm: DigestAlgorithm = ctx.settings()?.thumbprint_algorithm.parse()?;
    let certs = cert::load_certificates(file)?;
    let leaf = certs
        .first()
        .with_context(|| format!("no certificate in {}", file.display()))?;
    let tp = thumbprint(leaf, algorithm)?;

    let store = open(ctx)?;
    let mut changes = Vec::new();
    for scope in VerificationScope::for_identities(identities) {
        let already = store.is_trusted(&scope, &tp);
        store.trust_always(&scope, &tp)?;
        changes.push(Change {
            scope: scope.to_string(),
            thumbprint: tp.to_string(),
            changed: !already,
        });
    }

    report(ctx, &changes, "trusted", "already trusted")?;
    if ctx.output_format == OutputFormat::Pretty {
        println!("  {} {}", "subject:".dimmed(), cert::subject(leaf));
    }
    Ok(())
}

fn list(ctx: &Context) -> Result<()> {
    let store = open(ctx)?;
    let records: BTreeMap<String, Vec<String>> = store
        .persistent_scopes()
        .into_iter()
        .map(|key| {
            let tps = store
                .persistent(&key)
                .into_iter()
                .map(|tp| tp.to_string())
                .collect();
            (key, tps)
        })
        .collect();

    match ctx.output_format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Pretty => {
            if records.is_empty() {
                println!("{}", "No stored trust decisions.".dimmed());
            }
            for (key, tps) in &records {
                println!("{}", key.bold());
                for tp in tps {
                    println!("  {}", tp.cyan());
                }
            }
        }
    }
    Ok(())
}

fn remove(ctx: &Context, raw: &str, identities: &[String]) -> Result<()> {
    let tp: Thumbprint = raw.parse()?;
    let store = open(ctx)?;

    let mut changes = Vec::new();
    for scope in VerificationScope::for_identities(identities) {
        let changed = store.forget(&scope, &tp)?;
        changes.push(Change {
            scope: scope.to_string(),
            thumbprint: tp.to_string(),
            changed,
        });
    }

    report(ctx, &changes, "removed", "not found")?;
    if changes.iter().all(|c| !c.changed) {
        anyhow::bail!("thumbprint {tp} is not stored for the given scope(s)");
    }
    Ok(())
}

fn report(ctx: &Context, changes: &[Change], done: &str, unchanged: &str) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => print_json(changes)?,
        OutputFormat::Pretty => {
            for change in changes {
                let status = if change.changed {
                    done.green().bold()
                } else {
                    unchanged.yellow().bold()
                };
                println!("{status} {} for {}", change.thumbprint.cyan(), change.scope);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPaths;

    #[test]
    fn add_list_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            paths: ConfigPaths::resolve(Some(dir.path().join("trust.toml"))).unwrap(),
            output_format: OutputFormat::Json,
            verbose: false,
        };

        let tp: Thumbprint = "ab12".parse().unwrap();
        let scope = VerificationScope::identity("peer.example.com");
        open(&ctx).unwrap().trust_always(&scope, &tp).unwrap();

        let reopened = open(&ctx).unwrap();
        assert!(reopened.is_trusted(&scope, &tp));
        assert!(list(&ctx).is_ok());

        remove(&ctx, "AB12", &["peer.example.com".to_string()]).unwrap();
        assert!(!open(&ctx).unwrap().is_trusted(&scope, &tp));
        assert!(remove(&ctx, "ab12", &["peer.example.com".to_string()]).is_err());
    }
}
