//! `peertrust config` - flags and settings.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use peertrust::{ConfigStore, ALWAYS_TRUST_KEY, NO_USER_INTERACTION_KEY, TRUST_KEY_PREFIX};

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::{print_json, OutputFormat};

pub fn execute(ctx: &Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value),
        ConfigCommands::Path => show_path(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let settings = ctx.settings()?;
    let store = ctx.paths.open_store()?;
    let always_trust = store.get_bool(ALWAYS_TRUST_KEY, settings.always_trust);
    let no_user_interaction = store.get_bool(NO_USER_INTERACTION_KEY, settings.no_user_interaction);
    let stored = store
        .entries()
        .iter()
        .filter(|(k, _)| k.starts_with(TRUST_KEY_PREFIX))
        .count();

    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({
            "settings": settings,
            "always_trust": always_trust,
            "no_user_interaction": no_user_interaction,
            "trust_records": stored,
        }))?,
        OutputFormat::Pretty => {
            println!("{}", "Current Configuration:".bold());
            println!();
            println!("  {} {}", "application_name:".bold(), settings.application_name);
            println!("  {} {}", "thumbprint_algorithm:".bold(), settings.thumbprint_algorithm);
            println!("  {} {}", "always_trust:".bold(), flag(always_trust));
            println!("  {} {}", "no_user_interaction:".bold(), flag(no_user_interaction));
            println!("  {} {}", "aia.max_hops:".bold(), settings.aia.max_hops);
            println!("  {} {}s", "aia.cache_ttl:".bold(), settings.aia.cache_ttl_secs);
            println!("  {} {}s", "aia.fetch_timeout:".bold(), settings.aia.fetch_timeout_secs);
            println!("  {} {}", "trust records:".bold(), stored);
        }
    }
    Ok(())
}

fn flag(value: bool) -> String {
    if value {
        "true".red().bold().to_string()
    } else {
        "false".to_string()
    }
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let full_key = match key {
        "always_trust" | ALWAYS_TRUST_KEY => ALWAYS_TRUST_KEY,
        "no_user_interaction" | NO_USER_INTERACTION_KEY => NO_USER_INTERACTION_KEY,
        _ => anyhow::bail!(
            "Unknown config key: {}\n\n\
             Available keys:\n  \
             always_trust         - Accept every certificate without checks (true/false)\n  \
             no_user_interaction  - Never prompt, reject what cannot be verified (true/false)\n\n\
             Engine settings live in settings.toml (see `peertrust config path`).",
            key
        ),
    };
    let parsed: bool = value
        .parse()
        .map_err(|_| anyhow::anyhow!("expected true or false, got {value}"))?;

    let store = ctx.paths.open_store()?;
    store.set_string(full_key, &parsed.to_string())?;
    println!("{} {} set to {}.", "Success:".green().bold(), full_key, parsed.to_string().cyan());
    if full_key == ALWAYS_TRUST_KEY && parsed {
        println!(
            "{} every certificate will now be accepted without verification.",
            "Warning:".yellow().bold()
        );
    }
    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({
            "trust": ctx.paths.trust,
            "settings": ctx.paths.settings,
        }))?,
        OutputFormat::Pretty => {
            println!("{}", ctx.paths.trust.display());
            println!("{}", ctx.paths.settings.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPaths;

    #[test]
    fn set_accepts_short_and_full_keys() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            paths: ConfigPaths::resolve(Some(dir.path().join("trust.toml"))).unwrap(),
            output_format: OutputFormat::Json,
            verbose: false,
        };

        set_config(&ctx, "no_user_interaction", "true").unwrap();
        set_config(&ctx, ALWAYS_TRUST_KEY, "false").unwrap();
        assert!(set_config(&ctx, "api_key", "x").is_err());
        assert!(set_config(&ctx, "always_trust", "maybe").is_err());

        let store = ctx.paths.open_store().unwrap();
        assert!(store.get_bool(NO_USER_INTERACTION_KEY, false));
        assert!(!store.get_bool(ALWAYS_TRUST_KEY, true));
    }
}
