//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigPaths;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = commands::Context {
        paths: ConfigPaths::resolve(cli.config)?,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Thumbprint(args) => commands::thumbprint::execute(&ctx, args),
        Commands::CompleteChain(args) => commands::complete_chain::execute(&ctx, args).await,
        Commands::Check(args) => commands::check::execute(&ctx, args).await,
        Commands::Trust(args) => commands::trust::execute(&ctx, args),
        Commands::Config(args) => commands::config::execute(&ctx, args),
    }
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "peertrust=debug,peertrust_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
