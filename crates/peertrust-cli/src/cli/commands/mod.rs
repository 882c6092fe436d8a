//! Command implementations.

pub mod check;
pub mod complete_chain;
pub mod config;
pub mod thumbprint;
pub mod trust;

use anyhow::Result;
use std::sync::Arc;

use peertrust::{ChainCompleter, HttpIssuerFetcher, SystemClock, TrustSettings};

use crate::config::ConfigPaths;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Configuration files
    pub paths: ConfigPaths,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl Context {
    /// Engine settings from `settings.toml`.
    pub fn settings(&self) -> Result<TrustSettings> {
        self.paths.load_settings()
    }

    /// Standalone AIA completer using the configured limits.
    pub fn completer(&self, settings: &TrustSettings) -> ChainCompleter {
        let fetcher = HttpIssuerFetcher::builder()
            .timeout(settings.aia.fetch_timeout())
            .user_agent(format!(
                "{}/{}",
                settings.application_name,
                env!("CARGO_PKG_VERSION")
            ))
            .build();
        ChainCompleter::new(Arc::new(fetcher), Arc::new(SystemClock), &settings.aia)
    }
}
