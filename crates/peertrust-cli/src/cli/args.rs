//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Certificate trust decisions for TLS peers
///
/// Compute thumbprints, repair chains through AIA, check live servers and
/// manage the certificates you decided to trust.
#[derive(Parser, Debug)]
#[command(name = "peertrust")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Trust store file (defaults to the platform config directory)
    #[arg(short, long, env = "PEERTRUST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the thumbprint of every certificate in a file
    Thumbprint(ThumbprintArgs),

    /// Download missing intermediates named by the AIA extension
    CompleteChain(CompleteChainArgs),

    /// Connect to a TLS server and decide whether to trust it
    Check(CheckArgs),

    /// Manage stored trust decisions
    Trust(TrustArgs),

    /// Manage configuration flags
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ThumbprintArgs {
    /// PEM bundle or DER certificate
    pub file: PathBuf,

    /// Digest algorithm (SHA1, SHA256, SHA384, SHA512)
    #[arg(short, long)]
    pub algorithm: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompleteChainArgs {
    /// PEM bundle or DER certificate; only a single leaf gets completed
    pub file: PathBuf,

    /// Write the completed chain as PEM
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Server as host or host:port (port defaults to 443)
    pub target: String,

    /// Expected identity; repeatable. Defaults to the host.
    #[arg(short, long = "identity")]
    pub identities: Vec<String>,

    /// Extra trust anchors (PEM bundle)
    #[arg(long)]
    pub ca_file: Option<PathBuf>,

    /// Never prompt; unverifiable certificates are rejected
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Args, Debug)]
pub struct TrustArgs {
    #[command(subcommand)]
    pub command: TrustCommands,
}

#[derive(Subcommand, Debug)]
pub enum TrustCommands {
    /// Trust a certificate permanently
    Add {
        /// PEM or DER file; the first certificate is used
        file: PathBuf,

        /// Identity the decision applies to; repeatable. Global when omitted.
        #[arg(short, long = "identity")]
        identities: Vec<String>,
    },

    /// List stored decisions
    List,

    /// Forget a stored decision
    Remove {
        /// Thumbprint as printed by `thumbprint` or `trust list`
        thumbprint: String,

        /// Identity the decision applies to; repeatable. Global when omitted.
        #[arg(short, long = "identity")]
        identities: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show settings and flags
    Show,

    /// Set a flag
    Set {
        /// always_trust or no_user_interaction
        key: String,

        /// true or false
        value: String,
    },

    /// Show configuration file paths
    Path,
}
