//! # peertrust-cli
//!
//! Command-line front end for the peertrust engine.
//!
//! ## Features
//!
//! - **Thumbprints**: digest every certificate of a PEM or DER file
//! - **Chain completion**: fetch missing intermediates through AIA
//! - **Live checks**: TLS handshake with the engine as verifier and a terminal prompt
//! - **Trust management**: add, list and remove stored decisions
//! - **Output formats**: pretty text or JSON

pub mod cli;
pub mod config;
pub mod output;
pub mod prompt;

pub use cli::run;
