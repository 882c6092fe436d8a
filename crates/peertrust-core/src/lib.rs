//! Core types and errors for the peertrust certificate trust-decision engine.
//!
//! This crate provides the foundational types shared by the engine and its
//! front ends:
//!
//! - **Types**: thumbprints, verification scopes, trust decisions and settings
//! - **Errors**: the [`TrustError`] taxonomy used across the workspace
//!
//! # Example
//!
//! ```rust
//! use peertrust_core::{Thumbprint, VerificationScope};
//!
//! let scope = VerificationScope::identity("sip.example.com");
//! assert_eq!(scope.config_key(), "peertrust.certservice.param.sip.example.com");
//!
//! let tp: Thumbprint = "A94A8FE5CCB19BA61C4C0873D391E987982FBBD3".parse().unwrap();
//! assert_eq!(tp.as_str(), "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3");
//! ```

#![doc(html_root_url = "https://docs.rs/peertrust-core/0.3.0")]

mod error;
pub mod types;

pub use error::{RejectReason, Result, TrustError};
pub use types::*;
