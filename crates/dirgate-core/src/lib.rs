//! Dirgate Core Library
//!
//! Configuration, result and error types shared by the Dirgate directory
//! authentication crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AttributeMappings, BindMode, DirgateConfig, LdapConfig, LoggingConfig};
pub use error::{AuthError, Result};
pub use types::{AuthResult, Credential, Identity};

/// Dirgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
