//! Error types for Dirgate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure of a directory authentication attempt.
///
/// Messages are meant to be shown to operators and end users. They may name
/// the account, never the password.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid configuration or a directory capability that is not available
    #[error("Directory configuration error: {0}")]
    Configuration(String),

    /// Connect, timeout or search request failure
    #[error("Directory transport error: {0}")]
    Transport(String),

    /// Bind rejected by the directory
    #[error("Authentication failed: {0}")]
    Credential(String),

    /// No entry, several entries, or an incomplete entry
    #[error("Could not resolve user: {0}")]
    Lookup(String),

    /// Valid account outside the permitted groups
    #[error("Access denied: {0}")]
    Policy(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "ConfigurationError",
            AuthError::Transport(_) => "TransportError",
            AuthError::Credential(_) => "CredentialError",
            AuthError::Lookup(_) => "LookupError",
            AuthError::Policy(_) => "PolicyError",
        }
    }

    /// Whether the failure says something about the submitted account rather
    /// than about the directory or its configuration.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AuthError::Credential(_) | AuthError::Lookup(_) | AuthError::Policy(_)
        )
    }
}
