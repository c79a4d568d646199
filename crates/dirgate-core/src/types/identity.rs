//! Authentication outcome types

use serde::{Deserialize, Serialize};

/// Identity record handed to the host application after a successful bind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login fragment the directory entry was looked up by
    pub username: String,

    /// Distinguished name of the directory entry
    pub dn: String,

    /// Email address (first value of the email attribute)
    pub email: String,

    /// Display name, the login fragment when the directory has none
    pub display_name: String,

    /// Whether the host should create a local account for unknown users
    pub auto_create_account: bool,
}

/// Outcome of an authentication attempt that did not fail.
///
/// Failures are reported through [`crate::AuthError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AuthResult {
    /// The directory accepted the credential
    Success(Identity),
    /// The host application should verify the credential itself
    Fallback,
}

impl AuthResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Success(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AuthResult::Fallback)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthResult::Success(identity) => Some(identity),
            AuthResult::Fallback => None,
        }
    }
}
