//! Submitted login credentials

use std::fmt;

/// Account name and password submitted for one login attempt.
///
/// Never serialized; `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account_name: String,
    pub password: String,
}

impl Credential {
    pub fn new(account_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            password: password.into(),
        }
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_name", &self.account_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let cred = Credential::new("EXAMPLE\\bob", "hunter2");
        let out = format!("{:?}", cred);
        assert!(out.contains("EXAMPLE\\\\bob"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn test_has_password() {
        assert!(Credential::new("bob", "x").has_password());
        assert!(!Credential::new("bob", "").has_password());
    }
}
