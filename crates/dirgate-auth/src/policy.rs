//! Group-membership policy

use crate::ldap::DirectoryEntry;
use dirgate_core::{AuthError, LdapConfig, Result};
use regex::Regex;
use tracing::debug;

/// Requires one value of the membership attribute to match a pattern
#[derive(Debug, Clone)]
pub struct MembershipPolicy {
    attribute: String,
    pattern: Regex,
}

impl MembershipPolicy {
    pub fn new(attribute: &str, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            AuthError::Configuration(format!("Invalid membership pattern: {}", e))
        })?;

        Ok(Self {
            attribute: attribute.to_string(),
            pattern,
        })
    }

    /// Build the policy from `member_of_pattern`, `None` when unset
    pub fn from_config(config: &LdapConfig) -> Result<Option<Self>> {
        config
            .member_of_pattern
            .as_deref()
            .map(|p| Self::new(&config.attributes.member_of, p))
            .transpose()
    }

    /// Allow on the first matching value. A missing or empty attribute denies.
    pub fn check(&self, entry: &DirectoryEntry, login: &str) -> Result<()> {
        let values = entry.values(&self.attribute).unwrap_or_default();

        if values.is_empty() {
            return Err(AuthError::Policy(format!(
                "'{}' has no {} values to check",
                login, self.attribute
            )));
        }

        match values.iter().find(|v| self.pattern.is_match(v)) {
            Some(group) => {
                debug!("Membership of {} matched {}", login, group);
                Ok(())
            }
            None => Err(AuthError::Policy(format!(
                "'{}' is not a member of an allowed group",
                login
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> MembershipPolicy {
        MembershipPolicy::new("memberOf", "^CN=Wiki Users,").unwrap()
    }

    #[test]
    fn test_match_any_value() {
        let entry = DirectoryEntry::new("CN=Bob,DC=example,DC=com").with_attr(
            "memberOf",
            [
                "CN=Domain Users,CN=Users,DC=example,DC=com",
                "CN=Wiki Users,OU=Groups,DC=example,DC=com",
            ],
        );

        assert!(policy().check(&entry, "bob").is_ok());
    }

    #[test]
    fn test_no_match_denies() {
        let entry = DirectoryEntry::new("CN=Bob,DC=example,DC=com")
            .with_attr("memberOf", ["CN=Domain Users,CN=Users,DC=example,DC=com"]);

        let err = policy().check(&entry, "bob").unwrap_err();
        assert_eq!(err.code(), "PolicyError");
    }

    #[test]
    fn test_missing_attribute_fails_closed() {
        let entry = DirectoryEntry::new("CN=Bob,DC=example,DC=com").with_attr("mail", ["b@x.io"]);
        assert!(matches!(policy().check(&entry, "bob"), Err(AuthError::Policy(_))));

        let entry = entry.with_attr("memberOf", Vec::<String>::new());
        assert!(matches!(policy().check(&entry, "bob"), Err(AuthError::Policy(_))));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = MembershipPolicy::new("memberOf", "(unclosed").unwrap_err();
        assert_eq!(err.code(), "ConfigurationError");
    }

    #[test]
    fn test_from_config() {
        let mut config = LdapConfig::default();
        assert!(MembershipPolicy::from_config(&config).unwrap().is_none());

        config.member_of_pattern = Some("staff".to_string());
        assert!(MembershipPolicy::from_config(&config).unwrap().is_some());
    }
}
