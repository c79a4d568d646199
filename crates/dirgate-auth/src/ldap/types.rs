//! Directory entry and query types

use dirgate_core::{AuthError, Result};
use std::collections::HashMap;

// ============================================================================
// Directory Entry
// ============================================================================

/// One entry returned by a directory search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name
    pub dn: String,

    /// Attribute name to values
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// First value of an attribute.
    ///
    /// Attribute names are case-insensitive in LDAP; an exact match is tried
    /// first.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// All values of an attribute
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attrs
            .get(name)
            .or_else(|| {
                self.attrs
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(|v| v.as_slice())
    }
}

// ============================================================================
// Directory Query
// ============================================================================

/// Subtree search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryQuery {
    pub base_dn: String,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl DirectoryQuery {
    /// `(attribute=value)` with the value filter-escaped
    pub fn equality(base_dn: &str, attribute: &str, value: &str, attributes: &[&str]) -> Self {
        Self {
            base_dn: base_dn.to_string(),
            filter: format!("({}={})", attribute, crate::escape::escape_filter(value)),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Template filter with `%name%` replaced by the filter-escaped value
    pub fn template(
        base_dn: &str,
        template: &str,
        value: &str,
        attributes: &[&str],
    ) -> Self {
        Self {
            base_dn: base_dn.to_string(),
            filter: template.replace(
                dirgate_core::config::NAME_PLACEHOLDER,
                &crate::escape::escape_filter(value),
            ),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Require exactly one entry; never pick among several
pub fn single_entry(mut entries: Vec<DirectoryEntry>, login: &str) -> Result<DirectoryEntry> {
    match entries.len() {
        1 => Ok(entries.remove(0)),
        0 => Err(AuthError::Lookup(format!(
            "could not find account '{}'",
            login
        ))),
        n => Err(AuthError::Lookup(format!(
            "account '{}' is ambiguous ({} entries matched)",
            login, n
        ))),
    }
}
