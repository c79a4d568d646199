//! Account name normalization
//!
//! Accepted shapes are `DOMAIN\login`, `login@realm` and a bare `login`.

/// Account name split into the bind principal and the login fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAccount {
    /// Identifier presented to the directory in a domain bind
    pub principal: String,
    /// Login fragment used to search for the directory entry
    pub login: String,
}

/// Extract the login fragment from a raw account name.
///
/// In principal-name mode the raw input is returned unchanged. Never fails:
/// input without a separator is the login.
pub fn login_fragment(raw: &str, principal_name_mode: bool) -> &str {
    if principal_name_mode {
        return raw;
    }

    if let Some((_, login)) = raw.split_once('\\') {
        login
    } else if let Some((login, _)) = raw.split_once('@') {
        login
    } else {
        raw
    }
}

/// Normalize for a domain-qualified bind.
///
/// A bare login becomes `DOMAIN\login`; qualified input is bound as given.
pub fn normalize(raw: &str, domain: &str, principal_name_mode: bool) -> NormalizedAccount {
    let login = login_fragment(raw, principal_name_mode).to_string();

    let qualified = raw.contains('\\') || raw.contains('@');

    let principal = if principal_name_mode || qualified || domain.is_empty() {
        raw.to_string()
    } else {
        format!("{}\\{}", domain, raw)
    };

    NormalizedAccount { principal, login }
}

/// Syntactic email check used by the fallback rule
pub fn looks_like_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || raw.contains('\\') {
        return false;
    }

    if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.starts_with('.'),
        None => false,
    }
}
