//! Configuration loading for the Dirgate CLI
//!
//! Lookup order: `--config <path>`, then `~/.dirgate/config.toml` when it
//! exists, then defaults. `DIRGATE_*` environment variables override
//! whatever was loaded.
//!
//! Example config:
//! ```toml
//! [ldap]
//! host = "dc.example.com"
//! base_dn = "DC=example,DC=com"
//! mode = "domain_bind"
//! domain = "EXAMPLE"
//! member_of_pattern = "^CN=Wiki Users,"
//! fallback_to_local = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use anyhow::{Context, Result};
use dirgate_core::{BindMode, DirgateConfig, LdapConfig};
use std::path::PathBuf;

/// Get config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .context("Could not determine home directory")?
        .home_dir()
        .to_path_buf();

    Ok(home.join(".dirgate"))
}

/// Get default config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from file and environment
pub fn load(path: Option<&str>) -> Result<DirgateConfig> {
    let mut config = match path {
        Some(path) => DirgateConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path))?,
        None => match config_path() {
            Ok(default) if default.exists() => {
                let default = default.to_string_lossy().into_owned();
                DirgateConfig::from_file(&default)
                    .with_context(|| format!("Failed to load config file: {}", default))?
            }
            _ => DirgateConfig::default(),
        },
    };

    config.apply_env();
    Ok(config)
}

/// Key/value view of the directory settings with secrets hidden
pub fn summary(config: &LdapConfig) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("url", config.url()),
        ("base_dn", config.base_dn.clone()),
        (
            "mode",
            match config.mode {
                BindMode::DomainBind => "domain_bind".to_string(),
                BindMode::SearchBind => "search_bind".to_string(),
            },
        ),
    ];

    match config.mode {
        BindMode::DomainBind => rows.push(("domain", config.domain.clone())),
        BindMode::SearchBind => {
            let bind_dn = if config.is_anonymous_search() {
                "(anonymous)".to_string()
            } else {
                config.bind_dn.clone()
            };
            rows.push(("bind_dn", bind_dn));
            rows.push((
                "bind_password",
                if config.bind_password.is_empty() {
                    "(not set)".to_string()
                } else {
                    "***".to_string()
                },
            ));
            rows.push(("user_filter", config.user_filter.clone()));
        }
    }

    rows.extend([
        ("start_tls", config.start_tls.to_string()),
        ("timeout_seconds", config.timeout_seconds.to_string()),
        ("login_attribute", config.attributes.login.clone()),
        ("email_attribute", config.attributes.email.clone()),
        ("display_name_attribute", config.attributes.display_name.clone()),
        (
            "member_of_pattern",
            config
                .member_of_pattern
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
        ),
        ("auto_create_accounts", config.auto_create_accounts.to_string()),
        ("fallback_to_local", config.fallback_to_local.to_string()),
    ]);

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ldap]\nhost = \"ldap.example.com\"\nbase_dn = \"dc=example,dc=com\"\nmode = \"search_bind\""
        )
        .unwrap();

        let config = load(file.path().to_str()).unwrap();
        assert_eq!(config.ldap.host, "ldap.example.com");
        assert_eq!(config.ldap.mode, BindMode::SearchBind);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load(Some("/nonexistent/dirgate.toml")).is_err());
    }

    #[test]
    fn test_summary_hides_password() {
        let config = LdapConfig::openldap("h", "dc=x", "cn=reader,dc=x", "topsecret");
        let rows = summary(&config);

        assert!(rows.iter().all(|(_, v)| !v.contains("topsecret")));
        assert!(rows.contains(&("bind_password", "***".to_string())));
        assert!(rows.contains(&("user_filter", "(uid=%name%)".to_string())));
    }

    #[test]
    fn test_summary_domain_bind() {
        let config = LdapConfig::active_directory("dc", "EXAMPLE", "DC=example,DC=com");
        let rows = summary(&config);

        assert!(rows.contains(&("domain", "EXAMPLE".to_string())));
        assert!(rows.iter().all(|(k, _)| *k != "bind_dn"));
    }
}
