//! Directory sessions
//!
//! One session is one connection, opened for a single authentication attempt
//! and closed before the attempt returns. [`Ldap3Connector`] is the `ldap3`
//! backed implementation; the traits let the orchestrator run against any
//! directory client.

use crate::ldap::types::{DirectoryEntry, DirectoryQuery};
use async_trait::async_trait;
use dirgate_core::{AuthError, LdapConfig, Result};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use std::time::Duration;
use tracing::debug;

/// Opens directory sessions
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Connect to the configured directory. No bind is performed.
    async fn connect(&self, config: &LdapConfig) -> Result<Box<dyn DirectorySession>>;
}

/// An open directory connection
#[async_trait]
pub trait DirectorySession: Send {
    /// Simple bind; both arguments empty is an anonymous bind.
    ///
    /// A rejected bind is [`AuthError::Credential`], a failed request
    /// [`AuthError::Transport`].
    async fn bind(&mut self, principal: &str, password: &str) -> Result<()>;

    /// Subtree search returning the matched entries
    async fn search(&mut self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>>;

    /// Unbind and release the connection. Errors are swallowed.
    async fn close(&mut self);
}

/// `ldap3` connector
#[derive(Debug, Clone, Copy, Default)]
pub struct Ldap3Connector;

#[async_trait]
impl DirectoryConnector for Ldap3Connector {
    async fn connect(&self, config: &LdapConfig) -> Result<Box<dyn DirectorySession>> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let settings = tls_settings(LdapConnSettings::new().set_conn_timeout(timeout), config)?;
        let url = config.url();

        debug!("Connecting to LDAP server: {}", url);

        // ldap3 only speaks protocol version 3 and never chases referrals
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| connect_error(e, &url))?;

        ldap3::drive!(conn);

        Ok(Box::new(Ldap3Session {
            ldap,
            timeout,
            closed: false,
        }))
    }
}

#[cfg(feature = "tls")]
fn tls_settings(settings: LdapConnSettings, config: &LdapConfig) -> Result<LdapConnSettings> {
    if config.skip_tls_verify {
        tracing::warn!("TLS certificate verification is disabled for {}", config.host);
    }

    Ok(settings
        .set_starttls(config.start_tls)
        .set_no_tls_verify(config.skip_tls_verify))
}

#[cfg(not(feature = "tls"))]
fn tls_settings(settings: LdapConnSettings, config: &LdapConfig) -> Result<LdapConnSettings> {
    if config.use_ssl || config.start_tls {
        return Err(AuthError::Configuration(
            "TLS requested but dirgate-auth was built without the `tls` feature".to_string(),
        ));
    }

    Ok(settings)
}

fn connect_error(e: LdapError, url: &str) -> AuthError {
    match e {
        LdapError::UrlParsing { .. } | LdapError::UnknownScheme(_) => {
            AuthError::Configuration(format!("Invalid LDAP URL {}: {}", url, e))
        }
        e => AuthError::Transport(format!("Failed to connect to LDAP server {}: {}", url, e)),
    }
}

fn search_error(e: LdapError) -> AuthError {
    match e {
        LdapError::FilterParsing => {
            AuthError::Configuration("User filter is not a valid LDAP filter".to_string())
        }
        e => AuthError::Transport(format!("User search failed: {}", e)),
    }
}

fn bind_rejection(principal: &str, rc: u32) -> AuthError {
    let reason = match rc {
        49 => "invalid credentials".to_string(),
        50 => "insufficient access rights".to_string(),
        53 => "account disabled or locked".to_string(),
        rc => format!("bind failed with code {}", rc),
    };

    AuthError::Credential(format!("bind rejected for '{}': {}", principal, reason))
}

struct Ldap3Session {
    ldap: Ldap,
    timeout: Duration,
    closed: bool,
}

#[async_trait]
impl DirectorySession for Ldap3Session {
    async fn bind(&mut self, principal: &str, password: &str) -> Result<()> {
        let result = self
            .ldap
            .with_timeout(self.timeout)
            .simple_bind(principal, password)
            .await
            .map_err(|e| AuthError::Transport(format!("Bind request failed: {}", e)))?;

        if result.rc != 0 {
            return Err(bind_rejection(principal, result.rc));
        }

        Ok(())
    }

    async fn search(&mut self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>> {
        let (rs, _res) = self
            .ldap
            .with_timeout(self.timeout)
            .search(
                &query.base_dn,
                Scope::Subtree,
                &query.filter,
                query.attributes.clone(),
            )
            .await
            .map_err(search_error)?
            .success()
            .map_err(|e| AuthError::Transport(format!("User search error: {}", e)))?;

        let total = rs.len();
        let entries: Vec<DirectoryEntry> = rs
            .into_iter()
            .filter(|r| !r.is_ref() && !r.is_intermediate())
            .map(|r| {
                let entry = SearchEntry::construct(r);
                DirectoryEntry {
                    dn: entry.dn,
                    attrs: entry.attrs.into_iter().collect(),
                }
            })
            .collect();

        if entries.len() != total {
            debug!("Ignored {} search references", total - entries.len());
        }

        Ok(entries)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.ldap.with_timeout(self.timeout).unbind().await {
            debug!("LDAP unbind failed: {}", e);
        }
    }
}
