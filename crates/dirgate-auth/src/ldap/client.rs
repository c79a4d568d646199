//! LDAP authenticator
//!
//! Runs one login attempt against the directory. Two modes are supported:
//! a domain-qualified bind followed by a profile lookup on the same
//! connection, and a service-account search followed by a re-bind with the
//! entry's DN on a fresh connection.
//!
//! Email-shaped logins are deferred to the host application before any
//! directory call when `fallback_to_local` is enabled.

use crate::account::{self, NormalizedAccount};
use crate::ldap::session::{DirectoryConnector, DirectorySession, Ldap3Connector};
use crate::ldap::types::{single_entry, DirectoryEntry, DirectoryQuery};
use crate::policy::MembershipPolicy;
use dirgate_core::{AuthError, AuthResult, BindMode, Credential, Identity, LdapConfig, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Directory-backed login verification.
///
/// Holds only immutable configuration; every call opens and closes its own
/// connections, so one instance can serve concurrent logins.
#[derive(Clone)]
pub struct LdapAuthenticator {
    config: LdapConfig,
    policy: Option<MembershipPolicy>,
    connector: Arc<dyn DirectoryConnector>,
}

impl LdapAuthenticator {
    /// Create an authenticator backed by `ldap3`
    pub fn new(config: LdapConfig) -> Result<Self> {
        Self::with_connector(config, Arc::new(Ldap3Connector))
    }

    /// Create an authenticator with a custom directory client
    pub fn with_connector(
        config: LdapConfig,
        connector: Arc<dyn DirectoryConnector>,
    ) -> Result<Self> {
        config.validate()?;
        let policy = MembershipPolicy::from_config(&config)?;

        Ok(Self {
            config,
            policy,
            connector,
        })
    }

    /// Authenticate a user with account name and password
    pub async fn authenticate(&self, account_name: &str, password: &str) -> Result<AuthResult> {
        self.authenticate_credential(&Credential::new(account_name, password))
            .await
    }

    /// Authenticate a submitted credential
    pub async fn authenticate_credential(&self, credential: &Credential) -> Result<AuthResult> {
        let account_name = credential.account_name.as_str();

        if self.config.fallback_to_local && account::looks_like_email(account_name) {
            info!("Deferring {} to local authentication", account_name);
            return Ok(AuthResult::Fallback);
        }

        if account_name.is_empty() {
            return Err(AuthError::Credential("account name is empty".to_string()));
        }

        if account::login_fragment(account_name, self.config.uses_principal_name()).is_empty() {
            return Err(AuthError::Credential(format!(
                "no login in account name '{}'",
                account_name
            )));
        }

        // An empty password would turn the bind into an unauthenticated one
        if !credential.has_password() {
            return Err(AuthError::Credential(format!(
                "empty password for '{}'",
                account_name
            )));
        }

        let result = match self.config.mode {
            BindMode::DomainBind => self.domain_bind(credential).await,
            BindMode::SearchBind => self.search_bind(credential).await,
        };

        match &result {
            Ok(identity) => info!("Authenticated {} as {}", account_name, identity.dn),
            Err(e) => warn!("Authentication of {} failed ({}): {}", account_name, e.code(), e),
        }

        result.map(AuthResult::Success)
    }

    // =========================================================================
    // Domain-qualified bind
    // =========================================================================

    async fn domain_bind(&self, credential: &Credential) -> Result<Identity> {
        let account = account::normalize(
            &credential.account_name,
            &self.config.domain,
            self.config.uses_principal_name(),
        );

        let mut session = self.connector.connect(&self.config).await?;
        let result = self
            .bind_and_lookup(session.as_mut(), &account, &credential.password)
            .await;
        session.close().await;

        result
    }

    async fn bind_and_lookup(
        &self,
        session: &mut dyn DirectorySession,
        account: &NormalizedAccount,
        password: &str,
    ) -> Result<Identity> {
        debug!("Binding as {}", account.principal);
        session.bind(&account.principal, password).await?;

        let query = DirectoryQuery::equality(
            &self.config.base_dn,
            &self.config.attributes.login,
            &account.login,
            &self.config.attributes.projection(),
        );

        debug!("Searching for user with filter: {}", query.filter);

        let entry = single_entry(session.search(&query).await?, &account.login)?;
        self.check_policy(&entry, &account.login)?;
        self.identity(entry, &account.login)
    }

    // =========================================================================
    // Service bind, search, re-bind as user
    // =========================================================================

    async fn search_bind(&self, credential: &Credential) -> Result<Identity> {
        let login = account::login_fragment(
            &credential.account_name,
            self.config.uses_principal_name(),
        );

        let mut session = self.connector.connect(&self.config).await?;
        let found = self.find_entry(session.as_mut(), login).await;
        session.close().await;
        let entry = found?;

        if entry.dn.is_empty() {
            return Err(AuthError::Lookup(format!(
                "directory entry for '{}' has no DN",
                login
            )));
        }

        debug!("Found user DN: {}", entry.dn);

        let mut session = self.connector.connect(&self.config).await?;
        let verified = self
            .verify_password(session.as_mut(), &entry.dn, &credential.password, login)
            .await;
        session.close().await;
        verified?;

        self.check_policy(&entry, login)?;
        self.identity(entry, login)
    }

    async fn find_entry(
        &self,
        session: &mut dyn DirectorySession,
        login: &str,
    ) -> Result<DirectoryEntry> {
        if self.config.is_anonymous_search() {
            debug!("Binding anonymously for user search");
        } else {
            debug!("Binding as service account {}", self.config.bind_dn);
        }

        session
            .bind(&self.config.bind_dn, &self.config.bind_password)
            .await
            .map_err(|e| match e {
                AuthError::Credential(msg) => {
                    AuthError::Credential(format!("service account {}", msg))
                }
                e => e,
            })?;

        let query = DirectoryQuery::template(
            &self.config.base_dn,
            &self.config.user_filter,
            login,
            &self.config.attributes.projection(),
        );

        debug!("Searching for user with filter: {}", query.filter);

        single_entry(session.search(&query).await?, login)
    }

    async fn verify_password(
        &self,
        session: &mut dyn DirectorySession,
        dn: &str,
        password: &str,
        login: &str,
    ) -> Result<()> {
        session.bind(dn, password).await.map_err(|e| match e {
            AuthError::Credential(_) => {
                AuthError::Credential(format!("invalid password for '{}'", login))
            }
            e => e,
        })
    }

    // =========================================================================
    // Shared steps
    // =========================================================================

    fn check_policy(&self, entry: &DirectoryEntry, login: &str) -> Result<()> {
        match &self.policy {
            Some(policy) => policy.check(entry, login),
            None => Ok(()),
        }
    }

    fn identity(&self, entry: DirectoryEntry, login: &str) -> Result<Identity> {
        let attrs = &self.config.attributes;

        let email = entry
            .first(&attrs.email)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AuthError::Lookup(format!("'{}' has no {} attribute", login, attrs.email))
            })?
            .to_string();

        let display_name = entry
            .first(&attrs.display_name)
            .filter(|v| !v.is_empty())
            .unwrap_or(login)
            .to_string();

        Ok(Identity {
            username: login.to_string(),
            dn: entry.dn,
            email,
            display_name,
            auto_create_account: self.config.auto_create_accounts,
        })
    }
}

impl std::fmt::Debug for LdapAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapAuthenticator")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
