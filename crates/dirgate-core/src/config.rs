//! Configuration for Dirgate

use crate::{AuthError, Result};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the escaped login in `user_filter`
pub const NAME_PLACEHOLDER: &str = "%name%";

/// Login attribute value that switches on principal-name mode
pub const PRINCIPAL_NAME_ATTRIBUTE: &str = "userPrincipalName";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirgateConfig {
    #[serde(default)]
    pub ldap: LdapConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirgateConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Configuration(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AuthError::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `DIRGATE_*` environment variables
    pub fn apply_env(&mut self) {
        let ldap = &mut self.ldap;

        if let Ok(host) = std::env::var("DIRGATE_LDAP_HOST") {
            ldap.host = host;
        }
        if let Ok(port) = std::env::var("DIRGATE_LDAP_PORT") {
            if let Ok(p) = port.parse() {
                ldap.port = p;
            }
        }
        if let Ok(base_dn) = std::env::var("DIRGATE_LDAP_BASE_DN") {
            ldap.base_dn = base_dn;
        }
        if let Ok(mode) = std::env::var("DIRGATE_LDAP_MODE") {
            match mode.as_str() {
                "domain_bind" => ldap.mode = BindMode::DomainBind,
                "search_bind" => ldap.mode = BindMode::SearchBind,
                other => tracing::warn!("Ignoring unknown DIRGATE_LDAP_MODE: {}", other),
            }
        }
        if let Ok(domain) = std::env::var("DIRGATE_LDAP_DOMAIN") {
            ldap.domain = domain;
        }
        if let Ok(bind_dn) = std::env::var("DIRGATE_LDAP_BIND_DN") {
            ldap.bind_dn = bind_dn;
        }
        if let Ok(password) = std::env::var("DIRGATE_LDAP_BIND_PASSWORD") {
            ldap.bind_password = password;
        }
        if let Ok(filter) = std::env::var("DIRGATE_LDAP_USER_FILTER") {
            ldap.user_filter = filter;
        }
        if let Ok(pattern) = std::env::var("DIRGATE_LDAP_MEMBER_OF_PATTERN") {
            ldap.member_of_pattern = Some(pattern);
        }
        if let Ok(secs) = std::env::var("DIRGATE_LDAP_TIMEOUT") {
            if let Ok(s) = secs.parse() {
                ldap.timeout_seconds = s;
            }
        }
        if std::env::var("DIRGATE_LDAP_USE_SSL").map(|v| v == "true").unwrap_or(false) {
            ldap.use_ssl = true;
        }
        if std::env::var("DIRGATE_LDAP_START_TLS").map(|v| v == "true").unwrap_or(false) {
            ldap.start_tls = true;
        }
        if let Ok(v) = std::env::var("DIRGATE_LDAP_FALLBACK") {
            ldap.fallback_to_local = v == "true";
        }
        if let Ok(v) = std::env::var("DIRGATE_LDAP_AUTO_CREATE") {
            ldap.auto_create_accounts = v == "true";
        }
        if let Ok(level) = std::env::var("DIRGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// How the directory account for a login is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BindMode {
    /// Bind as `DOMAIN\login`, then read the profile on the same connection
    #[default]
    DomainBind,
    /// Bind as a service account, search for the entry, re-bind with its DN
    SearchBind,
}

/// LDAP/Active Directory configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdapConfig {
    /// Directory host name
    #[serde(default = "default_host")]
    pub host: String,

    /// Directory port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect with `ldaps://`
    #[serde(default)]
    pub use_ssl: bool,

    /// Upgrade a plain connection with STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Connect and per-operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Base DN for user searches
    /// Example: "ou=users,dc=example,dc=com"
    #[serde(default)]
    pub base_dn: String,

    #[serde(default)]
    pub mode: BindMode,

    /// NetBIOS domain prefixed to bare logins in domain-bind mode
    /// Example: "EXAMPLE"
    #[serde(default)]
    pub domain: String,

    /// Service account DN for search-bind mode, empty for anonymous
    #[serde(default)]
    pub bind_dn: String,

    /// Service account password, empty for anonymous
    #[serde(default)]
    pub bind_password: String,

    /// User search filter for search-bind mode
    /// Use %name% as placeholder
    /// Example: "(uid=%name%)" or "(&(objectClass=person)(mail=%name%))"
    #[serde(default = "default_user_filter")]
    pub user_filter: String,

    #[serde(default)]
    pub attributes: AttributeMappings,

    /// Regular expression one membership value must match
    /// Example: "^CN=Wiki Users,"
    #[serde(default)]
    pub member_of_pattern: Option<String>,

    /// Tell the host to create local accounts for unknown directory users
    #[serde(default = "default_true")]
    pub auto_create_accounts: bool,

    /// Defer email-shaped logins to the host's own credential store
    #[serde(default)]
    pub fallback_to_local: bool,

    /// Chase referrals returned by the directory. Must stay `false`: a
    /// referral may point at a server that would receive the user's password.
    #[serde(default)]
    pub follow_referrals: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    389
}

fn default_timeout() -> u64 {
    10
}

fn default_user_filter() -> String {
    "(uid=%name%)".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            use_ssl: false,
            start_tls: false,
            skip_tls_verify: false,
            timeout_seconds: default_timeout(),
            base_dn: String::new(),
            mode: BindMode::default(),
            domain: String::new(),
            bind_dn: String::new(),
            bind_password: String::new(),
            user_filter: default_user_filter(),
            attributes: AttributeMappings::default(),
            member_of_pattern: None,
            auto_create_accounts: default_true(),
            fallback_to_local: false,
            follow_referrals: false,
        }
    }
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("start_tls", &self.start_tls)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("base_dn", &self.base_dn)
            .field("mode", &self.mode)
            .field("domain", &self.domain)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"<redacted>")
            .field("user_filter", &self.user_filter)
            .field("attributes", &self.attributes)
            .field("member_of_pattern", &self.member_of_pattern)
            .field("auto_create_accounts", &self.auto_create_accounts)
            .field("fallback_to_local", &self.fallback_to_local)
            .field("follow_referrals", &self.follow_referrals)
            .finish()
    }
}

/// LDAP attribute mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttributeMappings {
    /// Attribute holding the login, compared against the login fragment
    #[serde(default = "default_login_attr")]
    pub login: String,

    /// Email attribute
    #[serde(default = "default_email_attr")]
    pub email: String,

    /// Display name attribute
    #[serde(default = "default_display_name_attr")]
    pub display_name: String,

    /// Multi-valued group membership attribute
    #[serde(default = "default_member_of_attr")]
    pub member_of: String,
}

fn default_login_attr() -> String {
    "sAMAccountName".to_string()
}

fn default_email_attr() -> String {
    "mail".to_string()
}

fn default_display_name_attr() -> String {
    "displayName".to_string()
}

fn default_member_of_attr() -> String {
    "memberOf".to_string()
}

impl Default for AttributeMappings {
    fn default() -> Self {
        Self {
            login: default_login_attr(),
            email: default_email_attr(),
            display_name: default_display_name_attr(),
            member_of: default_member_of_attr(),
        }
    }
}

impl AttributeMappings {
    /// Get OpenLDAP default mappings
    pub fn openldap() -> Self {
        Self {
            login: "uid".to_string(),
            email: "mail".to_string(),
            display_name: "cn".to_string(),
            member_of: "memberOf".to_string(),
        }
    }

    /// Attributes requested from the directory, nothing more
    pub fn projection(&self) -> Vec<&str> {
        vec![
            self.login.as_str(),
            self.display_name.as_str(),
            self.email.as_str(),
            self.member_of.as_str(),
        ]
    }
}

impl LdapConfig {
    /// Active Directory preset for domain-bind mode
    pub fn active_directory(host: &str, domain: &str, base_dn: &str) -> Self {
        Self {
            host: host.to_string(),
            domain: domain.to_string(),
            base_dn: base_dn.to_string(),
            mode: BindMode::DomainBind,
            attributes: AttributeMappings::default(),
            ..Default::default()
        }
    }

    /// OpenLDAP preset for search-bind mode
    pub fn openldap(host: &str, base_dn: &str, bind_dn: &str, bind_password: &str) -> Self {
        Self {
            host: host.to_string(),
            base_dn: base_dn.to_string(),
            bind_dn: bind_dn.to_string(),
            bind_password: bind_password.to_string(),
            mode: BindMode::SearchBind,
            user_filter: default_user_filter(),
            attributes: AttributeMappings::openldap(),
            ..Default::default()
        }
    }

    /// Connection URL built from host, port and `use_ssl`
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Whether logins are `user@realm` principal names used verbatim
    pub fn uses_principal_name(&self) -> bool {
        self.attributes
            .login
            .eq_ignore_ascii_case(PRINCIPAL_NAME_ATTRIBUTE)
    }

    /// Whether the service bind is anonymous
    pub fn is_anonymous_search(&self) -> bool {
        self.bind_dn.is_empty() && self.bind_password.is_empty()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(AuthError::Configuration("Host is required".to_string()));
        }

        if self.port == 0 {
            return Err(AuthError::Configuration("Port must not be 0".to_string()));
        }

        if self.use_ssl && self.start_tls {
            return Err(AuthError::Configuration(
                "use_ssl and start_tls are mutually exclusive".to_string(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(AuthError::Configuration(
                "Timeout must be at least one second".to_string(),
            ));
        }

        if self.base_dn.is_empty() {
            return Err(AuthError::Configuration("Base DN is required".to_string()));
        }

        if self.follow_referrals {
            return Err(AuthError::Configuration(
                "Referral following is not supported and must stay disabled".to_string(),
            ));
        }

        let attrs = &self.attributes;
        if attrs.login.is_empty() || attrs.email.is_empty() || attrs.display_name.is_empty() {
            return Err(AuthError::Configuration(
                "Login, email and display name attributes are required".to_string(),
            ));
        }

        if self.member_of_pattern.is_some() && attrs.member_of.is_empty() {
            return Err(AuthError::Configuration(
                "A membership pattern needs a membership attribute".to_string(),
            ));
        }

        match self.mode {
            BindMode::DomainBind => {
                if self.domain.is_empty() && !self.uses_principal_name() {
                    return Err(AuthError::Configuration(
                        "Domain is required for domain bind".to_string(),
                    ));
                }
            }
            BindMode::SearchBind => {
                if !self.user_filter.contains(NAME_PLACEHOLDER) {
                    return Err(AuthError::Configuration(format!(
                        "User filter must contain {} placeholder",
                        NAME_PLACEHOLDER
                    )));
                }
                if self.bind_dn.is_empty() != self.bind_password.is_empty() {
                    return Err(AuthError::Configuration(
                        "Service bind needs both bind_dn and bind_password, or neither for anonymous"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
