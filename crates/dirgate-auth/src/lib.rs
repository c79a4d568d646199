//! Directory authentication for Dirgate
//!
//! Verifies a submitted account name and password against Active Directory
//! or a generic LDAP server and returns a normalized identity record, or
//! defers the attempt to the host application's own credential store.

pub mod account;
pub mod escape;
pub mod ldap;
pub mod policy;

pub use account::{login_fragment, looks_like_email, normalize, NormalizedAccount};
pub use escape::{escape, escape_dn, escape_filter, unescape, EscapeFlags};
pub use ldap::{
    DirectoryConnector, DirectoryEntry, DirectoryQuery, DirectorySession, Ldap3Connector,
    LdapAuthenticator,
};
pub use policy::MembershipPolicy;

pub use dirgate_core::{AuthError, AuthResult, Credential, Identity, LdapConfig, Result};
