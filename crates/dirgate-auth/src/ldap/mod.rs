//! LDAP/Active Directory authentication module
//!
//! Provides login verification via:
//! - Domain-qualified bind (Active Directory)
//! - Service-account search and re-bind (LDAP, OpenLDAP, 389 Directory Server)
//!
//! Each attempt opens its own connections and releases them before
//! returning. Nothing is cached between attempts.

mod client;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::LdapAuthenticator;
pub use session::{DirectoryConnector, DirectorySession, Ldap3Connector};
pub use types::*;
