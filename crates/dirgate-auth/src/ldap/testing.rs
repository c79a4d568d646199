//! Scripted in-memory directory for orchestrator tests

use crate::ldap::session::{DirectoryConnector, DirectorySession};
use crate::ldap::types::{DirectoryEntry, DirectoryQuery};
use async_trait::async_trait;
use dirgate_core::{AuthError, LdapConfig, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Every operation issued against the scripted directory, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(u32),
    Bind { conn: u32, principal: String },
    Search { conn: u32, base_dn: String, filter: String },
    Close(u32),
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, String>,
    results: HashMap<String, Vec<DirectoryEntry>>,
    allow_anonymous: bool,
    connect_error: Option<AuthError>,
    search_error: Option<AuthError>,
    calls: Vec<Call>,
    next_conn: u32,
}

/// Directory answering binds from a principal/password table and searches
/// from a filter/result table. Unknown filters match nothing.
#[derive(Clone, Default)]
pub struct ScriptedDirectory {
    state: Arc<Mutex<State>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, principal: &str, password: &str) -> Self {
        self.state
            .lock()
            .accounts
            .insert(principal.to_string(), password.to_string());
        self
    }

    pub fn with_result(self, filter: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.state.lock().results.insert(filter.to_string(), entries);
        self
    }

    pub fn allowing_anonymous(self) -> Self {
        self.state.lock().allow_anonymous = true;
        self
    }

    pub fn failing_connect(self, err: AuthError) -> Self {
        self.state.lock().connect_error = Some(err);
        self
    }

    pub fn failing_search(self, err: AuthError) -> Self {
        self.state.lock().search_error = Some(err);
        self
    }

    pub fn connector(&self) -> Arc<dyn DirectoryConnector> {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn connects(&self) -> usize {
        self.count(|c| matches!(c, Call::Connect(_)))
    }

    pub fn closes(&self) -> usize {
        self.count(|c| matches!(c, Call::Close(_)))
    }

    pub fn binds(&self) -> Vec<(u32, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Bind { conn, principal } => Some((conn, principal)),
                _ => None,
            })
            .collect()
    }

    pub fn filters(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search { filter, .. } => Some(filter),
                _ => None,
            })
            .collect()
    }

    /// Every opened connection was closed exactly once
    pub fn all_closed_once(&self) -> bool {
        let calls = self.calls();
        calls.iter().all(|c| match c {
            Call::Connect(id) => calls.iter().filter(|x| **x == Call::Close(*id)).count() == 1,
            _ => true,
        })
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl DirectoryConnector for ScriptedDirectory {
    async fn connect(&self, _config: &LdapConfig) -> Result<Box<dyn DirectorySession>> {
        let mut state = self.state.lock();
        if let Some(err) = state.connect_error.clone() {
            return Err(err);
        }

        state.next_conn += 1;
        let id = state.next_conn;
        state.calls.push(Call::Connect(id));

        Ok(Box::new(ScriptedSession {
            id,
            state: self.state.clone(),
        }))
    }
}

struct ScriptedSession {
    id: u32,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl DirectorySession for ScriptedSession {
    async fn bind(&mut self, principal: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Bind {
            conn: self.id,
            principal: principal.to_string(),
        });

        if principal.is_empty() && password.is_empty() && state.allow_anonymous {
            return Ok(());
        }

        match state.accounts.get(principal) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(AuthError::Credential(format!(
                "bind rejected for '{}': invalid credentials",
                principal
            ))),
        }
    }

    async fn search(&mut self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>> {
        let mut state = self.state.lock();
        state.calls.push(Call::Search {
            conn: self.id,
            base_dn: query.base_dn.clone(),
            filter: query.filter.clone(),
        });

        if let Some(err) = state.search_error.clone() {
            return Err(err);
        }

        Ok(state.results.get(&query.filter).cloned().unwrap_or_default())
    }

    async fn close(&mut self) {
        self.state.lock().calls.push(Call::Close(self.id));
    }
}
