//! Authenticated session state and the store that holds it.
//!
//! The HTTP client never owns the session. It only asks the store to log out
//! when a session cannot be renewed.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::RwLock;

/// A permission granted to the signed-in user, e.g. `{ object: "Warehouse", action: "update" }`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub object: String,
    pub action: String,
}

impl Permission {
    pub fn new(object: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_authenticated: bool,
    pub permissions: BTreeSet<Permission>,
}

impl Session {
    pub fn authenticated(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            is_authenticated: true,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn can(&self, object: &str, action: &str) -> bool {
        self.is_authenticated
            && self
                .permissions
                .iter()
                .any(|p| p.object == object && p.action == action)
    }
}

/// Repository for the current session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn read(&self) -> Session;
    fn sign_in(&self, session: Session);
    /// Drops the in-memory session and its permissions.
    fn logout(&self);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Session>,
}

impl MemorySessionStore {
    pub fn new(session: Session) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn sign_in(&self, session: Session) {
        debug!(
            "Session signed in with {} permission(s)",
            session.permissions.len()
        );
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    fn logout(&self) {
        debug!("Session cleared");
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Session::default();
    }
}
