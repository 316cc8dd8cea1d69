//! Session State
//!
//! Who is signed in, with which token, and whether that has been decided yet.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role that unlocks the admin area
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated user as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }
}

/// Derived authentication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStatus {
    Checking,
    Authenticated,
    NotAuthenticated,
}

/// Current session.
///
/// Once `determined` is set, `user` and `token` are either both present
/// (authenticated) or both absent. Before that the persisted token is
/// carried unverified so outgoing requests can still present it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Option<User>,
    token: Option<String>,
    determined: bool,
}

impl SessionState {
    /// State at startup, before any check has resolved
    pub fn restored(token: Option<String>) -> Self {
        Self {
            user: None,
            token,
            determined: false,
        }
    }

    pub fn status(&self) -> AuthStatus {
        if !self.determined {
            AuthStatus::Checking
        } else if self.user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::NotAuthenticated
        }
    }

    pub fn authenticate(&mut self, user: User, token: String) {
        self.user = Some(user);
        self.token = Some(token);
        self.determined = true;
    }

    pub fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.determined = true;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }
}
