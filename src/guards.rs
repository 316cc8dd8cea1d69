//! Route Guards Module
//!
//! Navigation decisions made from the session manager's status and roles.

use crate::manager::SessionManager;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/auth/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Login and register pages: only for visitors without a session
pub async fn not_authenticated(manager: &SessionManager) -> GuardDecision {
    if manager.check_status().await {
        GuardDecision::Redirect(HOME_ROUTE)
    } else {
        GuardDecision::Allow
    }
}

/// Pages that need any signed-in user
pub async fn authenticated(manager: &SessionManager) -> GuardDecision {
    if manager.check_status().await {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(LOGIN_ROUTE)
    }
}

/// Admin area
pub async fn admin(manager: &SessionManager) -> GuardDecision {
    if manager.check_status().await && manager.is_admin() {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(HOME_ROUTE)
    }
}
