//! Commands Module
//!
//! UI-facing operations. Results are flattened to `{success, message}` so
//! pages never handle transport errors or raw backend bodies.

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::CacheInfo;
use crate::errors::{AuthError, AuthErrorKind};
use crate::manager::{AuthSuccess, SessionManager};
use crate::session::{AuthStatus, User};

/// Outcome of a login or registration form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AuthErrorKind>,
}

impl From<Result<AuthSuccess, AuthError>> for AuthResult {
    fn from(result: Result<AuthSuccess, AuthError>) -> Self {
        match result {
            Ok(success) => Self {
                success: true,
                message: success.message,
                kind: None,
            },
            Err(error) => Self {
                success: false,
                message: error.message,
                kind: Some(error.kind),
            },
        }
    }
}

/// What navigation and headers need to know about the session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub is_admin: bool,
}

impl SessionView {
    pub fn of(manager: &SessionManager) -> Self {
        Self {
            status: manager.auth_status(),
            user: manager.user(),
            is_admin: manager.is_admin(),
        }
    }
}

pub async fn login(manager: &SessionManager, email: &str, password: &str) -> AuthResult {
    info!("Login requested");
    manager.login(email, password).await.into()
}

pub async fn register(
    manager: &SessionManager,
    email: &str,
    password: &str,
    full_name: &str,
) -> AuthResult {
    info!("Registration requested");
    manager.register(email, password, full_name).await.into()
}

pub fn logout(manager: &SessionManager) -> SessionView {
    manager.logout();
    SessionView::of(manager)
}

pub async fn check_status(manager: &SessionManager) -> SessionView {
    let valid = manager.check_status().await;
    debug!(valid, "Status checked");
    SessionView::of(manager)
}

pub async fn force_auth_check(manager: &SessionManager) -> SessionView {
    let valid = manager.force_auth_check().await;
    debug!(valid, "Forced status check");
    SessionView::of(manager)
}

pub fn cache_info(manager: &SessionManager) -> CacheInfo {
    manager.cache_info()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::translate_login_error;

    #[test]
    fn failure_carries_kind_but_no_backend_text() {
        let result: AuthResult = Err(translate_login_error(401, "Incorrect password")).into();
        assert!(!result.success);
        assert_eq!(result.kind, Some(AuthErrorKind::Credentials));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "credentials");
    }

    #[test]
    fn success_omits_kind() {
        let result: AuthResult = Ok(AuthSuccess {
            message: "Login successful.".into(),
        })
        .into();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("kind").is_none());
    }
}
