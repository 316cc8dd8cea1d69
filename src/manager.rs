//! Session Manager
//!
//! Owns the session state and the auth cache, and is the only writer of the
//! persisted token. Every auth flow ends by overwriting both with its own
//! outcome, so concurrent checks settle on whichever response lands last.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{AuthApi, AuthResponse, LoginRequest, RegisterRequest};
use crate::cache::{AuthCache, CacheInfo};
use crate::clock::Clock;
use crate::errors::{translate_api_error, AuthError, AuthOperation};
use crate::scheduler::{self, SchedulerHandle};
use crate::session::{AuthStatus, SessionState, User};
use crate::storage::TokenStore;
use crate::token::extract_expiration;

/// Cache and refresh tuning
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// How long a successful check is trusted without asking the backend
    pub cache_duration: Duration,
    /// Lookahead before token expiry at which the session is refreshed
    pub refresh_threshold: Duration,
    /// Present the bearer token on `GET /auth/check-status`
    pub send_token_on_status_check: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cache_duration: Duration::minutes(5),
            refresh_threshold: Duration::minutes(10),
            send_token_on_status_check: false,
        }
    }
}

/// Confirmation returned by a successful login or registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSuccess {
    pub message: String,
}

struct Inner {
    session: SessionState,
    cache: AuthCache,
}

pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<AuthStatus>,
}

impl SessionManager {
    /// Build a manager, restoring whatever token was persisted
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: TokenStore,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        let token = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read persisted token");
            None
        });
        debug!(has_token = token.is_some(), "Session manager created");

        let (status_tx, _) = watch::channel(AuthStatus::Checking);

        Self {
            api,
            store,
            clock,
            settings,
            inner: Mutex::new(Inner {
                session: SessionState::restored(token),
                cache: AuthCache::new(),
            }),
            status_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, status: AuthStatus) {
        self.status_tx.send_replace(status);
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, AuthError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.api.login(&request).await {
            Ok(response) => {
                self.install(response);
                Ok(AuthSuccess {
                    message: "Login successful.".to_string(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.logout();
                Err(translate_api_error(AuthOperation::Login, &e))
            }
        }
    }

    /// Create an account and sign in with it
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthSuccess, AuthError> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };

        match self.api.register(&request).await {
            Ok(response) => {
                self.install(response);
                Ok(AuthSuccess {
                    message: "Account created successfully.".to_string(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.logout();
                Err(translate_api_error(AuthOperation::Register, &e))
            }
        }
    }

    /// Decide whether the persisted token still represents a live session.
    ///
    /// Answers from the cache while it is usable, short-circuits locally
    /// expired tokens, and otherwise asks the backend.
    pub async fn check_status(&self) -> bool {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted token");
                self.logout();
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                self.logout();
                return false;
            }
        };

        let now = self.clock.now();
        {
            let inner = self.lock();
            let settings = &self.settings;
            if inner.cache.is_usable(now, settings.cache_duration, settings.refresh_threshold) {
                debug!("Auth cache hit");
                return inner.cache.is_valid();
            }
        }

        if extract_expiration(&token).has_passed(now) {
            info!("Persisted token has expired");
            self.logout();
            return false;
        }

        // TODO: confirm whether /auth/check-status authenticates by cookie or
        // bearer header and drop `send_token_on_status_check` once it is known
        let presented = self.settings.send_token_on_status_check.then_some(token.as_str());
        match self.api.check_status(presented).await {
            Ok(response) => {
                self.install(response);
                true
            }
            Err(e) => {
                warn!(error = %e, "Auth status check failed");
                self.logout();
                false
            }
        }
    }

    /// Drop the cached verdict and run a full status check
    pub async fn force_auth_check(&self) -> bool {
        self.invalidate_cache();
        self.check_status().await
    }

    /// Clear the session, the persisted token and the cache. Idempotent.
    pub fn logout(&self) {
        let mut inner = self.lock();
        inner.session.clear();
        inner.cache.invalidate();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove persisted token");
        }
        self.publish(AuthStatus::NotAuthenticated);
        drop(inner);

        info!("Session cleared");
    }

    pub fn invalidate_cache(&self) {
        self.lock().cache.invalidate();
        debug!("Auth cache invalidated");
    }

    pub fn cache_info(&self) -> CacheInfo {
        let now = self.clock.now();
        self.lock().cache.snapshot(now)
    }

    pub fn is_token_near_expiration(&self) -> bool {
        let now = self.clock.now();
        self.lock()
            .cache
            .is_token_near_expiration(now, self.settings.refresh_threshold)
    }

    /// One scheduler tick: refresh an authenticated session whose token is
    /// about to expire. Returns whether a refresh was attempted.
    pub async fn refresh_if_near_expiration(&self) -> bool {
        if self.auth_status() != AuthStatus::Authenticated || !self.is_token_near_expiration() {
            return false;
        }

        info!("Token near expiration, refreshing session");
        self.invalidate_cache();
        self.check_status().await;
        true
    }

    /// Start the periodic near-expiry check
    pub fn start_scheduler(self: &Arc<Self>, period: std::time::Duration) -> SchedulerHandle {
        scheduler::spawn(Arc::clone(self), period)
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.lock().session.status()
    }

    /// Notified with the new status on every session change
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status_tx.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().session.user().cloned()
    }

    /// Token to attach to outgoing requests
    pub fn token(&self) -> Option<String> {
        self.lock().session.token().map(str::to_string)
    }

    pub fn is_admin(&self) -> bool {
        self.lock().session.is_admin()
    }

    /// Persisted token, in-memory session and published status change under
    /// one guard, so a concurrent logout lands entirely before or after.
    fn install(&self, response: AuthResponse) {
        let AuthResponse { token, user } = response;
        let expiry = extract_expiration(&token);
        info!(user_id = %user.id, expires_at = ?expiry.instant(), "Session established");

        let mut inner = self.lock();
        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "Failed to persist token");
        }
        inner.session.authenticate(user, token);
        inner.cache.mark_valid(self.clock.now(), expiry);
        self.publish(inner.session.status());
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.auth_status())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
