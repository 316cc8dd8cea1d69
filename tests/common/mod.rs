//! Shared helpers for the session integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};

use storefront_session::api::{LoginRequest, RegisterRequest};
use storefront_session::storage::TOKEN_KEY;
use storefront_session::{
    ApiError, AuthApi, AuthResponse, KeyValueStore, ManualClock, MemoryStorage, SessionManager,
    SessionSettings, TokenStore, User,
};

/// Scripted backend reply
#[derive(Clone)]
pub enum Reply {
    Ok(AuthResponse),
    Status(u16, &'static str),
    Network,
}

impl Reply {
    fn into_result(self) -> Result<AuthResponse, ApiError> {
        match self {
            Reply::Ok(response) => Ok(response),
            Reply::Status(status, message) => Err(ApiError::Status {
                status,
                message: message.to_string(),
            }),
            Reply::Network => Err(ApiError::Network("connection refused".into())),
        }
    }
}

pub struct FakeApi {
    login: Mutex<Reply>,
    register: Mutex<Reply>,
    status: Mutex<Reply>,
    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub presented_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            login: Mutex::new(Reply::Status(401, "Unauthorized")),
            register: Mutex::new(Reply::Status(400, "Bad Request")),
            status: Mutex::new(Reply::Status(401, "Unauthorized")),
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            presented_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn on_login(&self, reply: Reply) {
        *self.login.lock().unwrap() = reply;
    }

    pub fn on_register(&self, reply: Reply) {
        *self.register.lock().unwrap() = reply;
    }

    pub fn on_check_status(&self, reply: Reply) {
        *self.status.lock().unwrap() = reply;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login.lock().unwrap().clone().into_result()
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.register.lock().unwrap().clone().into_result()
    }

    async fn check_status(&self, token: Option<&str>) -> Result<AuthResponse, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.presented_tokens
            .lock()
            .unwrap()
            .push(token.map(str::to_string));
        self.status.lock().unwrap().clone().into_result()
    }
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap()
}

/// Unsigned JWT-shaped token expiring at `at`
pub fn token_expiring_at(at: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "id": "user-1",
        "iat": at.timestamp() - 7200,
        "exp": at.timestamp(),
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

pub fn user(roles: &[&str]) -> User {
    User {
        id: "user-1".into(),
        email: "test1@google.com".into(),
        full_name: "Test One".into(),
        is_active: true,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn ok_reply(token: String, roles: &[&str]) -> Reply {
    Reply::Ok(AuthResponse {
        token,
        user: user(roles),
    })
}

pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub api: Arc<FakeApi>,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None, SessionSettings::default())
    }

    /// Harness whose store already holds `token`, as after a restart
    pub fn with_persisted(token: &str) -> Self {
        Self::build(Some(token), SessionSettings::default())
    }

    pub fn build(persisted: Option<&str>, settings: SessionSettings) -> Self {
        let api = Arc::new(FakeApi::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let storage = Arc::new(MemoryStorage::new());
        if let Some(token) = persisted {
            storage.set(TOKEN_KEY, token).unwrap();
        }

        let manager = Arc::new(SessionManager::new(
            api.clone(),
            TokenStore::new(storage.clone()),
            clock.clone(),
            settings,
        ));

        Self {
            manager,
            api,
            clock,
            storage,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use storefront_session::Clock;
        self.clock.now()
    }

    pub fn token_in(&self, delta: Duration) -> String {
        token_expiring_at(self.now() + delta)
    }

    pub fn persisted_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).unwrap()
    }
}
