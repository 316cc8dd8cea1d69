//! API Module
//!
//! HTTP communication with the storefront auth endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::session::User;

/// Transport used by the session manager
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// `GET /auth/check-status`, optionally presenting `token`
    async fn check_status(&self, token: Option<&str>) -> Result<AuthResponse, ApiError>;
}

/// reqwest-backed client for the storefront backend
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach the bearer token, if any, to an outgoing request
    pub fn authorize(
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<AuthResponse, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorPayload::message_from(&body),
            });
        }

        response
            .json::<AuthResponse>()
            .await
            .map_err(|e| ApiError::Parse {
                status: status.as_u16(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.url("/auth/login");
        debug!("Logging in at: {}", url);

        let data = self.send(self.client.post(&url).json(request)).await?;
        info!(user_id = %data.user.id, "Login accepted");
        Ok(data)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.url("/auth/register");
        debug!("Registering at: {}", url);

        let data = self.send(self.client.post(&url).json(request)).await?;
        info!(user_id = %data.user.id, "Registration accepted");
        Ok(data)
    }

    async fn check_status(&self, token: Option<&str>) -> Result<AuthResponse, ApiError> {
        let url = self.url("/auth/check-status");
        debug!(with_token = token.is_some(), "Checking auth status at: {}", url);

        self.send(Self::authorize(self.client.get(&url), token)).await
    }
}

// Request/Response types

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Body of every successful auth call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// NestJS-style error body: `message` is a string or a list of strings
#[derive(Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<ErrorMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorPayload {
    /// Best-effort backend message from a raw error body
    fn message_from(body: &str) -> String {
        let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) else {
            return body.trim().to_string();
        };
        match (payload.message, payload.error) {
            (Some(ErrorMessage::One(message)), _) => message,
            (Some(ErrorMessage::Many(messages)), _) => messages.join(", "),
            (None, Some(error)) => error,
            (None, None) => String::new(),
        }
    }
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Parse error ({status}): {reason}")]
    Parse { status: u16, reason: String },
}
