//! Storefront Session Library
//!
//! Authentication session manager for the storefront client: token
//! persistence, a short-lived validity cache, proactive refresh and
//! user-facing error translation.

pub mod api;
pub mod cache;
pub mod clock;
pub mod commands;
pub mod config;
pub mod errors;
pub mod guards;
pub mod logging;
pub mod manager;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod token;

pub use api::{ApiClient, ApiError, AuthApi, AuthResponse};
pub use cache::CacheInfo;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{AuthError, AuthErrorKind, FailureCategory};
pub use manager::{AuthSuccess, SessionManager, SessionSettings};
pub use scheduler::SchedulerHandle;
pub use session::{AuthStatus, User};
pub use storage::{KeyValueStore, MemoryStorage, SecureStorage, TokenStore};
pub use token::{extract_expiration, TokenExpiry};
