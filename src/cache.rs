//! Auth Cache
//!
//! Short-lived memory of the last authentication verdict so repeated status
//! checks don't hit the network.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::token::TokenExpiry;

/// Last known verdict plus when it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCache {
    is_valid: bool,
    last_checked_at: Option<DateTime<Utc>>,
    token_expires_at: Option<DateTime<Utc>>,
}

impl AuthCache {
    pub fn new() -> Self {
        Self {
            is_valid: false,
            last_checked_at: None,
            token_expires_at: None,
        }
    }

    /// Record a successful check
    pub fn mark_valid(&mut self, now: DateTime<Utc>, expiry: TokenExpiry) {
        self.is_valid = true;
        self.last_checked_at = Some(now);
        self.token_expires_at = expiry.instant();
    }

    /// Back to {false, never, none}
    pub fn invalidate(&mut self) {
        *self = Self::new();
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Token expires within `threshold` of `now` (or already has).
    /// An unknown expiration is never near.
    pub fn is_token_near_expiration(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.token_expires_at {
            Some(expires_at) => expires_at - now <= threshold,
            None => false,
        }
    }

    /// Whether the cached verdict may be returned without a network call
    pub fn is_usable(&self, now: DateTime<Utc>, max_age: Duration, threshold: Duration) -> bool {
        let Some(checked_at) = self.last_checked_at else {
            return false;
        };
        self.is_valid
            && now - checked_at < max_age
            && !self.is_token_near_expiration(now, threshold)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> CacheInfo {
        CacheInfo {
            is_valid: self.is_valid,
            last_checked_at: self.last_checked_at,
            token_expires_at: self.token_expires_at,
            elapsed_since_last_check_ms: self
                .last_checked_at
                .map(|at| (now - at).num_milliseconds()),
        }
    }
}

impl Default for AuthCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only diagnostics view of the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub is_valid: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub elapsed_since_last_check_ms: Option<i64>,
}
