//! Token Inspector
//!
//! Reads the expiration claim out of a bearer token without verifying its
//! signature. Only the payload segment is looked at.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use tracing::debug;

/// What the client knows about when a token stops being accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    At(DateTime<Utc>),
    /// Token could not be decoded or carries no `exp` claim
    Unknown,
}

impl TokenExpiry {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            TokenExpiry::At(at) => Some(*at),
            TokenExpiry::Unknown => None,
        }
    }

    /// True only when the expiration is known and not after `now`
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        matches!(self, TokenExpiry::At(at) if *at <= now)
    }
}

/// Extract the `exp` claim (seconds since epoch) from a `header.payload.signature` token
pub fn extract_expiration(token: &str) -> TokenExpiry {
    match decode_exp(token) {
        Some(at) => TokenExpiry::At(at),
        None => {
            debug!("Could not determine token expiration");
            TokenExpiry::Unknown
        }
    }
}

fn decode_exp(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f.trunc() as i64))?;

    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an unsigned token carrying the given claims
    fn token_with_claims(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn reads_exp_claim() {
        let token = token_with_claims(serde_json::json!({ "id": "u1", "exp": 1_900_000_000 }));
        let expiry = extract_expiration(&token);
        assert_eq!(expiry.instant(), DateTime::from_timestamp(1_900_000_000, 0));
    }

    #[test]
    fn accepts_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp": 1700000000}"#);
        let token = format!("{header}.{payload}.sig");
        assert!(matches!(extract_expiration(&token), TokenExpiry::At(_)));
    }

    #[test]
    fn malformed_tokens_are_unknown() {
        for token in ["", "abc", "a.b", "a.!!!.c", "a.b.c.d"] {
            assert_eq!(extract_expiration(token), TokenExpiry::Unknown, "{token}");
        }
        let no_exp = token_with_claims(serde_json::json!({ "id": "u1" }));
        assert_eq!(extract_expiration(&no_exp), TokenExpiry::Unknown);
    }

    #[test]
    fn has_passed_requires_known_expiry() {
        let now = Utc::now();
        assert!(!TokenExpiry::Unknown.has_passed(now));
        assert!(TokenExpiry::At(now).has_passed(now));
        assert!(!TokenExpiry::At(now + chrono::Duration::seconds(1)).has_passed(now));
    }
}
