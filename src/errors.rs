//! Error Translator
//!
//! Turns a failed auth request (status code + backend message) into one
//! user-facing sentence and a coarse kind the UI can style on. Each
//! operation has its own ordered rule table; the first matching rule wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::api::ApiError;

/// Status used for "no response at all"
pub const STATUS_NO_CONNECTION: u16 = 0;

const CONNECTIVITY_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection and try again.";
const SERVER_FAULT_MESSAGE: &str =
    "The server is experiencing technical difficulties. Please try again later.";
const CHECK_FIELDS_MESSAGE: &str = "Please check the information you entered and try again.";
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";
const EMAIL_REGISTERED_MESSAGE: &str = "This email address is already registered.";

/// What the UI should treat the failure as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthErrorKind {
    Validation,
    Credentials,
    NotFound,
    EmailExists,
    General,
}

/// Where the failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCategory {
    Connectivity,
    ServerFault,
    ClientValidation,
    Credentials,
    NotFound,
    Conflict,
    RateLimited,
    Unexpected,
}

/// Which request failed; each has its own rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Register,
}

/// A translated, user-safe authentication failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub category: FailureCategory,
    /// HTTP status, `0` when no response arrived
    pub status: u16,
    pub message: String,
}

impl AuthError {
    /// A success response whose body could not be understood
    pub fn unexpected_response(status: u16) -> Self {
        Self {
            kind: AuthErrorKind::General,
            category: FailureCategory::Unexpected,
            status,
            message: UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

enum Message {
    Fixed(&'static str),
    /// Cleaned backend text, or the fallback when nothing is left
    Cleaned(&'static str),
}

struct Rule {
    applies: fn(u16, &str) -> bool,
    kind: AuthErrorKind,
    category: FailureCategory,
    message: Message,
}

fn has_all(message: &str, words: &[&str]) -> bool {
    words.iter().all(|w| message.contains(w))
}

fn has_any(message: &str, words: &[&str]) -> bool {
    words.iter().any(|w| message.contains(w))
}

fn transport_rules() -> Vec<Rule> {
    vec![
        Rule {
            applies: |status, _| status == STATUS_NO_CONNECTION,
            kind: AuthErrorKind::General,
            category: FailureCategory::Connectivity,
            message: Message::Fixed(CONNECTIVITY_MESSAGE),
        },
        Rule {
            applies: |status, _| status >= 500,
            kind: AuthErrorKind::General,
            category: FailureCategory::ServerFault,
            message: Message::Fixed(SERVER_FAULT_MESSAGE),
        },
    ]
}

/// 400 rules shared by login and register, ending in the cleaned fallback
fn validation_rules() -> Vec<Rule> {
    fn rule(applies: fn(u16, &str) -> bool, message: Message) -> Rule {
        Rule {
            applies,
            kind: AuthErrorKind::Validation,
            category: FailureCategory::ClientValidation,
            message,
        }
    }

    vec![
        rule(
            |s, m| {
                s == 400 && m.contains("email") && has_any(m, &["required", "should not be empty"])
            },
            Message::Fixed("Email is required."),
        ),
        rule(
            |s, m| {
                s == 400
                    && m.contains("password")
                    && has_any(m, &["required", "should not be empty"])
            },
            Message::Fixed("Password is required."),
        ),
        rule(
            |s, m| {
                s == 400
                    && has_any(m, &["fullname", "full name"])
                    && has_any(m, &["required", "should not be empty", "must be longer"])
            },
            Message::Fixed("Full name is required."),
        ),
        rule(
            |s, m| {
                s == 400
                    && m.contains("email")
                    && has_any(m, &["must be an email", "valid", "format"])
            },
            Message::Fixed("Please enter a valid email address."),
        ),
        rule(
            |s, m| {
                s == 400
                    && m.contains("password")
                    && has_any(m, &["longer than", "at least", "too short", "minimum"])
            },
            Message::Fixed("Password must be at least 6 characters long."),
        ),
        rule(
            |s, m| {
                s == 400
                    && m.contains("password")
                    && has_any(m, &["uppercase", "lowercase", "number", "must have"])
            },
            Message::Fixed(
                "Password must contain an uppercase letter, a lowercase letter and a number.",
            ),
        ),
        rule(|s, _| s == 400, Message::Cleaned(CHECK_FIELDS_MESSAGE)),
    ]
}

fn general_fallback() -> Rule {
    Rule {
        applies: |_, _| true,
        kind: AuthErrorKind::General,
        category: FailureCategory::Unexpected,
        message: Message::Fixed(UNEXPECTED_MESSAGE),
    }
}

static LOGIN_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules = transport_rules();
    rules.extend(validation_rules());
    rules.extend([
        Rule {
            applies: |s, m| s == 401 && m.contains("inactive"),
            kind: AuthErrorKind::Credentials,
            category: FailureCategory::Credentials,
            message: Message::Fixed("This account is inactive. Please contact an administrator."),
        },
        Rule {
            applies: |s, m| {
                s == 401
                    && m.contains("password")
                    && has_any(m, &["incorrect", "wrong", "invalid", "not valid"])
            },
            kind: AuthErrorKind::Credentials,
            category: FailureCategory::Credentials,
            message: Message::Fixed("Incorrect password. Please try again."),
        },
        Rule {
            applies: |s, m| {
                s == 401
                    && ((has_any(m, &["user", "email", "account"])
                        && has_any(m, &["not found", "does not exist", "not exist"]))
                        || m.contains("(email)"))
            },
            kind: AuthErrorKind::Credentials,
            category: FailureCategory::Credentials,
            message: Message::Fixed("User not found. Please check your email address."),
        },
        Rule {
            applies: |s, _| s == 401,
            kind: AuthErrorKind::Credentials,
            category: FailureCategory::Credentials,
            message: Message::Fixed("Invalid email or password."),
        },
        Rule {
            applies: |s, _| s == 404,
            kind: AuthErrorKind::NotFound,
            category: FailureCategory::NotFound,
            message: Message::Fixed("No account exists with this email address."),
        },
        Rule {
            applies: |s, _| s == 429,
            kind: AuthErrorKind::General,
            category: FailureCategory::RateLimited,
            message: Message::Fixed(
                "Too many login attempts. Please wait a few minutes and try again.",
            ),
        },
        general_fallback(),
    ]);
    rules
});

static REGISTER_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules = transport_rules();
    rules.extend([
        Rule {
            applies: |s, m| {
                (s == 400 || s == 409)
                    && m.contains("email")
                    && (has_any(m, &["already exists", "duplicate"])
                        || has_all(m, &["key", "exists"]))
            },
            kind: AuthErrorKind::EmailExists,
            category: FailureCategory::Conflict,
            message: Message::Fixed(EMAIL_REGISTERED_MESSAGE),
        },
        Rule {
            applies: |s, _| s == 409,
            kind: AuthErrorKind::EmailExists,
            category: FailureCategory::Conflict,
            message: Message::Fixed(EMAIL_REGISTERED_MESSAGE),
        },
    ]);
    rules.extend(validation_rules());
    rules.extend([
        Rule {
            applies: |s, _| s == 422,
            kind: AuthErrorKind::Validation,
            category: FailureCategory::ClientValidation,
            message: Message::Fixed(
                "The information provided is invalid. Please review it and try again.",
            ),
        },
        general_fallback(),
    ]);
    rules
});

/// Translate a failure of `operation` given the status and raw backend message
pub fn translate(operation: AuthOperation, status: u16, backend_message: &str) -> AuthError {
    let rules: &[Rule] = match operation {
        AuthOperation::Login => LOGIN_RULES.as_slice(),
        AuthOperation::Register => REGISTER_RULES.as_slice(),
    };
    let lowered = backend_message.to_lowercase();

    // The tables end in a catch-all, so a rule always matches
    let rule = rules
        .iter()
        .find(|rule| (rule.applies)(status, &lowered))
        .unwrap_or_else(|| &rules[rules.len() - 1]);

    let message = match rule.message {
        Message::Fixed(text) => text.to_string(),
        Message::Cleaned(fallback) => {
            let cleaned = clean_error_message(backend_message);
            if cleaned.is_empty() {
                fallback.to_string()
            } else {
                cleaned
            }
        }
    };

    AuthError {
        kind: rule.kind,
        category: rule.category,
        status,
        message,
    }
}

/// Translate a transport-level failure of `operation`
pub fn translate_api_error(operation: AuthOperation, error: &ApiError) -> AuthError {
    match error {
        ApiError::Network(_) => translate(operation, STATUS_NO_CONNECTION, ""),
        ApiError::Status { status, message } => translate(operation, *status, message),
        ApiError::Parse { status, .. } => AuthError::unexpected_response(*status),
    }
}

pub fn translate_login_error(status: u16, backend_message: &str) -> AuthError {
    translate(AuthOperation::Login, status, backend_message)
}

pub fn translate_register_error(status: u16, backend_message: &str) -> AuthError {
    translate(AuthOperation::Register, status, backend_message)
}

static CLEANUPS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (
            r"(?i)key \(email\)=\([^)]*\) already exists\.?",
            EMAIL_REGISTERED_MESSAGE,
        ),
        (r"(?i)key \((\w+)\)=\([^)]*\) already exists\.?", "This $1 is already in use."),
        (
            r#"(?i)duplicate key value violates unique constraint\s*"?[\w.]*"?\s*:?"#,
            "This record already exists.",
        ),
        (
            r"(?i)\b(?:QueryFailedError|SequelizeValidationError|ValidationError|PrismaClientKnownRequestError)\b\s*:?\s*",
            "",
        ),
        (r"(?i)^\s*(?:bad request|validation (?:failed|error))\s*[:\-]?\s*", ""),
        (
            r"(?i)(?:\bER_DUP_ENTRY\b|\bSQLSTATE\[\w+\]|\b(?:23505|23502|P2002)\b)\s*:?\s*",
            "",
        ),
        (r"\s{2,}", " "),
        (r"\.{2,}", "."),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Strip database/ORM artifacts from a backend message and make it a sentence
pub fn clean_error_message(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    for (pattern, replacement) in CLEANUPS.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    let text = text.trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-');
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut sentence: String = first.to_uppercase().chain(chars).collect();
    if !sentence.ends_with(['.', '!', '?']) {
        sentence.push('.');
    }
    sentence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_connection_is_general_connectivity() {
        for op in [AuthOperation::Login, AuthOperation::Register] {
            let err = translate(op, 0, "whatever the backend said");
            assert_eq!(err.kind, AuthErrorKind::General);
            assert_eq!(err.category, FailureCategory::Connectivity);
            assert_eq!(err.message, CONNECTIVITY_MESSAGE);
        }
    }

    #[test]
    fn server_errors_hide_details() {
        let err = translate_login_error(503, "upstream connect error: pool exhausted");
        assert_eq!(err.category, FailureCategory::ServerFault);
        assert_eq!(err.message, SERVER_FAULT_MESSAGE);
    }

    #[test]
    fn login_credentials_are_distinguished() {
        let err = translate_login_error(401, "Incorrect password");
        assert_eq!(err.kind, AuthErrorKind::Credentials);
        assert!(err.message.contains("Incorrect password"));

        let err = translate_login_error(401, "Credentials are not valid (email)");
        assert!(err.message.starts_with("User not found"));

        let err = translate_login_error(401, "User not found");
        assert!(err.message.starts_with("User not found"));

        let err = translate_login_error(401, "Unauthorized");
        assert_eq!(err.message, "Invalid email or password.");

        let err = translate_login_error(401, "User is inactive, talk with an admin");
        assert!(err.message.contains("inactive"));
    }

    #[test]
    fn login_not_found_and_rate_limit() {
        let err = translate_login_error(404, "");
        assert_eq!(err.kind, AuthErrorKind::NotFound);
        assert_eq!(err.category, FailureCategory::NotFound);

        let err = translate_login_error(429, "ThrottlerException: Too Many Requests");
        assert_eq!(err.kind, AuthErrorKind::General);
        assert_eq!(err.category, FailureCategory::RateLimited);
    }

    #[test]
    fn bad_request_picks_specific_validation_message() {
        let cases = [
            ("email should not be empty", "Email is required."),
            ("Password is required", "Password is required."),
            ("email must be an email", "Please enter a valid email address."),
            (
                "password must be longer than or equal to 6 characters",
                "Password must be at least 6 characters long.",
            ),
            (
                "The password must have a Uppercase, lowercase letter and a number",
                "Password must contain an uppercase letter, a lowercase letter and a number.",
            ),
        ];
        for (backend, expected) in cases {
            let err = translate_login_error(400, backend);
            assert_eq!(err.kind, AuthErrorKind::Validation, "{backend}");
            assert_eq!(err.message, expected, "{backend}");
        }

        let err =
            translate_register_error(400, "fullName must be longer than or equal to 1 characters");
        assert_eq!(err.message, "Full name is required.");
    }

    #[test]
    fn bad_request_falls_back_to_cleaned_then_generic() {
        let err = translate_login_error(400, "Bad Request: quantity must be positive");
        assert_eq!(err.message, "Quantity must be positive.");

        let err = translate_login_error(400, "   ");
        assert_eq!(err.message, CHECK_FIELDS_MESSAGE);
        assert_eq!(err.kind, AuthErrorKind::Validation);
    }

    #[test]
    fn register_duplicate_email() {
        let err = translate_register_error(400, "Key (email)=(a@b.com) already exists.");
        assert_eq!(err.kind, AuthErrorKind::EmailExists);
        assert_eq!(err.category, FailureCategory::Conflict);
        assert_eq!(err.message, "This email address is already registered.");

        let err = translate_register_error(409, "");
        assert_eq!(err.kind, AuthErrorKind::EmailExists);

        let err = translate_register_error(400, "duplicate email");
        assert_eq!(err.kind, AuthErrorKind::EmailExists);
    }

    #[test]
    fn register_unprocessable_is_validation() {
        let err = translate_register_error(422, "nope");
        assert_eq!(err.kind, AuthErrorKind::Validation);
        assert!(err.message.contains("invalid"));
    }

    #[test]
    fn login_and_register_tables_differ() {
        assert_eq!(translate_login_error(409, "").kind, AuthErrorKind::General);
        assert_eq!(
            translate_register_error(401, "Incorrect password").kind,
            AuthErrorKind::General
        );
    }

    #[test]
    fn transport_errors_translate() {
        let refused = ApiError::Network("connection refused".into());
        let err = translate_api_error(AuthOperation::Login, &refused);
        assert_eq!(err.status, 0);
        assert_eq!(err.message, CONNECTIVITY_MESSAGE);

        let err = translate_api_error(
            AuthOperation::Register,
            &ApiError::Parse {
                status: 201,
                reason: "missing field `token`".into(),
            },
        );
        assert_eq!(err.kind, AuthErrorKind::General);
        assert_eq!(err.category, FailureCategory::Unexpected);
        assert!(!err.message.contains("token"));
    }

    #[test]
    fn unmapped_status_never_echoes_backend_text() {
        let err = translate_login_error(418, "internal: user_id 42 missing in tenant acme");
        assert_eq!(err.kind, AuthErrorKind::General);
        assert_eq!(err.category, FailureCategory::Unexpected);
        assert_eq!(err.message, UNEXPECTED_MESSAGE);

        let err = translate_register_error(401, "Credentials are not valid (password)");
        assert_eq!(err.message, UNEXPECTED_MESSAGE);

        let err = translate_login_error(403, "Forbidden resource");
        assert!(!err.message.contains("Forbidden"));
    }

    #[test]
    fn translation_is_deterministic() {
        let a = translate_login_error(401, "Incorrect password");
        let b = translate_login_error(401, "Incorrect password");
        assert_eq!(a, b);
    }

    #[test]
    fn clean_error_message_rewrites_artifacts() {
        assert_eq!(
            clean_error_message("Key (email)=(a@b.com) already exists."),
            "This email address is already registered."
        );
        assert_eq!(
            clean_error_message("Key (slug)=(shirt) already exists."),
            "This slug is already in use."
        );
        assert_eq!(
            clean_error_message(r#"duplicate key value violates unique constraint "UQ_users_email""#),
            "This record already exists."
        );
        assert_eq!(
            clean_error_message("QueryFailedError: ER_DUP_ENTRY: entry exists"),
            "Entry exists."
        );
        assert_eq!(
            clean_error_message("validation failed: name is too long!"),
            "Name is too long!"
        );
        assert_eq!(clean_error_message(""), "");
    }
}
