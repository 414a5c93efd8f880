//! Maps provider failures to the fixed messages shown to users.
//!
//! Anything mentioning `PERMISSION_DENIED` is a permission error. Otherwise a
//! structured signal (the Google `error.status` code or a decisive HTTP
//! status) decides, and substring matching on the error text is used only
//! when the error carries no code.

use crate::Error;

const PERMISSION_SUBSTRINGS: &[&str] = &["PERMISSION_DENIED", "permission denied"];
const AUTHENTICATION_SUBSTRINGS: &[&str] = &["authentication", "auth", "credential"];
const QUOTA_SUBSTRINGS: &[&str] = &["quota", "rate limit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Permission,
    Authentication,
    Quota,
    Unknown,
}

impl ErrorClass {
    pub fn of(err: &Error) -> Self {
        let text = err.to_string();
        let (code, http_status) = match err {
            Error::Provider(p) => (p.status.as_deref(), Some(p.http_status)),
            _ => (None, None),
        };

        if code == Some("PERMISSION_DENIED")
            || http_status == Some(403)
            || contains_any(&text, PERMISSION_SUBSTRINGS)
        {
            return ErrorClass::Permission;
        }

        match (code, http_status) {
            (Some("UNAUTHENTICATED"), _) | (_, Some(401)) => return ErrorClass::Authentication,
            (Some("RESOURCE_EXHAUSTED"), _) | (_, Some(429)) => return ErrorClass::Quota,
            (Some(_), _) => return ErrorClass::Unknown,
            _ => {}
        }

        if matches!(err, Error::Auth(_)) || contains_any(&text, AUTHENTICATION_SUBSTRINGS) {
            ErrorClass::Authentication
        } else if contains_any(&text, QUOTA_SUBSTRINGS) {
            ErrorClass::Quota
        } else {
            ErrorClass::Unknown
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorClass::Permission => "Permission denied accessing Google Cloud project. Please check your API key and project configuration.",
            ErrorClass::Authentication => "Authentication error with Google Cloud. Please check your API key format and permissions.",
            ErrorClass::Quota => "API quota exceeded or rate limited. Please try again later.",
            ErrorClass::Unknown => "Error generating quizzes, try again!",
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}
