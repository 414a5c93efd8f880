//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error: {0}")]
    Provider(ProviderError),

    #[error("Gemini stream error: {0}")]
    Stream(String),

    #[error("Credential error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Please provide either a file or notes")]
    MissingInput,

    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    #[error("Invalid transition: cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

/// A non-success response from the Gemini API.
///
/// `status` is the gRPC-style code from the `error.status` field of the body
/// (for example `PERMISSION_DENIED`), when the body could be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub http_status: u16,
    pub status: Option<String>,
    pub message: String,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Some(status) => write!(
                f,
                "(status {} {}): {}",
                self.http_status, status, self.message
            ),
            None => write!(f, "(status {}): {}", self.http_status, self.message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
