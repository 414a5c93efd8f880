//! Decoding of the `GOOGLE_SERVICE_KEY` credential blob.
//!
//! The variable normally holds a base64-encoded service-account JSON key.
//! Anything that does not decode to one is treated as a raw API key.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Clone)]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    ApiKey(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

impl Credentials {
    pub fn decode(raw: &str) -> Self {
        let raw = raw.trim();
        let decoded = decode_base64(raw);
        if let Some(text) = &decoded {
            tracing::debug!("Decoded key format check: {}...", preview(text, 20));
        }

        match decoded
            .as_deref()
            .map(serde_json::from_str::<ServiceAccountKey>)
        {
            Some(Ok(key)) => {
                tracing::info!("Using service account {}", key.client_email);
                Credentials::ServiceAccount(key)
            }
            Some(Err(e)) => {
                tracing::warn!(
                    "GOOGLE_SERVICE_KEY is not a service account key ({}), using it as an API key",
                    e
                );
                Credentials::ApiKey(raw.to_string())
            }
            None => {
                tracing::warn!("GOOGLE_SERVICE_KEY is not base64, using it as an API key");
                Credentials::ApiKey(raw.to_string())
            }
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Credentials::ServiceAccount(key) => key.project_id.as_deref(),
            Credentials::ApiKey(_) => None,
        }
    }
}

/// Diagnostic summary served by `/api/debug`. Never contains the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialReport {
    pub status: String,
    pub is_base64: bool,
    pub key_type: String,
    pub key_format: String,
    pub key_preview: String,
    pub message: String,
}

impl CredentialReport {
    pub fn inspect(raw: &str) -> Self {
        let looks_like_json = decode_base64(raw.trim())
            .map(|text| text.trim_start().starts_with('{'))
            .unwrap_or(false);
        let key_type = match Credentials::decode(raw) {
            Credentials::ServiceAccount(_) => "service account",
            Credentials::ApiKey(_) => "API key",
        };

        Self {
            status: "API Key Check".to_string(),
            is_base64: looks_like_json,
            key_type: key_type.to_string(),
            key_format: if looks_like_json {
                "Appears to be JSON".to_string()
            } else {
                "Not JSON format".to_string()
            },
            key_preview: format!("{}...", preview(raw, 10)),
            message: "This endpoint helps debug API key issues. Check the server logs for more details."
                .to_string(),
        }
    }
}

/// Decode base64 the way `base64 key.json` output is usually pasted: line
/// wrapped, possibly unpadded, in either alphabet.
fn decode_base64(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = LENIENT_STANDARD
        .decode(&compact)
        .or_else(|_| LENIENT_URL_SAFE.decode(&compact))
        .ok()?;
    String::from_utf8(bytes).ok()
}

fn preview(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}
