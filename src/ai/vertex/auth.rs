//! OAuth access tokens for a service account via the JWT bearer grant.

use crate::credentials::ServiceAccountKey;
use crate::{Error, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: i64,
}

/// Exchanges signed assertions for access tokens and caches the result until
/// it is about to expire.
pub struct TokenSource {
    key: ServiceAccountKey,
    client: Client,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, client: Client) -> Self {
        Self {
            key,
            client,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if now + REFRESH_MARGIN_SECS < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String> {
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: &self.key.token_uri,
            exp: now + TOKEN_LIFETIME_SECS,
            iat: now,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self
            .key
            .private_key_id
            .clone()
            .filter(|kid| !kid.trim().is_empty());

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| Error::Auth(format!("Invalid service account private key: {}", e)))?;
        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| Error::Auth(format!("Failed to sign token assertion: {}", e)))
    }

    async fn fetch(&self, now: i64) -> Result<AccessToken> {
        tracing::debug!(
            "Requesting access token for {} from {}",
            self.key.client_email,
            self.key.token_uri
        );
        let assertion = self.sign_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token exchange failed (status {}): {}", status, body);
            return Err(Error::Auth(format!(
                "Token exchange failed (status {}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("Invalid token response: {}", e)))?;

        Ok(AccessToken {
            token: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS),
        })
    }
}
