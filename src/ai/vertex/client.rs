use super::auth::TokenSource;
use super::sse::SseDecoder;
use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::ai::{ChunkStream, GenerativeModel};
use crate::credentials::Credentials;
use crate::error::ProviderError;
use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response};

const GLOBAL_BASE_URL: &str = "https://aiplatform.googleapis.com";

/// Where requests are sent: a regional, project-scoped publisher model, or
/// the global express endpoint when only an API key is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexEndpoint {
    pub base_url: String,
    pub project: Option<String>,
    pub location: String,
    pub model: String,
}

impl VertexEndpoint {
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let model = config
            .model
            .strip_prefix("models/")
            .unwrap_or(&config.model)
            .to_string();

        let (project, default_base) = match credentials {
            Credentials::ServiceAccount(_) => {
                let project = config
                    .project
                    .clone()
                    .or_else(|| credentials.project_id().map(str::to_string))
                    .ok_or_else(|| {
                        Error::Config(
                            "No project id in credentials and GOOGLE_CLOUD_PROJECT not set"
                                .to_string(),
                        )
                    })?;
                (
                    Some(project),
                    format!("https://{}-aiplatform.googleapis.com", config.location),
                )
            }
            Credentials::ApiKey(_) => (None, GLOBAL_BASE_URL.to_string()),
        };

        Ok(Self {
            base_url: config
                .base_url
                .clone()
                .unwrap_or(default_base)
                .trim_end_matches('/')
                .to_string(),
            project,
            location: config.location.clone(),
            model,
        })
    }

    fn method_url(&self, method: &str) -> String {
        match &self.project {
            Some(project) => format!(
                "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
                self.base_url, project, self.location, self.model, method
            ),
            None => format!(
                "{}/v1/publishers/google/models/{}:{}",
                self.base_url, self.model, method
            ),
        }
    }
}

enum Auth {
    Bearer(TokenSource),
    ApiKey(String),
}

/// Vertex AI Gemini client for `streamGenerateContent` and `generateContent`.
pub struct VertexClient {
    client: Client,
    auth: Auth,
    endpoint: VertexEndpoint,
}

impl VertexClient {
    pub fn new(credentials: Credentials, endpoint: VertexEndpoint) -> Self {
        Self::new_with_client(credentials, endpoint, Client::new())
    }

    pub fn new_with_client(
        credentials: Credentials,
        endpoint: VertexEndpoint,
        client: Client,
    ) -> Self {
        let auth = match credentials {
            Credentials::ServiceAccount(key) => Auth::Bearer(TokenSource::new(key, client.clone())),
            Credentials::ApiKey(key) => Auth::ApiKey(key),
        };
        Self {
            client,
            auth,
            endpoint,
        }
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        match &self.auth {
            Auth::Bearer(tokens) => Ok(builder.bearer_auth(tokens.access_token().await?)),
            Auth::ApiKey(key) => Ok(builder.header("x-goog-api-key", key)),
        }
    }

    async fn post(&self, url: String, request: &GenerateContentRequest) -> Result<Response> {
        let builder = self.client.post(&url).json(request);
        let response = self
            .authorize(builder)
            .await?
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let err = provider_error(response).await;
            tracing::error!("Gemini API error {}", err);
            return Err(Error::Provider(err));
        }

        Ok(response)
    }
}

/// Decode a non-success response into a [`ProviderError`].
async fn provider_error(response: Response) -> ProviderError {
    let http_status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let value: Option<serde_json::Value> = serde_json::from_str(&body).ok();

    match value.as_ref().and_then(error_object) {
        Some(error) => error_from_object(error, http_status),
        None => ProviderError {
            http_status,
            status: None,
            message: body,
        },
    }
}

/// The `error` object of a Google API error body. Stream endpoints may wrap
/// it in an array.
fn error_object(value: &serde_json::Value) -> Option<&serde_json::Value> {
    let error = match value {
        serde_json::Value::Array(items) => items.first()?.get("error")?,
        other => other.get("error")?,
    };
    error.is_object().then_some(error)
}

fn error_from_object(error: &serde_json::Value, http_status: u16) -> ProviderError {
    ProviderError {
        http_status,
        status: error["status"].as_str().map(str::to_string),
        message: error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    }
}

#[async_trait]
impl GenerativeModel for VertexClient {
    async fn stream_generate_content(&self, request: &GenerateContentRequest) -> Result<ChunkStream> {
        let url = format!("{}?alt=sse", self.endpoint.method_url("streamGenerateContent"));
        tracing::debug!(
            "Opening Gemini stream ({} parts) at {}",
            request.parts().len(),
            url
        );
        let response = self.post(url, request).await?;

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut bytes = Box::pin(response.bytes_stream());

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(Error::Stream(format!("Stream read error: {}", e)));
                        return;
                    }
                };
                for data in decoder.feed(&chunk) {
                    yield decode_chunk(&data);
                }
            }

            if let Some(data) = decoder.finish() {
                yield decode_chunk(&data);
            }
        };

        Ok(Box::pin(stream))
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint.method_url("generateContent");
        let response = self.post(url, request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Stream(format!("Failed to parse Gemini response: {}", e))
        })
    }
}

/// Decode one SSE payload. An `error` event sent after the stream has
/// started becomes a provider error carrying the event's own code.
fn decode_chunk(data: &str) -> Result<GenerateContentResponse> {
    let value: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| Error::Stream(format!("Undecodable stream chunk: {}", e)))?;

    if let Some(error) = error_object(&value) {
        let code = error["code"]
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(500);
        let err = error_from_object(error, code);
        tracing::error!("Gemini stream reported an error {}", err);
        return Err(Error::Provider(err));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::Stream(format!("Undecodable stream chunk: {}", e)))
}
