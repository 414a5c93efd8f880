//! Application wiring: configuration, credentials, model client and router.

use crate::ai::{GenerativeModel, VertexClient, VertexEndpoint};
use crate::credentials::{CredentialReport, Credentials};
use crate::models::{Config, GenerationSettings};
use crate::server::{self, AppState};
use crate::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Serves quiz generation against one configured model.
pub struct App {
    state: AppState,
    bind_addr: String,
    max_upload_bytes: usize,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub model: Arc<dyn GenerativeModel>,
    pub settings: GenerationSettings,
    pub credential_report: CredentialReport,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, bind_addr: String, max_upload_bytes: usize) -> Self {
        Self {
            state: AppState::new(
                services.model,
                services.settings,
                services.credential_report,
            ),
            bind_addr,
            max_upload_bytes,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        Self::from_config(Config::from_env()?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = Credentials::decode(&config.service_key);
        let report = CredentialReport::inspect(&config.service_key);
        info!("Using {} credentials", report.key_type);

        let endpoint = VertexEndpoint::from_config(&config, &credentials)?;
        info!(
            "Model: {} (project: {}, location: {}, base: {})",
            endpoint.model,
            endpoint.project.as_deref().unwrap_or("-"),
            endpoint.location,
            endpoint.base_url
        );

        let model: Arc<dyn GenerativeModel> = Arc::new(VertexClient::new(credentials, endpoint));

        Ok(Self::with_services(
            AppServices {
                model,
                settings: config.generation,
                credential_report: report,
            },
            config.bind_addr,
            config.max_upload_bytes,
        ))
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone(), self.max_upload_bytes)
    }

    /// Bind `bind_addr` (or the configured address) and serve until Ctrl-C.
    pub async fn run(&self, bind_addr: Option<&str>) -> Result<()> {
        let addr = bind_addr.unwrap_or(&self.bind_addr);
        let listener = TcpListener::bind(addr).await?;
        server::serve(listener, self.router()).await
    }
}
