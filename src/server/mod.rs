//! Axum HTTP surface: the streaming generate endpoint and two diagnostics.

pub mod form;
pub mod handlers;

use crate::ai::GenerativeModel;
use crate::credentials::CredentialReport;
use crate::models::GenerationSettings;
use crate::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn GenerativeModel>,
    pub settings: Arc<GenerationSettings>,
    pub credential_report: Arc<CredentialReport>,
}

impl AppState {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        settings: GenerationSettings,
        credential_report: CredentialReport,
    ) -> Self {
        Self {
            model,
            settings: Arc::new(settings),
            credential_report: Arc::new(credential_report),
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/generate", post(handlers::generate))
        .route("/api/debug", get(handlers::debug))
        .route("/api/test-gemini", get(handlers::test_gemini))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Serve `app` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
