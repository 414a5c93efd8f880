//! Generative model integration for quiz generation
//!
//! Provides the Vertex AI Gemini client used in production and a scripted
//! mock used by tests and local harnesses.

pub mod mime;
pub mod mock;
pub mod vertex;

pub use mock::MockGenerativeModel;
pub use vertex::{
    GenerateContentRequest, GenerateContentResponse, VertexClient, VertexEndpoint,
};

use crate::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Provider response chunks in the order the provider produced them.
pub type ChunkStream = BoxStream<'static, Result<GenerateContentResponse>>;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Open a streaming generation. Errors raised before the first chunk
    /// (authentication, permission, quota) are returned here; errors after
    /// that arrive as items of the stream.
    async fn stream_generate_content(&self, request: &GenerateContentRequest)
        -> Result<ChunkStream>;

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}
