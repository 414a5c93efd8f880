pub mod auth;
pub mod client;
pub mod sse;
pub mod types;

pub use client::{VertexClient, VertexEndpoint};
pub use types::{GenerateContentRequest, GenerateContentResponse};
