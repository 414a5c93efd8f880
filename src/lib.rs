//! Quiz generator backed by Gemini on Vertex AI.
//!
//! Accepts uploaded study material or pasted notes, asks the model for a set
//! of multiple-choice questions, and relays the generated JSON back as a
//! text stream. The `client` module consumes that stream and parses it into
//! structured quizzes.

pub mod ai;
pub mod app;
pub mod assembler;
pub mod classify;
pub mod client;
pub mod credentials;
pub mod error;
pub mod models;
pub mod prompts;
pub mod relay;
pub mod server;

pub use error::{Error, Result};
