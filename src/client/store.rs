//! Client-side generation state: idle, streaming, or done with quizzes.

use super::accumulator::{parse_quizzes, PARSE_ERROR_MESSAGE};
use crate::models::Quiz;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Streaming,
    Done(Vec<Quiz>),
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Streaming => "streaming",
            Status::Done(_) => "done",
        }
    }
}

/// Holds the generation status, the raw text accumulated so far, and the
/// last user-facing error message.
///
/// Transitions:
/// - `submit`: any -> streaming (clears text, error and quizzes)
/// - `chunk_received`: streaming -> streaming (appends text)
/// - `stream_closed_success`: streaming -> done, or idle on a parse failure
/// - `stream_closed_failure`: streaming -> idle
/// - `reset`: any -> idle
#[derive(Debug, Clone)]
pub struct QuizStore {
    status: Status,
    text: String,
    error_message: Option<String>,
}

impl Default for QuizStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizStore {
    pub fn new() -> Self {
        Self {
            status: Status::Idle,
            text: String::new(),
            error_message: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Quizzes, available only once a stream has completed and parsed.
    pub fn quizzes(&self) -> Option<&[Quiz]> {
        match &self.status {
            Status::Done(quizzes) => Some(quizzes),
            _ => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.status == Status::Streaming
    }

    pub fn submit(&mut self) {
        self.text.clear();
        self.error_message = None;
        self.status = Status::Streaming;
    }

    pub fn chunk_received(&mut self, text: &str) -> Result<()> {
        self.require(Status::Streaming, "receive a chunk")?;
        self.text.push_str(text);
        Ok(())
    }

    /// Parse the accumulated text. A parse failure is not an `Err`: the
    /// store returns to idle with the parse error message set.
    pub fn stream_closed_success(&mut self) -> Result<()> {
        self.require(Status::Streaming, "complete")?;
        match parse_quizzes(&self.text) {
            Ok(quizzes) => {
                tracing::info!("Parsed {} quizzes", quizzes.len());
                self.status = Status::Done(quizzes);
            }
            Err(e) => {
                tracing::warn!("Failed to parse quiz data: {}", e);
                self.error_message = Some(PARSE_ERROR_MESSAGE.to_string());
                self.text.clear();
                self.status = Status::Idle;
            }
        }
        Ok(())
    }

    pub fn stream_closed_failure(&mut self, reason: &str) -> Result<()> {
        self.require(Status::Streaming, "fail")?;
        self.error_message = Some(format!("Error generating quizzes: {}", reason));
        self.text.clear();
        self.status = Status::Idle;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.status = Status::Idle;
        self.text.clear();
        self.error_message = None;
    }

    fn require(&self, wanted: Status, event: &'static str) -> Result<()> {
        if self.status.name() == wanted.name() {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                state: self.status.name(),
                event,
            })
        }
    }
}
