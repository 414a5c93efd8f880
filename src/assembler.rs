//! Request assembly: turns a submitted [`QuizForm`] into a provider request.
//!
//! The content parts are always, in order: the role/task preamble, then
//! either every uploaded file or the notes text (files win when both are
//! present), then the output-format instruction.

use crate::ai::vertex::types::{InlineData, Part};
use crate::ai::GenerateContentRequest;
use crate::models::{GenerationSettings, QuizForm};
use crate::{prompts, Error, Result};
use base64::Engine as _;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Binary { mime_type: String, data: Bytes },
}

/// Provider-neutral request, built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub preamble: String,
    pub content: Vec<ContentPart>,
    pub format_instruction: String,
}

impl GenerationRequest {
    /// Encode binary parts as base64 inline data and attach sampling and
    /// safety settings.
    pub fn into_wire(self, settings: &GenerationSettings) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(self.content.len() + 2);
        parts.push(Part::text(self.preamble));
        parts.extend(self.content.into_iter().map(|part| match part {
            ContentPart::Text(text) => Part::text(text),
            ContentPart::Binary { mime_type, data } => Part::InlineData {
                inline_data: InlineData {
                    mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(&data),
                },
            },
        }));
        parts.push(Part::text(self.format_instruction));

        GenerateContentRequest::user_turn(parts, settings)
    }
}

pub fn assemble(form: &QuizForm) -> Result<GenerationRequest> {
    if !form.has_input() {
        return Err(Error::MissingInput);
    }

    let mut preamble = prompts::render(
        prompts::QUIZ_PREAMBLE,
        &[("difficulty", form.difficulty())],
    );
    if let Some(topic) = form.topic() {
        preamble.push_str(&prompts::render(prompts::QUIZ_TOPIC, &[("topic", topic)]));
    }

    let content = if form.files.is_empty() {
        vec![ContentPart::Text(form.notes().unwrap_or_default().to_string())]
    } else {
        form.files
            .iter()
            .map(|file| ContentPart::Binary {
                mime_type: file.mime_type.clone(),
                data: file.data.clone(),
            })
            .collect()
    };

    let count = form.quiz_count().to_string();
    let format_instruction = prompts::render(prompts::QUIZ_FORMAT, &[("count", count.as_str())]);

    Ok(GenerationRequest {
        preamble,
        content,
        format_instruction,
    })
}
