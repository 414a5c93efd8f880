//! Decoding of the multipart `/api/generate` form.

use crate::ai::mime::resolve_mime;
use crate::models::{Attachment, QuizForm};
use crate::{Error, Result};
use axum::extract::Multipart;

/// Read every field of the form. Unknown fields are ignored, empty file
/// parts are skipped, and an unparsable `quizCount` counts as absent.
pub async fn read_quiz_form(mut multipart: Multipart) -> Result<QuizForm> {
    let mut form = QuizForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidForm(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let declared = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidForm(e.body_text()))?;
                if data.is_empty() {
                    tracing::debug!("Skipping empty file part {}", file_name);
                    continue;
                }
                let mime_type = resolve_mime(declared.as_deref(), &data);
                tracing::debug!("Received file {} ({}, {} bytes)", file_name, mime_type, data.len());
                form.files.push(Attachment {
                    file_name,
                    mime_type,
                    data,
                });
            }
            "notes" => form.notes = Some(read_text(field).await?),
            "quizCount" => {
                let raw = read_text(field).await?;
                form.quiz_count = raw.trim().parse().ok();
                if form.quiz_count.is_none() {
                    tracing::debug!("Ignoring unparsable quizCount {:?}", raw);
                }
            }
            "difficulty" => form.difficulty = Some(read_text(field).await?),
            "topic" => form.topic = Some(read_text(field).await?),
            other => tracing::debug!("Ignoring unknown form field {:?}", other),
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| Error::InvalidForm(e.body_text()))
}
