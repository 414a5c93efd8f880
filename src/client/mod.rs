//! HTTP client for `/api/generate` that drives a [`QuizStore`].

pub mod accumulator;
pub mod render;
pub mod store;

pub use accumulator::{parse_quizzes, strip_fences, Utf8Decoder};
pub use store::{QuizStore, Status};

use crate::models::QuizForm;
use crate::{Error, Result};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

pub struct QuizClient {
    client: Client,
    base_url: String,
}

impl QuizClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn generate(&self, form: &QuizForm, store: &mut QuizStore) -> Result<()> {
        self.generate_with(form, store, |_| {}).await
    }

    /// Submit the form and stream the response into `store`, calling
    /// `on_chunk` with each decoded piece of text as it arrives.
    ///
    /// Transport failures and non-2xx responses leave the store idle with an
    /// error message and are also returned as `Err`. A body that does not
    /// parse as quizzes is not an `Err`; the store carries the message.
    pub async fn generate_with<F>(
        &self,
        form: &QuizForm,
        store: &mut QuizStore,
        mut on_chunk: F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        store.submit();

        let multipart = match build_multipart(form) {
            Ok(multipart) => multipart,
            Err(e) => return fail(store, e),
        };
        let url = format!("{}/api/generate", self.base_url);
        tracing::debug!("Submitting quiz form to {}", url);

        let response = match self.client.post(&url).multipart(multipart).send().await {
            Ok(response) => response,
            Err(e) => return fail(store, Error::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return fail(
                store,
                Error::Api {
                    status: status.as_u16(),
                    body,
                },
            );
        }

        let mut decoder = Utf8Decoder::new();
        let mut body = response.bytes_stream();
        while let Some(item) = body.next().await {
            match item {
                Ok(bytes) => {
                    let text = decoder.decode(&bytes);
                    if !text.is_empty() {
                        on_chunk(&text);
                        store.chunk_received(&text)?;
                    }
                }
                Err(e) => return fail(store, Error::Http(e)),
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            on_chunk(&tail);
            store.chunk_received(&tail)?;
        }

        store.stream_closed_success()
    }
}

fn fail(store: &mut QuizStore, err: Error) -> Result<()> {
    tracing::error!("Quiz generation failed: {}", err);
    store.stream_closed_failure(&err.to_string())?;
    Err(err)
}

fn build_multipart(form: &QuizForm) -> Result<Form> {
    let mut multipart = Form::new();

    for file in &form.files {
        let part = Part::bytes(file.data.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        multipart = multipart.part("files", part);
    }
    if let Some(notes) = &form.notes {
        multipart = multipart.text("notes", notes.clone());
    }
    if let Some(count) = form.quiz_count {
        multipart = multipart.text("quizCount", count.to_string());
    }
    if let Some(difficulty) = &form.difficulty {
        multipart = multipart.text("difficulty", difficulty.clone());
    }
    if let Some(topic) = &form.topic {
        multipart = multipart.text("topic", topic.clone());
    }

    Ok(multipart)
}
