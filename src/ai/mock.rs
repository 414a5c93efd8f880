use super::{ChunkStream, GenerateContentRequest, GenerateContentResponse, GenerativeModel};
use crate::error::ProviderError;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted model: replays configured chunks, or fails with a configured
/// provider error, and records every request it receives.
#[derive(Clone, Default)]
pub struct MockGenerativeModel {
    chunks: Arc<Mutex<Vec<GenerateContentResponse>>>,
    response: Arc<Mutex<Option<GenerateContentResponse>>>,
    failure: Arc<Mutex<Option<ProviderError>>>,
    mid_stream_failure: Arc<Mutex<Option<String>>>,
    requests: Arc<Mutex<Vec<GenerateContentRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerativeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text chunk to the streamed response.
    pub fn with_text_chunk(self, text: impl Into<String>) -> Self {
        self.with_chunk(GenerateContentResponse::from_text(text))
    }

    pub fn with_chunk(self, chunk: GenerateContentResponse) -> Self {
        self.chunks.lock().unwrap().push(chunk);
        self
    }

    /// Response returned by the unary `generate_content` call.
    pub fn with_response(self, response: GenerateContentResponse) -> Self {
        *self.response.lock().unwrap() = Some(response);
        self
    }

    /// Fail every call before any chunk is produced.
    pub fn with_failure(self, failure: ProviderError) -> Self {
        *self.failure.lock().unwrap() = Some(failure);
        self
    }

    /// Fail every call with an unstructured message.
    pub fn with_failure_message(self, message: impl Into<String>) -> Self {
        self.with_failure(ProviderError {
            http_status: 500,
            status: None,
            message: message.into(),
        })
    }

    /// Yield a stream error after all configured chunks.
    pub fn with_mid_stream_failure(self, message: impl Into<String>) -> Self {
        *self.mid_stream_failure.lock().unwrap() = Some(message.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<GenerateContentRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &GenerateContentRequest) -> Result<()> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request.clone());

        match self.failure.lock().unwrap().clone() {
            Some(failure) => Err(Error::Provider(failure)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerativeModel for MockGenerativeModel {
    async fn stream_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream> {
        self.record(request)?;

        let mut items: Vec<Result<GenerateContentResponse>> = self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        if let Some(message) = self.mid_stream_failure.lock().unwrap().clone() {
            items.push(Err(Error::Stream(message)));
        }

        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        self.record(request)?;

        Ok(self
            .response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| GenerateContentResponse::from_text("{\"greeting\": \"hello\"}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::vertex::types::Part;
    use crate::models::GenerationSettings;
    use futures_util::StreamExt;

    fn request() -> GenerateContentRequest {
        GenerateContentRequest::user_turn(vec![Part::text("hi")], &GenerationSettings::default())
    }

    #[tokio::test]
    async fn test_mock_replays_chunks_in_order() {
        let model = MockGenerativeModel::new()
            .with_text_chunk("first")
            .with_text_chunk("second");

        let chunks: Vec<_> = model
            .stream_generate_content(&request())
            .await
            .unwrap()
            .collect()
            .await;

        let texts: Vec<String> = chunks
            .into_iter()
            .map(|c| c.unwrap().first_text().unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_mock_failure_and_call_count() {
        let model = MockGenerativeModel::new().with_failure_message("quota exceeded");
        let probe = model.clone();

        assert!(model.stream_generate_content(&request()).await.is_err());
        assert!(model.generate_content(&request()).await.is_err());
        assert_eq!(probe.get_call_count(), 2);
        assert_eq!(probe.get_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_mid_stream_failure_comes_last() {
        let model = MockGenerativeModel::new()
            .with_text_chunk("partial")
            .with_mid_stream_failure("connection reset");

        let chunks: Vec<_> = model
            .stream_generate_content(&request())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert!(matches!(chunks[1], Err(Error::Stream(_))));
    }
}
