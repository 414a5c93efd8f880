//! Stream relay: provider chunks in, response body bytes out.
//!
//! Each chunk's first-candidate, first-part text is forwarded as-is and in
//! order. A chunk with no such text ends the body. A provider error after the
//! stream has started aborts the body.

use crate::ai::ChunkStream;
use crate::Error;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

pub fn relay(upstream: ChunkStream) -> impl Stream<Item = Result<Bytes, Error>> + Send + 'static {
    async_stream::stream! {
        let mut upstream = upstream;
        let mut forwarded = 0usize;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => match chunk.first_text() {
                    Some(text) => {
                        forwarded += 1;
                        yield Ok(Bytes::copy_from_slice(text.as_bytes()));
                    }
                    None => {
                        let reason = chunk
                            .candidates
                            .first()
                            .and_then(|c| c.finish_reason.as_deref())
                            .unwrap_or("no content");
                        tracing::debug!("Closing relay on chunk without text ({})", reason);
                        break;
                    }
                },
                Err(e) => {
                    tracing::warn!("Provider stream failed after {} chunks: {}", forwarded, e);
                    yield Err(e);
                    break;
                }
            }
        }

        tracing::debug!("Relay finished after {} chunks", forwarded);
    }
}
