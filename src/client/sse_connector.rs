//! HTTP/SSE implementation of the `StreamConnector` port.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header;

use crate::ports::{FrameStream, StreamConnector, TransportError};

use super::frames::SseFrameDecoder;

/// Opens SSE streams against a realtime endpoint with a bearer token.
#[derive(Debug, Clone)]
pub struct SseConnector {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl SseConnector {
    /// Creates a connector for one endpoint and token.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl StreamConnector for SseConnector {
    async fn connect(&self) -> Result<FrameStream, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(header::ACCEPT, "text/event-stream")
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| TransportError::connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected(status.as_u16()));
        }

        // Byte chunks rarely align with frame boundaries; the decoder
        // carries the partial tail between chunks and `pending` holds frames
        // a single chunk completed beyond the first.
        let stream = stream::unfold(
            (response.bytes_stream(), SseFrameDecoder::new(), VecDeque::new()),
            |(mut bytes, mut decoder, mut pending)| async move {
                loop {
                    if let Some(frame) = pending.pop_front() {
                        return Some((Ok(frame), (bytes, decoder, pending)));
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.feed(&chunk)),
                        Some(Err(e)) => {
                            return Some((
                                Err(TransportError::read(e.to_string())),
                                (bytes, decoder, pending),
                            ));
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(stream.boxed())
    }
}
