//! Gateway client trait and the HTTP-backed implementation.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::upstream::sse;
use crate::upstream::types::{GatewayCompletion, GatewayRequest, GatewayStreamEvent};

/// Ordered async sequence of gateway stream frames.
pub type GatewayEventStream = Pin<Box<dyn Stream<Item = Result<GatewayStreamEvent>> + Send>>;

/// A client for one upstream gateway credential.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Single-shot call returning a completion with usage.
    async fn complete(&self, request: &GatewayRequest) -> Result<GatewayCompletion>;

    /// Streaming call returning an ordered event sequence.
    async fn stream(&self, request: &GatewayRequest) -> Result<GatewayEventStream>;
}

/// Constructs a per-credential gateway client.
pub trait GatewayConnector: Send + Sync {
    fn connect(&self, credential: &str) -> Arc<dyn ModelGateway>;
}

/// HTTP gateway client bound to one credential.
pub struct HttpModelGateway {
    client: reqwest::Client,
    base_url: String,
    credential: String,
}

impl HttpModelGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credential: credential.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/complete", self.base_url.trim_end_matches('/'))
    }

    async fn post(&self, request: &GatewayRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.credential)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn complete(&self, request: &GatewayRequest) -> Result<GatewayCompletion> {
        debug!(model = request.model.as_str(), "Sending gateway completion request");
        let response = self.post(request).await?;
        Ok(response.json::<GatewayCompletion>().await?)
    }

    async fn stream(&self, request: &GatewayRequest) -> Result<GatewayEventStream> {
        debug!(model = request.model.as_str(), "Sending streaming gateway request");
        let mut streamed = request.clone();
        streamed.stream = true;

        let response = self.post(&streamed).await?;

        let stream = try_stream! {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = chunk_result
                    .map_err(|e| Error::Stream(format!("stream read error: {}", e)))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete lines from the buffer
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim().to_string();
                    buffer = buffer[newline_pos + 1..].to_string();

                    if let Some(event) = sse::parse_frame_line(&line) {
                        yield event;
                    }
                }
            }

            // Flush any remaining buffered frame
            if let Some(event) = sse::parse_frame_line(buffer.trim()) {
                yield event;
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Connector producing [`HttpModelGateway`] clients that share one
/// `reqwest` client.
pub struct HttpGatewayConnector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGatewayConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Use a custom reqwest client (custom TLS, timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl GatewayConnector for HttpGatewayConnector {
    fn connect(&self, credential: &str) -> Arc<dyn ModelGateway> {
        Arc::new(HttpModelGateway::new(
            self.client.clone(),
            self.base_url.clone(),
            credential,
        ))
    }
}
