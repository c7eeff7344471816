//! Top-level request dispatch: credential selection, upstream attempts,
//! quota failover.

use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use futures::Stream;
use tracing::{debug, warn};

use crate::convert::request::build_gateway_request;
use crate::convert::response::into_messages_response;
use crate::error::{Error, Result};
use crate::models::request::{
    ContentBlock, Message, MessageContent, MessagesRequest, Role, SystemPrompt, ThinkingConfig,
    Tool, ToolChoice,
};
use crate::models::response::MessagesResponse;
use crate::models::stream::StreamEvent;
use crate::rotation::manager::next_reset_at;
use crate::rotation::CredentialManager;
use crate::stream::render_stream;
use crate::upstream::client::GatewayConnector;

/// Wire-format event stream returned for streaming dispatches.
pub type WireEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// One long-lived orchestrator instance serving many concurrent requests.
pub struct Dispatcher {
    rotation: CredentialManager,
    connector: Arc<dyn GatewayConnector>,
}

impl Dispatcher {
    pub fn new(rotation: CredentialManager, connector: Arc<dyn GatewayConnector>) -> Self {
        Self {
            rotation,
            connector,
        }
    }

    /// The credential manager, for operational status queries.
    pub fn rotation(&self) -> &CredentialManager {
        &self.rotation
    }

    /// Dispatch a single-shot request.
    ///
    /// Candidates are tried in rotation order: exhaustion failures disable
    /// the credential and move on; any other failure is returned
    /// immediately, since a different credential cannot fix a
    /// request-shape problem.
    pub async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let gateway_request = build_gateway_request(request)?;
        let candidates = self.rotation.candidates();
        if candidates.is_empty() {
            return Err(self.exhausted_error(None));
        }

        let mut last_failure = None;
        for credential in candidates {
            let gateway = self.connector.connect(&credential);
            match gateway.complete(&gateway_request).await {
                Ok(completion) => {
                    return Ok(into_messages_response(completion, &request.model));
                }
                Err(err) => {
                    let text = err.to_string();
                    if !self.rotation.is_exhaustion(&text) {
                        return Err(err);
                    }
                    warn!("Credential exhausted, rotating: {}", text);
                    self.rotation.disable(&credential, &text).await;
                    last_failure = Some(text);
                }
            }
        }

        Err(self.exhausted_error(last_failure))
    }

    /// Dispatch a streaming request.
    ///
    /// Failover happens at stream establishment; once frames flow, a
    /// failure is rendered into the stream as an `error` event instead.
    pub async fn send_stream(&self, request: &MessagesRequest) -> Result<WireEventStream> {
        let gateway_request = build_gateway_request(request)?;
        let candidates = self.rotation.candidates();
        if candidates.is_empty() {
            return Err(self.exhausted_error(None));
        }

        let mut last_failure = None;
        for credential in candidates {
            let gateway = self.connector.connect(&credential);
            match gateway.stream(&gateway_request).await {
                Ok(upstream) => {
                    debug!(model = request.model.as_str(), "Upstream stream established");
                    return Ok(render_stream(request.model.clone(), upstream));
                }
                Err(err) => {
                    let text = err.to_string();
                    if !self.rotation.is_exhaustion(&text) {
                        return Err(err);
                    }
                    warn!("Credential exhausted, rotating: {}", text);
                    self.rotation.disable(&credential, &text).await;
                    last_failure = Some(text);
                }
            }
        }

        Err(self.exhausted_error(last_failure))
    }

    /// Start a fluent request builder bound to this dispatcher.
    pub fn messages(&self) -> MessagesRequestBuilder<'_> {
        MessagesRequestBuilder::new(self)
    }

    fn exhausted_error(&self, last_failure: Option<String>) -> Error {
        Error::QuotaExhausted {
            message: last_failure
                .unwrap_or_else(|| "all configured credentials are quota-exhausted".to_string()),
            next_reset: next_reset_at(Utc::now()),
        }
    }
}

/// Fluent builder for Messages requests.
///
/// ```rust,no_run
/// # use anthropic_relay::Dispatcher;
/// # async fn example(dispatcher: &Dispatcher) -> anthropic_relay::Result<()> {
/// let response = dispatcher.messages()
///     .model("claude-sonnet-4.5")
///     .max_tokens(1024)
///     .user_message("Hello!")
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct MessagesRequestBuilder<'a> {
    dispatcher: &'a Dispatcher,
    request: MessagesRequest,
}

impl<'a> MessagesRequestBuilder<'a> {
    fn new(dispatcher: &'a Dispatcher) -> Self {
        Self {
            dispatcher,
            request: MessagesRequest {
                model: String::new(),
                max_tokens: 4096,
                messages: Vec::new(),
                system: None,
                tools: None,
                tool_choice: None,
                stream: false,
                temperature: None,
                top_p: None,
                top_k: None,
                stop_sequences: None,
                thinking: None,
            },
        }
    }

    /// Set the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.request.model = model.into();
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.request.max_tokens = max_tokens;
        self
    }

    /// Set the system prompt (plain text).
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.request.system = Some(SystemPrompt::Text(system.into()));
        self
    }

    /// Add a user message (plain text).
    pub fn user_message(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(Message {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        });
        self
    }

    /// Add an assistant message (for multi-turn conversations).
    pub fn assistant_message(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(Message {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        });
        self
    }

    /// Add a message with content blocks (for images, tool results, etc.).
    pub fn message(mut self, role: Role, blocks: Vec<ContentBlock>) -> Self {
        self.request.messages.push(Message {
            role,
            content: MessageContent::Blocks(blocks),
        });
        self
    }

    /// Add a tool definition.
    pub fn tool(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        let tools = self.request.tools.get_or_insert_with(Vec::new);
        tools.push(Tool {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        });
        self
    }

    /// Set the tool choice strategy.
    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.request.tool_choice = Some(choice);
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temp: f64) -> Self {
        self.request.temperature = Some(temp);
        self
    }

    /// Set stop sequences.
    pub fn stop_sequences(mut self, sequences: Vec<String>) -> Self {
        self.request.stop_sequences = Some(sequences);
        self
    }

    /// Enable extended thinking with the given token budget.
    pub fn thinking(mut self, budget_tokens: u32) -> Self {
        self.request.thinking = Some(ThinkingConfig::Enabled { budget_tokens });
        self
    }

    /// Send the request and get a complete response.
    pub async fn send(self) -> Result<MessagesResponse> {
        self.dispatcher.send(&self.request).await
    }

    /// Send the request and get a streaming response.
    pub async fn send_stream(mut self) -> Result<WireEventStream> {
        self.request.stream = true;
        self.dispatcher.send_stream(&self.request).await
    }

    /// Get the built request without sending it.
    pub fn build(self) -> MessagesRequest {
        self.request
    }
}
