//! Streaming event types for the Messages API.

use serde::{Deserialize, Serialize};

use super::response::{ResponseContentBlock, StopReason, Usage};

/// A streaming event emitted to a Messages API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Stream started. Always the first event; content is empty, usage zero.
    #[serde(rename = "message_start")]
    MessageStart { message: PartialMessage },
    /// New content block started.
    #[serde(rename = "content_block_start")]
    ContentBlockStart {
        index: usize,
        content_block: ResponseContentBlock,
    },
    /// Delta within a content block.
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { index: usize, delta: ContentDelta },
    /// Content block ended.
    #[serde(rename = "content_block_stop")]
    ContentBlockStop { index: usize },
    /// Message delta (stop reason, usage).
    #[serde(rename = "message_delta")]
    MessageDelta {
        delta: MessageDelta,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    /// Stream ended.
    #[serde(rename = "message_stop")]
    MessageStop,
    /// Error event.
    #[serde(rename = "error")]
    Error { error: StreamError },
}

impl StreamEvent {
    /// SSE event name for this event.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// Partial message at stream start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub role: String,
    pub model: String,
    pub content: Vec<ResponseContentBlock>,
    pub usage: Usage,
}

/// Content delta within a content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentDelta {
    /// Text delta.
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    /// Tool input delta (partial JSON).
    #[serde(rename = "input_json_delta")]
    InputJsonDelta { partial_json: String },
    /// Thinking delta.
    #[serde(rename = "thinking_delta")]
    ThinkingDelta { thinking: String },
}

/// Message-level delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
}

/// Error in stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}
