//! Request/response types for the upstream model gateway.
//!
//! The gateway speaks a schema-based convention: messages are lists of typed
//! parts, tools are described by structured validation schemas, and streamed
//! output arrives as typed JSON frames.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete gateway request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<GatewayMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GatewayTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<GatewayToolChoice>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Extended-reasoning token budget, passed verbatim when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_budget: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

/// Gateway message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayRole {
    System,
    User,
    Assistant,
}

/// One gateway message: plain text or an ordered list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub role: GatewayRole,
    pub content: GatewayContent,
    /// Provider-specific metadata (e.g. caching directives).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PartMetadata>,
}

impl GatewayMessage {
    pub fn text(role: GatewayRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: GatewayContent::Text(text.into()),
            metadata: None,
        }
    }
}

/// Message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayContent {
    Text(String),
    Parts(Vec<GatewayPart>),
}

/// Provider-specific part metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartMetadata {
    /// Caching directive for this part, e.g. "ephemeral".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
}

impl PartMetadata {
    pub fn cached(directive: impl Into<String>) -> Self {
        Self {
            cache: Some(directive.into()),
        }
    }
}

/// One typed message part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GatewayPart {
    /// Plain text.
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<PartMetadata>,
    },
    /// Inline image as a data-URI reference.
    Image { url: String },
    /// Raw file bytes with a media type.
    File { data: String, media_type: String },
    /// Tool invocation.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// Tool invocation result.
    ToolResult {
        call_id: String,
        output: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// A tool description for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: GatewaySchema,
}

/// Tool-choice directive in the gateway convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GatewayToolChoice {
    Auto,
    None,
    Required,
    Tool { name: String },
}

/// A structured validation schema describing tool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySchema {
    #[serde(flatten)]
    pub kind: SchemaKind,
    /// Documentation metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GatewaySchema {
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }
}

/// Schema shapes supported by the gateway validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaKind {
    String {
        #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
        allowed: Option<Vec<String>>,
    },
    Number,
    Integer,
    Boolean,
    Array {
        items: Box<GatewaySchema>,
    },
    Object {
        properties: BTreeMap<String, GatewaySchema>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        required: Vec<String>,
    },
    /// Unconstrained fallback for unknown or missing types.
    Any,
}

/// A tool call reported by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Reason the gateway stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatewayFinishReason {
    /// Natural stop.
    Stop,
    /// Length limit hit.
    Length,
    /// Tool calls issued.
    ToolCalls,
    /// Anything else (content filter, upstream abort, ...).
    #[serde(other)]
    Other,
}

/// Token accounting reported by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u32>,
}

/// A complete (non-streamed) gateway result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCompletion {
    #[serde(default)]
    pub text: String,
    /// Extended-reasoning text, when the model produced any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<GatewayToolCall>,
    pub finish_reason: GatewayFinishReason,
    /// Stop sequence the gateway actually matched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_stop: Option<String>,
    #[serde(default)]
    pub usage: GatewayUsage,
}

/// One streamed gateway frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GatewayStreamEvent {
    /// Incremental reasoning text.
    ReasoningDelta { delta: String },
    /// Incremental response text.
    TextDelta { delta: String },
    /// Atomic tool call with complete arguments.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// Incremental tool call: start frame.
    ToolCallStart { id: String, name: String },
    /// Incremental tool call: argument fragment.
    ToolCallDelta { id: String, delta: String },
    /// Incremental tool call: arguments complete.
    ToolCallEnd { id: String },
    /// Terminal frame with the finish reason and usage.
    Finish {
        reason: GatewayFinishReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        matched_stop: Option<String>,
        #[serde(default)]
        usage: GatewayUsage,
    },
    /// Explicit upstream error frame.
    Error { message: String },
}
