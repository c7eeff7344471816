//! Anthropic Messages API request types.

use serde::{Deserialize, Serialize};

/// A Messages API request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum number of tokens to generate. Required and positive.
    pub max_tokens: u32,
    /// Ordered conversation messages.
    pub messages: Vec<Message>,
    /// Optional system prompt (plain string or cacheable segments).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,
    /// Tool definitions available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool-choice directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Whether the response should be streamed.
    #[serde(default)]
    pub stream: bool,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Custom stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Extended thinking directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
}

impl MessagesRequest {
    /// Minimal request with a single plain-text user message.
    pub fn user(model: impl Into<String>, max_tokens: u32, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: vec![Message {
                role: Role::User,
                content: MessageContent::Text(text.into()),
            }],
            system: None,
            tools: None,
            tool_choice: None,
            stream: false,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            thinking: None,
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

/// Message content: a plain string or an ordered list of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Concatenated plain text of this content.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// Per-block prompt-caching hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub cache_type: String,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            cache_type: "ephemeral".to_string(),
        }
    }
}

/// One typed unit of message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Plain text.
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    /// Inline image.
    #[serde(rename = "image")]
    Image {
        source: BlobSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    /// Inline document (e.g. PDF).
    #[serde(rename = "document")]
    Document {
        source: BlobSource,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    /// Tool invocation produced by a prior assistant turn.
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Result for a prior tool invocation.
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<ToolResultContent>,
        #[serde(default)]
        is_error: bool,
    },
    /// Extended thinking emitted by a prior turn.
    #[serde(rename = "thinking")]
    Thinking { thinking: String },
}

/// Inline-encoded bytes with a media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

impl BlobSource {
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// Tool-result payload: plain text or nested blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// System prompt: a plain string or cacheable text segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Segments(Vec<SystemSegment>),
}

/// One cacheable system-prompt segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSegment {
    #[serde(rename = "type")]
    pub segment_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

/// A tool definition supplied with a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Restricted JSON-Schema subset describing the tool parameters.
    pub input_schema: serde_json::Value,
}

/// Tool-choice directive. Unrecognized kinds deserialize to [`ToolChoice::Other`]
/// and are treated as "auto" downstream (fail-open).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Any,
    Tool { name: String },
    #[serde(other)]
    Other,
}

/// Extended-thinking directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ThinkingConfig {
    Enabled { budget_tokens: u32 },
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_text_plain() {
        let content = MessageContent::Text("hello".into());
        assert_eq!(content.text(), "hello");
    }

    #[test]
    fn test_content_text_blocks() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::Text {
                text: "a".into(),
                cache_control: None,
            },
            ContentBlock::Thinking {
                thinking: "ignored".into(),
            },
            ContentBlock::Text {
                text: "b".into(),
                cache_control: None,
            },
        ]);
        assert_eq!(content.text(), "ab");
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{"model":"m","max_tokens":10,"messages":[{"role":"user","content":"hi"}]}"#;
        let request: MessagesRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.model, "m");
        assert_eq!(request.max_tokens, 10);
        assert!(!request.stream);
        assert!(matches!(
            request.messages[0].content,
            MessageContent::Text(_)
        ));
    }

    #[test]
    fn test_deserialize_missing_max_tokens_fails() {
        let json = r#"{"model":"m","messages":[]}"#;
        assert!(serde_json::from_str::<MessagesRequest>(json).is_err());
    }

    #[test]
    fn test_deserialize_tool_result_block() {
        let json = r#"{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"42"}]}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        match &message.content {
            MessageContent::Blocks(blocks) => match &blocks[0] {
                ContentBlock::ToolResult {
                    tool_use_id,
                    is_error,
                    ..
                } => {
                    assert_eq!(tool_use_id, "t1");
                    assert!(!is_error);
                }
                other => panic!("unexpected block: {:?}", other),
            },
            _ => panic!("expected block content"),
        }
    }

    #[test]
    fn test_system_prompt_forms() {
        let plain: SystemPrompt = serde_json::from_str(r#""be brief""#).unwrap();
        assert!(matches!(plain, SystemPrompt::Text(_)));

        let segments: SystemPrompt = serde_json::from_str(
            r#"[{"type":"text","text":"a","cache_control":{"type":"ephemeral"}}]"#,
        )
        .unwrap();
        match segments {
            SystemPrompt::Segments(segs) => {
                assert_eq!(segs[0].text, "a");
                assert!(segs[0].cache_control.is_some());
            }
            _ => panic!("expected segments"),
        }
    }
}
