//! Convert Anthropic Messages requests into the gateway convention.

use crate::config::{THINKING_CLOSE_TAG, THINKING_OPEN_TAG};
use crate::convert::schema::convert_schema;
use crate::error::{Error, Result};
use crate::models::request::{
    ContentBlock, Message, MessageContent, MessagesRequest, Role, SystemPrompt, ThinkingConfig,
    Tool, ToolChoice, ToolResultContent,
};
use crate::upstream::types::{
    GatewayContent, GatewayMessage, GatewayPart, GatewayRequest, GatewayRole, GatewayTool,
    GatewayToolChoice, PartMetadata,
};

/// Build a complete gateway request from a Messages request.
pub fn build_gateway_request(request: &MessagesRequest) -> Result<GatewayRequest> {
    if request.messages.is_empty() {
        return Err(Error::EmptyMessages);
    }
    if request.max_tokens == 0 {
        return Err(Error::InvalidRequest(
            "max_tokens must be positive".to_string(),
        ));
    }

    let (system, mut messages) = convert_system(request.system.as_ref());

    for message in &request.messages {
        messages.push(convert_message(message));
    }

    let tools = request
        .tools
        .as_ref()
        .map(|tools| tools.iter().map(convert_tool).collect::<Vec<_>>());

    let reasoning_budget = match &request.thinking {
        Some(ThinkingConfig::Enabled { budget_tokens }) => Some(*budget_tokens),
        _ => None,
    };

    Ok(GatewayRequest {
        model: request.model.clone(),
        system,
        messages,
        tools,
        tool_choice: request.tool_choice.as_ref().map(convert_tool_choice),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        stop_sequences: request.stop_sequences.clone(),
        reasoning_budget,
        stream: request.stream,
    })
}

/// Convert a system prompt.
///
/// A plain string passes through as the request-level system field. Segment
/// lists concatenate into one string when no segment carries a cache hint;
/// otherwise each segment becomes its own system message so hinted segments
/// stay independently addressable downstream.
pub fn convert_system(system: Option<&SystemPrompt>) -> (Option<String>, Vec<GatewayMessage>) {
    match system {
        None => (None, Vec::new()),
        Some(SystemPrompt::Text(text)) => (Some(text.clone()), Vec::new()),
        Some(SystemPrompt::Segments(segments)) => {
            if segments.iter().all(|s| s.cache_control.is_none()) {
                let joined = segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                (Some(joined), Vec::new())
            } else {
                let messages = segments
                    .iter()
                    .map(|segment| GatewayMessage {
                        role: GatewayRole::System,
                        content: GatewayContent::Text(segment.text.clone()),
                        metadata: segment
                            .cache_control
                            .as_ref()
                            .map(|c| PartMetadata::cached(c.cache_type.clone())),
                    })
                    .collect();
                (None, messages)
            }
        }
    }
}

/// Convert one conversation message.
pub fn convert_message(message: &Message) -> GatewayMessage {
    let role = match message.role {
        Role::User => GatewayRole::User,
        Role::Assistant => GatewayRole::Assistant,
    };

    let content = match &message.content {
        MessageContent::Text(text) => GatewayContent::Text(text.clone()),
        MessageContent::Blocks(blocks) => convert_blocks(blocks),
    };

    GatewayMessage {
        role,
        content,
        metadata: None,
    }
}

/// Convert an ordered block list, collapsing a lone metadata-free text
/// block back to the plain-string form.
pub fn convert_blocks(blocks: &[ContentBlock]) -> GatewayContent {
    if let [ContentBlock::Text {
        text,
        cache_control: None,
    }] = blocks
    {
        return GatewayContent::Text(text.clone());
    }

    let parts = blocks.iter().map(convert_block).collect();
    GatewayContent::Parts(parts)
}

fn convert_block(block: &ContentBlock) -> GatewayPart {
    match block {
        ContentBlock::Text {
            text,
            cache_control,
        } => GatewayPart::Text {
            text: text.clone(),
            metadata: cache_control
                .as_ref()
                .map(|c| PartMetadata::cached(c.cache_type.clone())),
        },
        ContentBlock::Thinking { thinking } => GatewayPart::Text {
            text: format!("{}\n{}\n{}", THINKING_OPEN_TAG, thinking, THINKING_CLOSE_TAG),
            metadata: None,
        },
        ContentBlock::Image {
            source,
            cache_control: _,
        } => GatewayPart::Image {
            url: format!("data:{};base64,{}", source.media_type, source.data),
        },
        ContentBlock::Document {
            source,
            cache_control: _,
        } => GatewayPart::File {
            data: source.data.clone(),
            media_type: source.media_type.clone(),
        },
        ContentBlock::ToolUse { id, name, input } => GatewayPart::ToolCall {
            id: id.clone(),
            name: name.clone(),
            arguments: input.clone(),
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => GatewayPart::ToolResult {
            call_id: tool_use_id.clone(),
            output: stringify_tool_result(content.as_ref()),
            is_error: *is_error,
        },
    }
}

/// Stringify a tool-result payload: strings pass through unchanged, nested
/// blocks are JSON-encoded.
fn stringify_tool_result(content: Option<&ToolResultContent>) -> String {
    match content {
        None => String::new(),
        Some(ToolResultContent::Text(text)) => text.clone(),
        Some(ToolResultContent::Blocks(blocks)) => {
            serde_json::to_string(blocks).unwrap_or_default()
        }
    }
}

/// Convert a tool definition.
pub fn convert_tool(tool: &Tool) -> GatewayTool {
    GatewayTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: convert_schema(&tool.input_schema),
    }
}

/// Convert a tool-choice directive. Anything unrecognized maps to auto:
/// over-restricting tool choice is more harmful than under-restricting it.
pub fn convert_tool_choice(choice: &ToolChoice) -> GatewayToolChoice {
    match choice {
        ToolChoice::Auto | ToolChoice::Other => GatewayToolChoice::Auto,
        ToolChoice::None => GatewayToolChoice::None,
        ToolChoice::Any => GatewayToolChoice::Required,
        ToolChoice::Tool { name } => GatewayToolChoice::Tool { name: name.clone() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{BlobSource, CacheControl, SystemSegment};
    use serde_json::json;

    fn text_block(text: &str) -> ContentBlock {
        ContentBlock::Text {
            text: text.into(),
            cache_control: None,
        }
    }

    #[test]
    fn test_plain_string_content_passes_through() {
        let request = MessagesRequest::user("m", 10, "hello");
        let converted = build_gateway_request(&request).unwrap();
        match &converted.messages[0].content {
            GatewayContent::Text(text) => assert_eq!(text, "hello"),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_single_text_block_collapses_to_string() {
        match convert_blocks(&[text_block("hi")]) {
            GatewayContent::Text(text) => assert_eq!(text, "hi"),
            other => panic!("expected collapse, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_hinted_text_block_does_not_collapse() {
        let blocks = [ContentBlock::Text {
            text: "hi".into(),
            cache_control: Some(CacheControl::ephemeral()),
        }];
        match convert_blocks(&blocks) {
            GatewayContent::Parts(parts) => match &parts[0] {
                GatewayPart::Text { metadata, .. } => {
                    assert_eq!(metadata.as_ref().unwrap().cache.as_deref(), Some("ephemeral"));
                }
                other => panic!("unexpected part: {:?}", other),
            },
            other => panic!("expected parts, got {:?}", other),
        }
    }

    #[test]
    fn test_thinking_block_folds_into_delimited_text() {
        match convert_blocks(&[ContentBlock::Thinking {
            thinking: "prior reasoning".into(),
        }]) {
            GatewayContent::Parts(parts) => match &parts[0] {
                GatewayPart::Text { text, .. } => {
                    assert!(text.starts_with(THINKING_OPEN_TAG));
                    assert!(text.contains("prior reasoning"));
                    assert!(text.ends_with(THINKING_CLOSE_TAG));
                }
                other => panic!("unexpected part: {:?}", other),
            },
            other => panic!("expected parts, got {:?}", other),
        }
    }

    #[test]
    fn test_image_becomes_data_uri() {
        let blocks = [ContentBlock::Image {
            source: BlobSource::base64("image/png", "AAAA"),
            cache_control: None,
        }];
        match convert_blocks(&blocks) {
            GatewayContent::Parts(parts) => match &parts[0] {
                GatewayPart::Image { url } => {
                    assert_eq!(url, "data:image/png;base64,AAAA")
                }
                other => panic!("unexpected part: {:?}", other),
            },
            other => panic!("expected parts, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_result_string_passthrough_and_json_encoding() {
        assert_eq!(
            stringify_tool_result(Some(&ToolResultContent::Text("42".into()))),
            "42"
        );
        let nested = ToolResultContent::Blocks(vec![text_block("inner")]);
        let encoded = stringify_tool_result(Some(&nested));
        let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(parsed[0]["text"], "inner");
    }

    #[test]
    fn test_system_segments_without_hints_concatenate() {
        let system = SystemPrompt::Segments(vec![
            SystemSegment {
                segment_type: "text".into(),
                text: "a".into(),
                cache_control: None,
            },
            SystemSegment {
                segment_type: "text".into(),
                text: "b".into(),
                cache_control: None,
            },
        ]);
        let (merged, messages) = convert_system(Some(&system));
        assert_eq!(merged.as_deref(), Some("a\n\nb"));
        assert!(messages.is_empty());
    }

    #[test]
    fn test_system_segments_with_hints_stay_separate() {
        let system = SystemPrompt::Segments(vec![
            SystemSegment {
                segment_type: "text".into(),
                text: "cached".into(),
                cache_control: Some(CacheControl::ephemeral()),
            },
            SystemSegment {
                segment_type: "text".into(),
                text: "plain".into(),
                cache_control: None,
            },
        ]);
        let (merged, messages) = convert_system(Some(&system));
        assert!(merged.is_none());
        assert_eq!(messages.len(), 2);
        assert!(messages[0].metadata.is_some());
        assert!(messages[1].metadata.is_none());
    }

    #[test]
    fn test_tool_choice_mapping() {
        assert_eq!(
            convert_tool_choice(&ToolChoice::Any),
            GatewayToolChoice::Required
        );
        assert_eq!(
            convert_tool_choice(&ToolChoice::Other),
            GatewayToolChoice::Auto
        );
        assert_eq!(
            convert_tool_choice(&ToolChoice::Tool { name: "t".into() }),
            GatewayToolChoice::Tool { name: "t".into() }
        );
    }

    #[test]
    fn test_thinking_budget_passed_verbatim() {
        let mut request = MessagesRequest::user("m", 10, "hi");
        request.thinking = Some(ThinkingConfig::Enabled {
            budget_tokens: 2048,
        });
        let converted = build_gateway_request(&request).unwrap();
        assert_eq!(converted.reasoning_budget, Some(2048));
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        let mut request = MessagesRequest::user("m", 1, "hi");
        request.max_tokens = 0;
        assert!(matches!(
            build_gateway_request(&request),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_empty_messages_rejected() {
        let mut request = MessagesRequest::user("m", 10, "hi");
        request.messages.clear();
        assert!(matches!(
            build_gateway_request(&request),
            Err(Error::EmptyMessages)
        ));
    }

    #[test]
    fn test_tool_use_and_result_round_into_parts() {
        let blocks = [
            ContentBlock::ToolUse {
                id: "call_1".into(),
                name: "search".into(),
                input: json!({"q": "rust"}),
            },
            ContentBlock::ToolResult {
                tool_use_id: "call_1".into(),
                content: Some(ToolResultContent::Text("ok".into())),
                is_error: true,
            },
        ];
        match convert_blocks(&blocks) {
            GatewayContent::Parts(parts) => {
                assert!(matches!(&parts[0], GatewayPart::ToolCall { name, .. } if name == "search"));
                match &parts[1] {
                    GatewayPart::ToolResult {
                        call_id, is_error, ..
                    } => {
                        assert_eq!(call_id, "call_1");
                        assert!(is_error);
                    }
                    other => panic!("unexpected part: {:?}", other),
                }
            }
            other => panic!("expected parts, got {:?}", other),
        }
    }
}
