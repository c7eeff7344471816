//! Convert gateway completions back into Messages API responses.

use uuid::Uuid;

use crate::models::response::{MessagesResponse, ResponseContentBlock, StopReason, Usage};
use crate::upstream::types::{GatewayCompletion, GatewayFinishReason, GatewayUsage};

/// Fresh wire-format message id.
pub fn new_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}

/// Fresh wire-format tool-use id.
pub fn new_tool_use_id() -> String {
    format!("toolu_{}", Uuid::new_v4().simple())
}

/// Build a Messages response from a gateway completion.
///
/// Block order: thinking first (when the gateway reports reasoning text),
/// then text (when non-empty), then one tool-use block per reported call, in
/// the order reported.
pub fn into_messages_response(completion: GatewayCompletion, model: &str) -> MessagesResponse {
    let mut content = Vec::new();

    if let Some(reasoning) = &completion.reasoning {
        if !reasoning.is_empty() {
            content.push(ResponseContentBlock::Thinking {
                thinking: reasoning.clone(),
            });
        }
    }

    if !completion.text.is_empty() {
        content.push(ResponseContentBlock::Text {
            text: completion.text.clone(),
        });
    }

    for call in &completion.tool_calls {
        let id = if call.id.is_empty() {
            new_tool_use_id()
        } else {
            call.id.clone()
        };
        content.push(ResponseContentBlock::ToolUse {
            id,
            name: call.name.clone(),
            input: call.arguments.clone(),
        });
    }

    // Clients expect at least one block even for an empty completion
    if content.is_empty() {
        content.push(ResponseContentBlock::Text {
            text: String::new(),
        });
    }

    let stop_reason = map_finish_reason(completion.finish_reason, completion.matched_stop.is_some());

    MessagesResponse {
        id: new_message_id(),
        response_type: "message".to_string(),
        role: "assistant".to_string(),
        content,
        model: model.to_string(),
        stop_reason: Some(stop_reason),
        stop_sequence: completion.matched_stop,
        usage: map_usage(&completion.usage),
    }
}

/// Map a gateway finish reason onto a wire stop reason.
pub fn map_finish_reason(reason: GatewayFinishReason, stop_matched: bool) -> StopReason {
    match reason {
        GatewayFinishReason::ToolCalls => StopReason::ToolUse,
        GatewayFinishReason::Length => StopReason::MaxTokens,
        GatewayFinishReason::Stop if stop_matched => StopReason::StopSequence,
        GatewayFinishReason::Stop => StopReason::EndTurn,
        GatewayFinishReason::Other => StopReason::EndTurn,
    }
}

/// Copy gateway usage verbatim; cache counters surface only when reported.
pub fn map_usage(usage: &GatewayUsage) -> Usage {
    Usage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        cache_creation_input_tokens: usage.cache_creation_tokens,
        cache_read_input_tokens: usage.cache_read_tokens,
    }
}
