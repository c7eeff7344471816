//! SSE frame parsing for the gateway's streaming endpoint.
//!
//! The gateway streams `data:`-prefixed JSON frames, one per line, each a
//! tagged [`GatewayStreamEvent`]. A `data: [DONE]` sentinel ends the stream.

use tracing::trace;

use crate::upstream::types::GatewayStreamEvent;

/// Sentinel line marking the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Parse a single stream line into an event, if it carries one.
///
/// Returns `None` for comments, the DONE sentinel, and unparseable frames.
pub fn parse_frame_line(line: &str) -> Option<GatewayStreamEvent> {
    // SSE comment lines (keepalives) start with ':'.
    if line.starts_with(':') {
        return None;
    }

    let payload = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }

    match serde_json::from_str::<GatewayStreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(_) => {
            // Truncate on char boundaries; frames may carry multi-byte text
            let preview: String = payload.chars().take(100).collect();
            trace!("Unparseable stream frame: {}", preview);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::types::GatewayFinishReason;

    /// Feed lines through the parser the way the client's read loop does.
    fn parse_lines(lines: &str) -> Vec<GatewayStreamEvent> {
        lines
            .lines()
            .filter_map(|line| parse_frame_line(line.trim()))
            .collect()
    }

    #[test]
    fn test_parse_text_delta() {
        let event = parse_frame_line(r#"data: {"type":"text-delta","delta":"Hello"}"#);
        match event {
            Some(GatewayStreamEvent::TextDelta { delta }) => assert_eq!(delta, "Hello"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bare_json_without_prefix() {
        let event = parse_frame_line(r#"{"type":"reasoning-delta","delta":"hmm"}"#);
        assert!(matches!(
            event,
            Some(GatewayStreamEvent::ReasoningDelta { .. })
        ));
    }

    #[test]
    fn test_parse_multiple_frames() {
        let lines = "data: {\"type\":\"text-delta\",\"delta\":\"a\"}\n\
                     data: {\"type\":\"text-delta\",\"delta\":\"b\"}\n\
                     data: {\"type\":\"finish\",\"reason\":\"stop\"}";
        let events = parse_lines(lines);
        assert_eq!(events.len(), 3);
        match &events[2] {
            GatewayStreamEvent::Finish { reason, .. } => {
                assert_eq!(*reason, GatewayFinishReason::Stop)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_done_sentinel_and_comments_skipped() {
        assert!(parse_lines(": keepalive\ndata: [DONE]\n\n").is_empty());
    }

    #[test]
    fn test_invalid_frame_ignored() {
        assert!(parse_frame_line("data: not json").is_none());
    }

    #[test]
    fn test_long_invalid_frame_with_multibyte_text() {
        // A multi-byte char straddling the 100-byte preview cutoff must not
        // panic the truncation
        let line = format!("data: {}é and more trailing garbage", "x".repeat(99));
        assert!(parse_frame_line(&line).is_none());
    }

    #[test]
    fn test_tool_call_frames() {
        let lines = "data: {\"type\":\"tool-call-start\",\"id\":\"c1\",\"name\":\"search\"}\n\
                     data: {\"type\":\"tool-call-delta\",\"id\":\"c1\",\"delta\":\"{\\\"q\\\":\"}\n\
                     data: {\"type\":\"tool-call-end\",\"id\":\"c1\"}";
        let events = parse_lines(lines);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], GatewayStreamEvent::ToolCallStart { name, .. } if name == "search"));
        assert!(matches!(&events[2], GatewayStreamEvent::ToolCallEnd { id } if id == "c1"));
    }
}
