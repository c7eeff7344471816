//! Stream re-framing: gateway frames to Messages API streaming events.
//!
//! The renderer is a state machine over an ordered gateway frame sequence.
//! Block indices are strictly increasing from 0; each index opens at most
//! once and closes at most once, open before close; never two blocks open
//! simultaneously. A stream never terminates with zero content blocks.

use std::collections::HashMap;
use std::pin::Pin;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::warn;

use crate::convert::response::{map_finish_reason, map_usage, new_message_id};
use crate::models::response::{ResponseContentBlock, StopReason, Usage};
use crate::models::stream::{
    ContentDelta, MessageDelta, PartialMessage, StreamError, StreamEvent,
};
use crate::upstream::client::GatewayEventStream;
use crate::upstream::types::{GatewayFinishReason, GatewayStreamEvent, GatewayUsage};

/// Delta text for the block synthesized when a stream completes cleanly
/// without ever producing content.
const EMPTY_STREAM_PLACEHOLDER: &str = "";

/// Delta text for the block synthesized when a stream fails before any
/// content was produced.
const FAILED_STREAM_PLACEHOLDER: &str = "[stream interrupted before any content was produced]";

/// Which block, if any, is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenBlock {
    None,
    Thinking(usize),
    Text(usize),
    Tool(usize),
}

/// Ephemeral render state for one in-flight streamed response.
pub struct StreamRenderer {
    id: String,
    model: String,
    /// Index assigned to the next opened block.
    next_index: usize,
    open: OpenBlock,
    /// Gateway call id to assigned block index.
    tool_blocks: HashMap<String, usize>,
    opened_any: bool,
    finish_reason: Option<GatewayFinishReason>,
    matched_stop: Option<String>,
    usage: GatewayUsage,
}

impl StreamRenderer {
    pub fn new(model: &str) -> Self {
        Self {
            id: new_message_id(),
            model: model.to_string(),
            next_index: 0,
            open: OpenBlock::None,
            tool_blocks: HashMap::new(),
            opened_any: false,
            finish_reason: None,
            matched_stop: None,
            usage: GatewayUsage::default(),
        }
    }

    /// The `message_start` event clients must see first: empty content,
    /// zero usage.
    pub fn message_start_event(&self) -> StreamEvent {
        StreamEvent::MessageStart {
            message: PartialMessage {
                id: self.id.clone(),
                message_type: "message".to_string(),
                role: "assistant".to_string(),
                model: self.model.clone(),
                content: Vec::new(),
                usage: Usage::default(),
            },
        }
    }

    /// Process one gateway frame into zero or more wire events.
    pub fn on_event(&mut self, event: GatewayStreamEvent) -> Vec<StreamEvent> {
        match event {
            GatewayStreamEvent::ReasoningDelta { delta } => {
                let mut events = Vec::new();
                let index = match self.open {
                    OpenBlock::Thinking(index) => index,
                    _ => {
                        self.close_open(&mut events);
                        self.open_block(
                            &mut events,
                            ResponseContentBlock::Thinking {
                                thinking: String::new(),
                            },
                        )
                    }
                };
                self.open = OpenBlock::Thinking(index);
                events.push(StreamEvent::ContentBlockDelta {
                    index,
                    delta: ContentDelta::ThinkingDelta { thinking: delta },
                });
                events
            }
            GatewayStreamEvent::TextDelta { delta } => {
                let mut events = Vec::new();
                let index = match self.open {
                    OpenBlock::Text(index) => index,
                    _ => {
                        self.close_open(&mut events);
                        self.open_block(
                            &mut events,
                            ResponseContentBlock::Text {
                                text: String::new(),
                            },
                        )
                    }
                };
                self.open = OpenBlock::Text(index);
                events.push(StreamEvent::ContentBlockDelta {
                    index,
                    delta: ContentDelta::TextDelta { text: delta },
                });
                events
            }
            GatewayStreamEvent::ToolCall {
                id,
                name,
                arguments,
            } => {
                // Atomic form: open, one full-arguments delta, close
                let mut events = Vec::new();
                self.close_open(&mut events);
                let index = self.open_block(
                    &mut events,
                    ResponseContentBlock::ToolUse {
                        id: id.clone(),
                        name,
                        input: serde_json::Value::Object(serde_json::Map::new()),
                    },
                );
                self.tool_blocks.insert(id, index);
                events.push(StreamEvent::ContentBlockDelta {
                    index,
                    delta: ContentDelta::InputJsonDelta {
                        partial_json: arguments.to_string(),
                    },
                });
                events.push(StreamEvent::ContentBlockStop { index });
                self.open = OpenBlock::None;
                events
            }
            GatewayStreamEvent::ToolCallStart { id, name } => {
                let mut events = Vec::new();
                self.close_open(&mut events);
                let index = self.open_block(
                    &mut events,
                    ResponseContentBlock::ToolUse {
                        id: id.clone(),
                        name,
                        input: serde_json::Value::Object(serde_json::Map::new()),
                    },
                );
                self.tool_blocks.insert(id, index);
                self.open = OpenBlock::Tool(index);
                events
            }
            GatewayStreamEvent::ToolCallDelta { id, delta } => {
                match self.tool_blocks.get(&id) {
                    Some(&index) => vec![StreamEvent::ContentBlockDelta {
                        index,
                        delta: ContentDelta::InputJsonDelta {
                            partial_json: delta,
                        },
                    }],
                    None => {
                        warn!(call_id = id.as_str(), "Delta for unknown tool call dropped");
                        Vec::new()
                    }
                }
            }
            GatewayStreamEvent::ToolCallEnd { id } => {
                match self.tool_blocks.get(&id) {
                    Some(&index) if self.open == OpenBlock::Tool(index) => {
                        self.open = OpenBlock::None;
                        vec![StreamEvent::ContentBlockStop { index }]
                    }
                    _ => Vec::new(),
                }
            }
            GatewayStreamEvent::Finish {
                reason,
                matched_stop,
                usage,
            } => {
                self.finish_reason = Some(reason);
                self.matched_stop = matched_stop;
                self.usage = usage;
                Vec::new()
            }
            GatewayStreamEvent::Error { message } => self.fail(&message),
        }
    }

    /// Terminal events for a cleanly completed stream.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.close_open(&mut events);
        if !self.opened_any {
            self.synthesize_block(&mut events, EMPTY_STREAM_PLACEHOLDER);
        }
        self.push_terminal_events(&mut events);
        events
    }

    /// Events for a failed stream: an error event, a synthesized diagnostic
    /// block when nothing was emitted yet, then the terminal events.
    pub fn fail(&mut self, message: &str) -> Vec<StreamEvent> {
        let mut events = vec![StreamEvent::Error {
            error: StreamError {
                error_type: "api_error".to_string(),
                message: message.to_string(),
            },
        }];
        self.close_open(&mut events);
        if !self.opened_any {
            self.synthesize_block(&mut events, FAILED_STREAM_PLACEHOLDER);
        }
        self.push_terminal_events(&mut events);
        events
    }

    fn open_block(
        &mut self,
        events: &mut Vec<StreamEvent>,
        content_block: ResponseContentBlock,
    ) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.opened_any = true;
        events.push(StreamEvent::ContentBlockStart {
            index,
            content_block,
        });
        index
    }

    fn close_open(&mut self, events: &mut Vec<StreamEvent>) {
        let index = match self.open {
            OpenBlock::None => return,
            OpenBlock::Thinking(i) | OpenBlock::Text(i) | OpenBlock::Tool(i) => i,
        };
        events.push(StreamEvent::ContentBlockStop { index });
        self.open = OpenBlock::None;
    }

    /// A zero-block stream is an invalid terminal state.
    fn synthesize_block(&mut self, events: &mut Vec<StreamEvent>, text: &str) {
        let index = self.open_block(
            events,
            ResponseContentBlock::Text {
                text: String::new(),
            },
        );
        events.push(StreamEvent::ContentBlockDelta {
            index,
            delta: ContentDelta::TextDelta {
                text: text.to_string(),
            },
        });
        events.push(StreamEvent::ContentBlockStop { index });
    }

    fn push_terminal_events(&mut self, events: &mut Vec<StreamEvent>) {
        let reason = self.finish_reason.unwrap_or(GatewayFinishReason::Stop);
        let stop_reason = map_finish_reason(reason, self.matched_stop.is_some());
        events.push(StreamEvent::MessageDelta {
            delta: MessageDelta {
                stop_reason: Some(stop_reason),
                stop_sequence: self.matched_stop.take(),
            },
            usage: Some(map_usage(&self.usage)),
        });
        events.push(StreamEvent::MessageStop);
    }
}

/// Re-frame an upstream gateway stream into wire events.
///
/// One cooperative task: suspension happens only at "next upstream frame"
/// and at the caller's output flush. Dropping the returned stream drops the
/// upstream stream and the render state with it.
pub fn render_stream(
    model: String,
    upstream: GatewayEventStream,
) -> Pin<Box<dyn Stream<Item = StreamEvent> + Send>> {
    Box::pin(stream! {
        let mut renderer = StreamRenderer::new(&model);
        yield renderer.message_start_event();

        let mut upstream = upstream;
        while let Some(frame) = upstream.next().await {
            match frame {
                Ok(GatewayStreamEvent::Error { message }) => {
                    for event in renderer.fail(&message) {
                        yield event;
                    }
                    return;
                }
                Ok(event) => {
                    for event in renderer.on_event(event) {
                        yield event;
                    }
                }
                Err(err) => {
                    for event in renderer.fail(&err.to_string()) {
                        yield event;
                    }
                    return;
                }
            }
        }

        for event in renderer.finish() {
            yield event;
        }
    })
}
