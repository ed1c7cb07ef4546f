//! Response projector.
//!
//! Turns the agent's ordered messages for one query into outbound events.
//! The head of every answer is the user's own turn and is never emitted.
//! Later messages become `tool_calls` events when they carry tool calls,
//! text segments when they are non-blank assistant turns, and nothing
//! otherwise.
//!
//! Only an empty assistant turn is held back: it is dropped if anything
//! follows it, and replaced by the configured fallback if it ends the
//! answer. Every other message is projected as soon as it arrives.

use crate::config::Mode;
use agent::AgentMessage;
use protocol::{OutboundEvent, TextPart};

/// Projection state for one query.
pub struct Projector {
    mode: Mode,
    fallback: String,
    head_seen: bool,
    empty_tail: bool,
    segments: usize,
    parts: Vec<TextPart>,
}

impl Projector {
    /// Create a projector for one query.
    pub fn new(mode: Mode, fallback: impl Into<String>) -> Self {
        Self {
            mode,
            fallback: fallback.into(),
            head_seen: false,
            empty_tail: false,
            segments: 0,
            parts: Vec::new(),
        }
    }

    /// Feed the next agent message; returns the events now ready.
    pub fn accept(&mut self, message: AgentMessage) -> Vec<OutboundEvent> {
        if !self.head_seen {
            self.head_seen = true;
            return Vec::new();
        }

        self.empty_tail = message.is_empty_answer();
        if self.empty_tail {
            return Vec::new();
        }
        self.project(message).into_iter().collect()
    }

    /// The answer completed; returns the remaining events and the terminal
    /// marker.
    pub fn finish(mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        if self.empty_tail {
            let fallback = self.fallback.clone();
            events.extend(self.segment(fallback));
        }

        match self.mode {
            Mode::Batch => {
                events.push(OutboundEvent::AgentResult(std::mem::take(&mut self.parts)));
                events.push(OutboundEvent::AgentDone {});
            }
            Mode::Stream => events.push(OutboundEvent::AgentStreamEnd {}),
        }
        events
    }

    fn project(&mut self, message: AgentMessage) -> Option<OutboundEvent> {
        if let Some(calls) = message.tool_calls() {
            return Some(OutboundEvent::ToolCalls(calls.to_vec()));
        }
        let text = message.assistant_text()?.to_owned();
        self.segment(text)
    }

    fn segment(&mut self, text: String) -> Option<OutboundEvent> {
        let content = if self.segments == 0 {
            text
        } else {
            format!("{}{text}", self.mode.separator())
        };
        self.segments += 1;

        match self.mode {
            Mode::Stream => Some(OutboundEvent::AgentStream { content }),
            Mode::Batch => {
                self.parts.push(TextPart { content });
                None
            }
        }
    }
}

/// Project a complete answer in one pass.
pub fn project(
    mode: Mode,
    fallback: &str,
    messages: impl IntoIterator<Item = AgentMessage>,
) -> Vec<OutboundEvent> {
    let mut projector = Projector::new(mode, fallback);
    let mut events: Vec<OutboundEvent> = messages
        .into_iter()
        .flat_map(|message| projector.accept(message))
        .collect();
    events.extend(projector.finish());
    events
}
