//! The agent collaborator contract.
//!
//! An [`Agent`] is opaque: it receives one [`AgentRequest`] and yields the
//! ordered messages of its answer. The head of that sequence is always the
//! user's own turn. Agents that only answer all at once wrap their future
//! with [`atomic`] so callers see one contract.

use crate::{AgentError, AgentMessage};
use compact_str::CompactString;
use futures_core::Stream;
use std::{future::Future, path::PathBuf, pin::Pin};

/// The ordered messages of one answer.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<AgentMessage, AgentError>> + Send>>;

/// One query addressed to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    /// The user's question.
    pub text: String,
    /// Conversation the question belongs to.
    pub thread_id: CompactString,
    /// Files attached to the question.
    pub attachments: Vec<PathBuf>,
}

impl AgentRequest {
    /// Create a request without attachments.
    pub fn new(text: impl Into<String>, thread_id: impl Into<CompactString>) -> Self {
        Self {
            text: text.into(),
            thread_id: thread_id.into(),
            attachments: Vec::new(),
        }
    }

    /// Attach files to the request.
    pub fn with_attachments(mut self, attachments: Vec<PathBuf>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// A shared, thread-aware agent.
///
/// `invoke` is called concurrently from many sessions. Calls with distinct
/// thread ids are independent; the agent owns any per-thread state.
pub trait Agent: Send + Sync + 'static {
    /// Answer a request.
    fn invoke(&self, request: AgentRequest) -> MessageStream;
}

/// Adapt an all-at-once answer into a [`MessageStream`].
pub fn atomic<F>(answer: F) -> MessageStream
where
    F: Future<Output = Result<Vec<AgentMessage>, AgentError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        match answer.await {
            Ok(messages) => {
                for message in messages {
                    yield Ok(message);
                }
            }
            Err(e) => yield Err(e),
        }
    })
}
