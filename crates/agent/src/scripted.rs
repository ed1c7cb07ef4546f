//! Scripted agent for tests.
//!
//! Replays the same script for every request, optionally pausing before
//! each step so tests can observe streaming and concurrency.

use crate::{Agent, AgentError, AgentMessage, AgentRequest, MessageStream};
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};

/// One step of a script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Yield a message.
    Message(AgentMessage),
    /// Fail the invocation with this error.
    Fail(String),
}

/// An agent that replays canned answers.
#[derive(Clone, Default)]
pub struct ScriptedAgent {
    steps: Vec<Step>,
    echo_query: bool,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl ScriptedAgent {
    /// Replay `steps` verbatim; the script supplies its own head message.
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// Answer with the user's turn followed by `messages`.
    pub fn reply(messages: Vec<AgentMessage>) -> Self {
        Self {
            steps: messages.into_iter().map(Step::Message).collect(),
            echo_query: true,
            ..Default::default()
        }
    }

    /// Echo the user's turn, yield `messages`, then fail with `error`.
    pub fn failing(messages: Vec<AgentMessage>, error: impl Into<String>) -> Self {
        let mut steps: Vec<Step> = messages.into_iter().map(Step::Message).collect();
        steps.push(Step::Fail(error.into()));
        Self {
            steps,
            echo_query: true,
            ..Default::default()
        }
    }

    /// Pause before every yielded item.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().clone()
    }
}

impl Agent for ScriptedAgent {
    fn invoke(&self, request: AgentRequest) -> MessageStream {
        self.requests.lock().push(request.clone());
        let mut steps = self.steps.clone();
        if self.echo_query {
            steps.insert(0, Step::Message(AgentMessage::human(request.text)));
        }
        let delay = self.delay;

        Box::pin(async_stream::stream! {
            for step in steps {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match step {
                    Step::Message(message) => yield Ok(message),
                    Step::Fail(error) => {
                        yield Err(AgentError::Invocation(error));
                        return;
                    }
                }
            }
        })
    }
}
