//! Shared agent gateway.
//!
//! Exactly one agent instance serves every session. The gateway owns its
//! lifecycle as an explicit state: never initialized, ready, or failed
//! with a recorded reason. While not ready, `invoke` fails fast with
//! [`AgentError::Unavailable`]; with `lazy_init` set, each such call first
//! retries initialization.

use crate::{Agent, AgentError, AgentRequest, MessageStream};
use compact_str::CompactString;
use parking_lot::RwLock;
use std::{path::PathBuf, sync::Arc};

/// Builds the agent instance.
pub type Initializer = Arc<dyn Fn() -> anyhow::Result<Arc<dyn Agent>> + Send + Sync>;

enum State {
    Uninitialized,
    Ready(Arc<dyn Agent>),
    Failed(String),
}

/// Observable lifecycle of the shared agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    /// Initialization has not been attempted, or no initializer exists.
    Uninitialized,
    /// The agent is serving.
    Ready,
    /// The last initialization attempt failed.
    Failed(String),
}

impl AgentStatus {
    /// Short label for status reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// Holds the single shared agent.
pub struct AgentGateway {
    state: RwLock<State>,
    init: Option<Initializer>,
    lazy_init: bool,
}

impl AgentGateway {
    /// Create a gateway that builds its agent with `init`.
    ///
    /// Nothing is built until [`AgentGateway::initialize`] is called or,
    /// with `lazy_init`, until the first query.
    pub fn new(init: Initializer, lazy_init: bool) -> Self {
        Self {
            state: RwLock::new(State::Uninitialized),
            init: Some(init),
            lazy_init,
        }
    }

    /// Create a gateway around an already built agent.
    pub fn ready(agent: impl Agent) -> Self {
        Self {
            state: RwLock::new(State::Ready(Arc::new(agent))),
            init: None,
            lazy_init: false,
        }
    }

    /// Create a gateway with no agent at all.
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(State::Uninitialized),
            init: None,
            lazy_init: false,
        }
    }

    /// Attempt initialization unless the agent is already ready.
    ///
    /// Returns whether the agent is ready afterwards.
    pub fn initialize(&self) -> bool {
        let mut state = self.state.write();
        if matches!(*state, State::Ready(_)) {
            return true;
        }
        let Some(init) = &self.init else {
            return false;
        };

        match init() {
            Ok(agent) => {
                tracing::info!("agent initialized");
                *state = State::Ready(agent);
                true
            }
            Err(e) => {
                tracing::error!("agent initialization failed: {e:#}");
                *state = State::Failed(format!("{e:#}"));
                false
            }
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> AgentStatus {
        match &*self.state.read() {
            State::Uninitialized => AgentStatus::Uninitialized,
            State::Ready(_) => AgentStatus::Ready,
            State::Failed(reason) => AgentStatus::Failed(reason.clone()),
        }
    }

    /// The shared agent, retrying initialization first when allowed.
    pub fn agent(&self) -> Result<Arc<dyn Agent>, AgentError> {
        if let Some(agent) = self.current() {
            return Ok(agent);
        }
        if self.lazy_init
            && self.initialize()
            && let Some(agent) = self.current()
        {
            return Ok(agent);
        }

        let details = match &*self.state.read() {
            State::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        Err(AgentError::Unavailable { details })
    }

    /// Send one query to the shared agent.
    pub fn invoke(
        &self,
        text: impl Into<String>,
        thread_id: impl Into<CompactString>,
        attachments: Vec<PathBuf>,
    ) -> Result<MessageStream, AgentError> {
        let agent = self.agent()?;
        let request = AgentRequest::new(text, thread_id).with_attachments(attachments);
        Ok(agent.invoke(request))
    }

    fn current(&self) -> Option<Arc<dyn Agent>> {
        match &*self.state.read() {
            State::Ready(agent) => Some(Arc::clone(agent)),
            _ => None,
        }
    }
}
