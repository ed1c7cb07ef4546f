//! Agent failure taxonomy.

/// Why an agent could not answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// No agent instance is available.
    #[error("Agent not initialized")]
    Unavailable {
        /// The recorded initialization failure, if there was one.
        details: Option<String>,
    },
    /// The agent failed while answering.
    #[error("{0}")]
    Invocation(String),
    /// The agent produced something that is not a message.
    #[error("malformed agent message: {0}")]
    Malformed(String),
}

impl AgentError {
    /// Diagnostic detail to attach to the client-facing error.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Unavailable { details } => details.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        Self::Invocation(e.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
