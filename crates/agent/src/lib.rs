//! Dataagent agent library.
//!
//! - [`Agent`]: the collaborator contract, one request in, an ordered
//!   stream of [`AgentMessage`]s out.
//! - [`AgentGateway`]: holds the single shared agent instance and its
//!   lifecycle state.
//! - [`HttpAgent`]: an OpenAI-compatible chat-completions backend.

pub use {
    agent::{Agent, AgentRequest, MessageStream, atomic},
    error::AgentError,
    gateway::{AgentGateway, AgentStatus, Initializer},
    http::{HttpAgent, LlmConfig},
    message::AgentMessage,
};

#[cfg(feature = "testing")]
pub use scripted::{ScriptedAgent, Step};

mod agent;
mod error;
mod gateway;
mod http;
mod message;
#[cfg(feature = "testing")]
mod scripted;
