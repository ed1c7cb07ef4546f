//! Dataagent wire protocol types shared between the gateway and its clients.
//!
//! Every frame on the wire is one JSON object `{"type": ..., "payload": ...}`.
//! Inbound frames are read as a loose [`Envelope`] and only then classified
//! into a typed [`Inbound`] request, so an unparseable payload never costs
//! the client its acknowledgment. Outbound frames are the closed
//! [`OutboundEvent`] union; its tags and field names are the compatibility
//! surface and change only together with [`PROTOCOL_VERSION`].

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod codec;

/// Current protocol version.
pub const PROTOCOL_VERSION: &str = "1";

/// An inbound frame before its payload is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Declared message type tag.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Untyped payload.
    #[serde(default = "empty_object")]
    pub payload: Value,
}

impl Envelope {
    /// Create an envelope from a tag and payload.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// A classified inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Directory listing request.
    List(ListRequest),
    /// Card rendering request.
    Visualize(VisualizeRequest),
    /// Agent query.
    Query(QueryRequest),
    /// Anything the gateway does not understand, preserved verbatim.
    Echo(Envelope),
}

/// Payload of a `list` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Directory to list, relative to the gateway's working directory.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    ".".to_owned()
}

/// Payload of a `visualize` request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualizeRequest {
    /// Items to render as cards.
    #[serde(default)]
    pub items: Vec<VisualItem>,
}

/// One item of a `visualize` request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualItem {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the item is a directory.
    #[serde(default)]
    pub is_dir: bool,
}

/// Payload of a `query` request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question.
    #[serde(default)]
    pub text: String,
    /// Images attached to the question.
    #[serde(default)]
    pub image_paths: Vec<String>,
}

/// Events sent by the gateway to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Admission acknowledgment, sent exactly once per connection.
    Connected {
        /// The identity the session was admitted under.
        client_id: CompactString,
    },
    /// Result of a directory listing.
    ListResult(Listing),
    /// Rendered cards for a `visualize` request.
    VisualizeResult(Vec<Card>),
    /// Tool invocations the agent made, verbatim.
    ToolCalls(Vec<ToolCall>),
    /// One incremental text segment (streaming mode).
    AgentStream {
        /// Segment text, already joined with its separator.
        content: String,
    },
    /// All text segments of an answer (batch mode).
    AgentResult(Vec<TextPart>),
    /// Terminal marker of a streamed answer.
    AgentStreamEnd {},
    /// Terminal marker of a batch answer.
    AgentDone {},
    /// A query failed; replaces the terminal marker.
    AgentError {
        /// Human-readable failure.
        error: String,
        /// Optional diagnostic detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Acknowledgment of a frame the gateway did not understand.
    Echo(Envelope),
}

impl OutboundEvent {
    /// An `agent_error` without details.
    pub fn agent_error(error: impl Into<String>) -> Self {
        Self::AgentError {
            error: error.into(),
            details: None,
        }
    }

    /// The wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::ListResult(_) => "list_result",
            Self::VisualizeResult(_) => "visualize_result",
            Self::ToolCalls(_) => "tool_calls",
            Self::AgentStream { .. } => "agent_stream",
            Self::AgentResult(_) => "agent_result",
            Self::AgentStreamEnd {} => "agent_stream_end",
            Self::AgentDone {} => "agent_done",
            Self::AgentError { .. } => "agent_error",
            Self::Echo(_) => "echo",
        }
    }

    /// Whether this event ends a query (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AgentStreamEnd {} | Self::AgentDone {} | Self::AgentError { .. }
        )
    }
}

/// Outcome of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing {
    /// The listed entries.
    Items {
        /// Entries, files first, then directories, each group by name.
        items: Vec<DirEntry>,
    },
    /// The listing failed.
    Error {
        /// Failure description.
        error: String,
    },
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// File name.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Absolute path of the entry.
    pub path: String,
}

/// A rendered card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Item name.
    pub title: String,
    /// `"dir"` or `"file"`.
    pub subtitle: String,
}

/// A structured tool invocation made by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name.
    pub name: CompactString,
    /// Tool arguments.
    #[serde(default, alias = "args")]
    pub arguments: Value,
    /// Provider-assigned call id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CompactString>,
}

/// One text segment of a batch answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    /// Segment text.
    pub content: String,
}
