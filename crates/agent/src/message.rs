//! Agent message

use compact_str::CompactString;
use protocol::ToolCall;
use serde::{Deserialize, Serialize};

/// One message of an agent's answer, tagged by the role that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AgentMessage {
    /// The user's turn.
    Human {
        /// Message text.
        #[serde(default)]
        content: String,
    },
    /// An assistant turn, possibly invoking tools.
    Ai {
        /// Message text.
        #[serde(default)]
        content: String,
        /// Tool invocations requested by this turn.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// A tool result.
    Tool {
        /// Tool output.
        #[serde(default)]
        content: String,
        /// The call this result answers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_id: Option<CompactString>,
    },
}

impl AgentMessage {
    /// Create a new human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a new assistant message carrying tool calls
    pub fn ai_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Ai {
            content: content.into(),
            tool_calls,
        }
    }

    /// Create a new tool message
    pub fn tool(content: impl Into<String>, call: Option<CompactString>) -> Self {
        Self::Tool {
            content: content.into(),
            call_id: call,
        }
    }

    /// Tool invocations, if this is an assistant turn that made any.
    pub fn tool_calls(&self) -> Option<&[ToolCall]> {
        match self {
            Self::Ai { tool_calls, .. } if !tool_calls.is_empty() => Some(tool_calls),
            _ => None,
        }
    }

    /// Assistant text, if this is an assistant turn with non-blank content.
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            Self::Ai { content, .. } if !content.trim().is_empty() => Some(content),
            _ => None,
        }
    }

    /// Whether this is an assistant turn with neither text nor tool calls.
    pub fn is_empty_answer(&self) -> bool {
        matches!(self, Self::Ai { content, tool_calls } if tool_calls.is_empty() && content.trim().is_empty())
    }
}
