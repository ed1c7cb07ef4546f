//! Gateway configuration loaded from TOML.

use agent::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "gateway.toml";

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Directory listing limits.
    #[serde(default)]
    pub listing: ListingConfig,
    /// How queries are answered.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Chat backend. Without it the gateway runs with no agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind; `0` picks a free one.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

/// Directory listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Item cap applied after sorting.
    pub max_items: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { max_items: 100 }
    }
}

/// Query answering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Whether answers are delivered whole or incrementally.
    pub mode: Mode,
    /// Text substituted for an empty final answer.
    pub fallback: String,
    /// Retry agent initialization on a query while the agent is not ready.
    pub lazy_init: bool,
    /// System prompt given to the model.
    pub prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            fallback: "The model returned an empty answer, possibly cut off by its length limit."
                .to_owned(),
            lazy_init: true,
            prompt: String::new(),
        }
    }
}

/// Answer delivery mode.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Collect the whole answer, then send `agent_result` and `agent_done`.
    #[default]
    Batch,
    /// Send each text segment as `agent_stream`, then `agent_stream_end`.
    Stream,
}

impl Mode {
    /// Separator placed before every text segment but the first.
    pub fn separator(self) -> &'static str {
        match self {
            Self::Batch => " ",
            Self::Stream => "\n",
        }
    }
}

impl GatewayConfig {
    /// Parse a TOML string into a `GatewayConfig`, expanding environment
    /// variables first.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let expanded = crate::utils::expand_env_vars(toml_str);
        let config: Self = toml::from_str(&expanded).context("invalid gateway configuration")?;
        Ok(config)
    }

    /// Load configuration from a file path, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("failed to load {}", path.display()))
    }

    /// The `host:port` address to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
