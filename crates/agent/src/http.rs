//! OpenAI-compatible chat-completions agent.
//!
//! Answers atomically: one `POST {base_url}/chat/completions` per query.
//! Conversation history is kept in memory per thread id, so a single
//! instance serves every session. Only the most recently used threads are
//! kept.

use crate::{Agent, AgentError, AgentMessage, AgentRequest, MessageStream, atomic};
use anyhow::{Result, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use compact_str::CompactString;
use lru::LruCache;
use parking_lot::Mutex;
use protocol::ToolCall;
use reqwest::{
    Client, Method,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{num::NonZeroUsize, path::Path, sync::Arc};

/// Messages of history kept per thread.
const MAX_HISTORY: usize = 40;

/// Threads whose history is kept.
const MAX_THREADS: usize = 1024;

/// Chat backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API root, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key; empty disables the authorization header.
    #[serde(default)]
    pub api_key: String,
    /// Completion token cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: "gpt-4o-mini".to_owned(),
            api_key: "${OPENAI_API_KEY}".to_owned(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// An agent backed by an OpenAI-compatible HTTP endpoint.
#[derive(Clone)]
pub struct HttpAgent {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
    model: String,
    prompt: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    threads: Mutex<LruCache<CompactString, Vec<Value>>>,
}

impl HttpAgent {
    /// Create an agent from its configuration and system prompt.
    pub fn new(client: Client, config: &LlmConfig, prompt: &str) -> Result<Self> {
        let max_threads = NonZeroUsize::new(MAX_THREADS).unwrap_or(NonZeroUsize::MIN);
        Self::with_thread_limit(client, config, prompt, max_threads)
    }

    fn with_thread_limit(
        client: Client,
        config: &LlmConfig,
        prompt: &str,
        max_threads: NonZeroUsize,
    ) -> Result<Self> {
        if config.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        let base = reqwest::Url::parse(&config.base_url)
            .map_err(|e| anyhow::anyhow!("invalid llm.base_url '{}': {e}", config.base_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if !config.api_key.is_empty() {
            headers.insert(
                header::AUTHORIZATION,
                format!("Bearer {}", config.api_key).parse()?,
            );
        }

        let endpoint = format!("{}/chat/completions", base.as_str().trim_end_matches('/'));
        tracing::debug!("http agent targets {endpoint} with model {}", config.model);
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                headers,
                endpoint,
                model: config.model.clone(),
                prompt: prompt.to_owned(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                threads: Mutex::new(LruCache::new(max_threads)),
            }),
        })
    }

    /// The chat-completions endpoint this agent posts to.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Number of history messages kept for a thread.
    pub fn history_len(&self, thread_id: &str) -> usize {
        self.inner
            .threads
            .lock()
            .peek(thread_id)
            .map_or(0, Vec::len)
    }
}

impl Agent for HttpAgent {
    fn invoke(&self, request: AgentRequest) -> MessageStream {
        let inner = Arc::clone(&self.inner);
        atomic(async move { inner.complete(request).await })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<CompactString>,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: CompactString,
    #[serde(default)]
    arguments: String,
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        Self {
            name: call.function.name,
            arguments,
            id: call.id,
        }
    }
}

impl Inner {
    async fn complete(&self, request: AgentRequest) -> Result<Vec<AgentMessage>, AgentError> {
        let user = json!({
            "role": "user",
            "content": user_content(&request).await?,
        });

        let history = self
            .threads
            .lock()
            .get(&request.thread_id)
            .cloned()
            .unwrap_or_default();

        let mut messages = Vec::with_capacity(history.len() + 2);
        if !self.prompt.is_empty() {
            messages.push(json!({ "role": "system", "content": self.prompt }));
        }
        messages.extend(history);
        messages.push(user.clone());

        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AgentError::Invocation(format!(
                "model endpoint returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(AgentError::Malformed("response has no choices".into()));
        };
        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("answer for thread {} hit the token limit", request.thread_id);
        }

        let content = choice.message.content.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .into_iter()
            .map(ToolCall::from)
            .collect();

        {
            let mut threads = self.threads.lock();
            let thread = threads.get_or_insert_mut(request.thread_id.clone(), Vec::new);
            thread.push(user);
            thread.push(json!({ "role": "assistant", "content": content }));
            if thread.len() > MAX_HISTORY {
                let excess = thread.len() - MAX_HISTORY;
                thread.drain(..excess);
            }
        }

        Ok(vec![
            AgentMessage::human(request.text),
            AgentMessage::ai_with_tools(content, tool_calls),
        ])
    }
}

/// Build the user turn, inlining image attachments as data URLs.
async fn user_content(request: &AgentRequest) -> Result<Value, AgentError> {
    if request.attachments.is_empty() {
        return Ok(Value::String(request.text.clone()));
    }

    let mut parts = vec![json!({ "type": "text", "text": request.text })];
    for path in &request.attachments {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AgentError::Invocation(format!("failed to read attachment {}: {e}", path.display()))
        })?;
        let url = format!("data:{};base64,{}", image_mime(path), STANDARD.encode(bytes));
        parts.push(json!({ "type": "image_url", "image_url": { "url": url } }));
    }
    Ok(Value::Array(parts))
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
