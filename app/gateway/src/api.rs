//! HTTP helper endpoints.

use crate::state::AppState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
};
use protocol::{Listing, OutboundEvent, ToolCall};
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes for `/api/*` and `/health`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/list_dir", get(list_dir))
        .route("/api/emit_tool_calls", post(emit_tool_calls))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.registry().len(),
        "agent": state.agents().status().label(),
    }))
}

/// Query string of `/api/list_dir`.
#[derive(Debug, Deserialize)]
pub struct ListDirParams {
    /// Directory to list.
    #[serde(default = "default_path")]
    pub path: String,
    /// Item cap; defaults to the configured one.
    pub max_items: Option<usize>,
}

fn default_path() -> String {
    ".".to_owned()
}

async fn list_dir(
    State(state): State<AppState>,
    Query(params): Query<ListDirParams>,
) -> Json<Listing> {
    let max_items = params.max_items.unwrap_or(state.router.max_items());
    Json(crate::listing::list_dir(&params.path, max_items).await)
}

/// Target of a debug `tool_calls` emission.
#[derive(Debug, Default, Deserialize)]
pub struct EmitTarget {
    /// Client to send to; all clients when absent.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Push a sample `tool_calls` event to one client, or to all of them.
///
/// The target comes from the JSON body, else the query string.
async fn emit_tool_calls(
    State(state): State<AppState>,
    Query(query): Query<EmitTarget>,
    body: Bytes,
) -> Json<Value> {
    let target = serde_json::from_slice::<EmitTarget>(&body)
        .ok()
        .and_then(|body| body.client_id)
        .or(query.client_id)
        .filter(|id| !id.is_empty());

    let calls = sample_tool_calls();
    let event = OutboundEvent::ToolCalls(calls.clone());
    tracing::info!(
        "emitting sample tool_calls to {}",
        target.as_deref().unwrap_or("all clients")
    );

    let sent = match &target {
        Some(id) => usize::from(state.registry().deliver(id, event) == crate::Delivery::Sent),
        None => state.registry().broadcast(&event),
    };
    Json(json!({ "sent": sent, "payload": calls }))
}

fn sample_tool_calls() -> Vec<ToolCall> {
    vec![
        ToolCall {
            name: "read_file".into(),
            arguments: json!({ "file_path": "src/lib.rs" }),
            id: Some("call_test_1".into()),
        },
        ToolCall {
            name: "list_directory".into(),
            arguments: json!({ "path": "." }),
            id: Some("call_test_2".into()),
        },
    ]
}
