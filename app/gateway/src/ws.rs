//! WebSocket server: axum upgrade handler and connection loop.

use crate::{
    session::{self, Session},
    state::AppState,
};
use axum::{
    Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use compact_str::CompactString;
use futures_util::{SinkExt, StreamExt, future};
use protocol::{OutboundEvent, codec};
use tokio::sync::mpsc;

/// Routes for `/ws/{client_id}` and `/ws`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_anonymous))
        .route("/ws/{client_id}", get(ws_handler))
}

/// Upgrade under a caller-supplied client id.
async fn ws_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, client_id.into()))
}

/// Upgrade under a generated client id.
async fn ws_anonymous(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let client_id = CompactString::new(uuid::Uuid::new_v4().to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, client_id))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState, client_id: CompactString) {
    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEvent>();

    // Sender task: forward events to the WebSocket in delivery order.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match codec::encode(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("failed to serialize {}: {e}", event.kind());
                    continue;
                }
            };
            if sender.send(WsMessage::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let session = Session::open(state.registry(), client_id, tx);
    let client = session.client_id.clone();

    let frames = receiver
        .take_while(|frame| {
            future::ready(matches!(frame, Ok(msg) if !matches!(msg, WsMessage::Close(_))))
        })
        .filter_map(move |frame| {
            future::ready(match frame {
                Ok(WsMessage::Text(text)) => Some(text.as_str().to_owned()),
                Ok(WsMessage::Binary(bytes)) => {
                    tracing::debug!("ignoring {}-byte binary frame from {client}", bytes.len());
                    None
                }
                _ => None,
            })
        });
    session::run(&state.router, &session, frames).await;

    // Releasing drops the registry's sender, which ends the sender task.
    session.close(state.registry());
    let _ = send_task.await;
}
