//! Gateway sessions.
//!
//! A session is one admitted connection. Its frames are handled strictly
//! one at a time: the next frame is not read until the current dispatch,
//! including any agent query, has returned.

use crate::{
    registry::{Registry, Ticket, Transport},
    router::Router,
};
use compact_str::CompactString;
use futures_util::{Stream, StreamExt};
use protocol::codec;

/// An admitted client connection.
#[derive(Debug, Clone)]
pub struct Session {
    /// Client identity.
    pub client_id: CompactString,
    /// Agent conversation thread, equal to the client id so a reconnecting
    /// client resumes its conversation.
    pub thread_id: CompactString,
    /// Admission ticket held by this connection.
    pub ticket: Ticket,
}

impl Session {
    /// Admit a connection under `client_id`.
    pub fn open(registry: &Registry, client_id: impl Into<CompactString>, transport: Transport) -> Self {
        let client_id = client_id.into();
        let ticket = registry.admit(&client_id, transport);
        Self {
            thread_id: client_id.clone(),
            client_id,
            ticket,
        }
    }

    /// Unregister this connection unless it was already replaced.
    pub fn close(&self, registry: &Registry) {
        if registry.release(&self.client_id, self.ticket) {
            tracing::info!("client {} disconnected", self.client_id);
        } else {
            tracing::debug!("client {} closed a replaced connection", self.client_id);
        }
    }
}

/// Handle text frames for `session` until the stream ends.
pub async fn run(router: &Router, session: &Session, frames: impl Stream<Item = String>) {
    let mut frames = std::pin::pin!(frames);
    while let Some(raw) = frames.next().await {
        router.dispatch(session, codec::decode(&raw)).await;
    }
}
