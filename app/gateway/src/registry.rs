//! Session registry.
//!
//! Maps client identity to the live connection's outbound channel. Each
//! connection owns a writer task draining that channel into the socket, so
//! events for one client are written whole and in the order they were
//! delivered. A re-admitted identity replaces the previous entry; the
//! ticket handed out at admission lets the stale connection release itself
//! without evicting its replacement.

use compact_str::CompactString;
use parking_lot::Mutex;
use protocol::OutboundEvent;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::sync::mpsc;

/// Outbound half of a connection.
pub type Transport = mpsc::UnboundedSender<OutboundEvent>;

/// Identifies one admission of a client id.
pub type Ticket = u64;

/// Outcome of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The event was queued on the client's connection.
    Sent,
    /// No open connection exists for the client.
    Dropped,
}

struct Entry {
    ticket: Ticket,
    transport: Transport,
}

/// Tracks live client connections by identity.
pub struct Registry {
    sessions: Mutex<BTreeMap<CompactString, Entry>>,
    next_ticket: AtomicU64,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(BTreeMap::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Register `transport` under `id`, replacing any previous connection,
    /// and acknowledge with `connected`.
    pub fn admit(&self, id: &str, transport: Transport) -> Ticket {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock();
        let _ = transport.send(OutboundEvent::Connected {
            client_id: id.into(),
        });
        let previous = sessions.insert(id.into(), Entry { ticket, transport });
        drop(sessions);

        if previous.is_some() {
            tracing::info!("client {id} reconnected, replacing previous connection");
        } else {
            tracing::info!("client {id} connected");
        }
        ticket
    }

    /// Unregister `id`. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    /// Unregister `id` if it is still held by the admission `ticket`.
    pub fn release(&self, id: &str, ticket: Ticket) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get(id) {
            Some(entry) if entry.ticket == ticket => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Queue an event for `id`.
    pub fn deliver(&self, id: &str, event: OutboundEvent) -> Delivery {
        let sessions = self.sessions.lock();
        let Some(entry) = sessions.get(id) else {
            tracing::debug!("dropping {} for disconnected client {id}", event.kind());
            return Delivery::Dropped;
        };

        tracing::debug!("OUTGOING [{id}]: {}", event.kind());
        match entry.transport.send(event) {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::debug!("dropping {} for closed client {id}", e.0.kind());
                Delivery::Dropped
            }
        }
    }

    /// Queue an event for every connected client; returns how many took it.
    pub fn broadcast(&self, event: &OutboundEvent) -> usize {
        self.sessions
            .lock()
            .values()
            .filter(|entry| entry.transport.send(event.clone()).is_ok())
            .count()
    }

    /// Connected client ids, in order.
    pub fn ids(&self) -> Vec<CompactString> {
        self.sessions.lock().keys().cloned().collect()
    }

    /// Whether `id` is connected.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no client is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
