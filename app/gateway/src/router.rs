//! Message router.
//!
//! Classifies each inbound envelope and answers it through the registry.
//! Every envelope gets at least one outbound event; nothing here returns an
//! error to the connection loop.

use crate::{
    config::{GatewayConfig, Mode},
    listing,
    projector::Projector,
    registry::Registry,
    session::Session,
};
use agent::{AgentError, AgentGateway};
use futures_util::StreamExt;
use protocol::{
    Card, Envelope, Inbound, OutboundEvent, QueryRequest, VisualizeRequest, codec,
};
use std::{path::PathBuf, sync::Arc};

/// Dispatches inbound envelopes to their handlers.
pub struct Router {
    registry: Arc<Registry>,
    agents: Arc<AgentGateway>,
    mode: Mode,
    fallback: String,
    max_items: usize,
}

impl Router {
    /// Create a router answering through `registry` with `agents`.
    pub fn new(registry: Arc<Registry>, agents: Arc<AgentGateway>, config: &GatewayConfig) -> Self {
        Self {
            registry,
            agents,
            mode: config.agent.mode,
            fallback: config.agent.fallback.clone(),
            max_items: config.listing.max_items,
        }
    }

    /// The registry events are delivered through.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The shared agent gateway.
    pub fn agents(&self) -> &Arc<AgentGateway> {
        &self.agents
    }

    /// Configured listing cap.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Handle one inbound envelope for `session`.
    pub async fn dispatch(&self, session: &Session, envelope: Envelope) {
        tracing::debug!("INCOMING [{}]: {}", session.client_id, envelope.kind);
        match codec::classify(envelope) {
            Inbound::List(request) => {
                let listing = listing::list_dir(&request.path, self.max_items).await;
                self.send(session, OutboundEvent::ListResult(listing));
            }
            Inbound::Visualize(request) => {
                self.send(session, OutboundEvent::VisualizeResult(cards(request)));
            }
            Inbound::Query(request) => self.query(session, request).await,
            Inbound::Echo(envelope) => self.send(session, OutboundEvent::Echo(envelope)),
        }
    }

    async fn query(&self, session: &Session, request: QueryRequest) {
        let attachments = request.image_paths.into_iter().map(PathBuf::from).collect();
        let mut answer =
            match self
                .agents
                .invoke(request.text, session.thread_id.clone(), attachments)
            {
                Ok(answer) => answer,
                Err(e) => return self.fail(session, e),
            };

        let mut projector = Projector::new(self.mode, self.fallback.as_str());
        let mut held = Vec::new();
        while let Some(item) = answer.next().await {
            let message = match item {
                Ok(message) => message,
                Err(e) => return self.fail(session, e),
            };
            let events = projector.accept(message);
            match self.mode {
                Mode::Batch => held.extend(events),
                Mode::Stream => events.into_iter().for_each(|e| self.send(session, e)),
            }
        }

        held.extend(projector.finish());
        for event in held {
            self.send(session, event);
        }
    }

    fn fail(&self, session: &Session, error: AgentError) {
        tracing::warn!("query for {} failed: {error}", session.client_id);
        self.send(
            session,
            OutboundEvent::AgentError {
                error: error.to_string(),
                details: error.details().map(str::to_owned),
            },
        );
    }

    fn send(&self, session: &Session, event: OutboundEvent) {
        self.registry.deliver(&session.client_id, event);
    }
}

fn cards(request: VisualizeRequest) -> Vec<Card> {
    request
        .items
        .into_iter()
        .map(|item| Card {
            title: item.name,
            subtitle: if item.is_dir { "dir" } else { "file" }.to_owned(),
        })
        .collect()
}
