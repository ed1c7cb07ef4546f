//! Shared application state.

use crate::{config::GatewayConfig, registry::Registry, router::Router};
use agent::AgentGateway;
use std::sync::Arc;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Message router, owning the registry and the agent gateway.
    pub router: Arc<Router>,
}

impl AppState {
    /// Wire a fresh registry and `agents` into a router.
    pub fn new(config: &GatewayConfig, agents: AgentGateway) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            router: Arc::new(Router::new(registry, Arc::new(agents), config)),
        }
    }

    /// The session registry.
    pub fn registry(&self) -> &Registry {
        self.router.registry()
    }

    /// The agent gateway.
    pub fn agents(&self) -> &AgentGateway {
        self.router.agents()
    }
}
