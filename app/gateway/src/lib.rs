//! Dataagent gateway: admits WebSocket clients, routes their frames, and
//! relays the shared agent's answers as typed events.

pub mod api;
pub mod config;
pub mod listing;
pub mod projector;
pub mod registry;
pub mod router;
pub mod serve;
pub mod session;
pub mod state;
pub mod utils;
pub mod ws;

pub use config::{GatewayConfig, Mode};
pub use projector::Projector;
pub use registry::{Delivery, Registry};
pub use router::Router;
pub use serve::{ServeHandle, serve};
pub use session::Session;
pub use state::AppState;

/// The complete HTTP application: WebSocket, API, and health routes.
pub fn app(state: AppState) -> axum::Router {
    ws::routes().merge(api::routes()).with_state(state)
}
