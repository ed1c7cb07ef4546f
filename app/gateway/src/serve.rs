//! Shared gateway serve entrypoint, used by the binary and by tests.

use crate::{GatewayConfig, state::AppState};
use agent::AgentGateway;
use anyhow::{Context, Result};
use tokio::sync::oneshot;

/// Handle returned by [`serve`]: the bound port and a shutdown trigger.
pub struct ServeHandle {
    /// The port the gateway is listening on.
    pub port: u16,
    /// Shared state, for inspection.
    pub state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>,
}

impl ServeHandle {
    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await??;
        }
        Ok(())
    }
}

/// Bind the axum server on `config.bind_address()` and start serving.
///
/// The server runs in a spawned task; call [`ServeHandle::shutdown`] to
/// stop it.
pub async fn serve(config: &GatewayConfig, agents: AgentGateway) -> Result<ServeHandle> {
    let state = AppState::new(config, agents);
    let app = crate::app(state.clone());

    let bind = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let port = listener.local_addr()?.port();
    tracing::info!("gateway listening on {bind} (port {port})");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("received shutdown signal");
            })
            .await
    });

    Ok(ServeHandle {
        port,
        state,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}
