//! Dataagent gateway binary entry point.
//!
//! Loads TOML configuration, builds the shared agent gateway, and runs the
//! axum server with graceful shutdown on ctrl-c.

use agent::{Agent, AgentGateway, HttpAgent, Initializer};
use anyhow::Result;
use clap::Parser;
use dataagent_gateway::{GatewayConfig, config::CONFIG_FILE};
use std::{path::PathBuf, sync::Arc};
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Dataagent gateway.
#[derive(Debug, Parser)]
#[command(name = "dataagent-gateway", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,
    /// Override the bind port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing from RUST_LOG (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = GatewayConfig::load(&cli.config)?;
    tracing::info!("loaded configuration from {}", cli.config.display());
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let agents = build_agents(&config);
    agents.initialize();

    let handle = dataagent_gateway::serve(&config, agents).await?;
    shutdown_signal().await;
    handle.shutdown().await?;

    tracing::info!("gateway shut down");
    Ok(())
}

/// Build the agent gateway from the `[llm]` section, if any.
fn build_agents(config: &GatewayConfig) -> AgentGateway {
    let Some(llm) = config.llm.clone() else {
        tracing::warn!("no [llm] section configured, queries will be answered with agent_error");
        return AgentGateway::empty();
    };

    let prompt = config.agent.prompt.clone();
    let client = reqwest::Client::new();
    let init: Initializer = Arc::new(move || {
        let agent = HttpAgent::new(client.clone(), &llm, &prompt)?;
        tracing::info!("agent targets {}", agent.endpoint());
        Ok(Arc::new(agent) as Arc<dyn Agent>)
    });
    AgentGateway::new(init, config.agent.lazy_init)
}

/// Wait for ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
