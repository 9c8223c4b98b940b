use anyhow::Result;
use common::settings::ServerConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod gateway;
mod routes;

use crate::{config::AssistantConfig, gateway::Gateway};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting assistant service");

    let config = AssistantConfig::from_env();
    if config.api_key.is_none() {
        warn!("AI_GATEWAY_API_KEY is not set; questions will be answered with an error");
    }
    info!("Forwarding questions to {} ({})", config.gateway_url, config.model);

    let app = routes::create_router(AppState {
        gateway: Gateway::new(config),
    });

    let server = ServerConfig::from_env("ASSISTANT", 3002)?;
    let addr = server.addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Assistant service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
