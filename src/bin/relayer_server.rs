//! FlowShield Relayer Server
//!
//! Serves `POST /api/resolver` plus the read-only stats and analytics
//! routes. Configuration comes from the environment (see `Config`).

use std::sync::Arc;

use anyhow::Result;
use flowshield::api::{ApiServerBuilder, AppState};
use flowshield::{AptosClient, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "FlowShield relayer: network={} node={} module={}",
        config.network,
        config.node_url,
        config.module_address
    );

    let chain = Arc::new(AptosClient::new(&config.node_url, config.client_config()));
    let state = AppState::from_config(&config, chain)?;
    match &state.relayer {
        Some(relayer) => log::info!("Relayer account: {}", relayer.address()),
        None => log::warn!("Relayed withdrawals disabled; /api/resolver will answer 503"),
    }

    let server = ApiServerBuilder::new()
        .bind(config.bind_addr)
        .state(Arc::new(state))
        .build()?;

    server.start().await?;

    Ok(())
}
