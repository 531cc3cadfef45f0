use crate::{
    config::ServiceConfig,
    server::{start_server, state::ServerState},
    service::InferenceService,
};
use anyhow::{Context, Result};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

use super::commands::{PredictCommand, ServerCommand};

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path).context("Failed to load configuration")
}

/// Load the service and serve HTTP until shutdown
pub async fn handle_server(cmd: ServerCommand) -> Result<()> {
    let config = load_config(cmd.config.as_deref())?
        .with_overrides(cmd.host.as_deref(), cmd.port);

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr()))?;

    info!(
        "Loading assets from {} (model: {}, dataset: {})",
        config.assets.root.display(),
        config.assets.model_path.display(),
        config.assets.dataset_path.display()
    );
    let service = InferenceService::load(&config.assets);
    let state = ServerState::new(service, config.server);

    start_server(addr, state).await
}

/// Predict one JSON row from the command line and print the result
pub fn handle_predict(cmd: PredictCommand) -> Result<()> {
    let config = load_config(cmd.config.as_deref())?;
    let row: Value = serde_json::from_str(&cmd.row).context("--row is not valid JSON")?;

    let service = InferenceService::load(&config.assets);
    let prediction = service.predict(&row)?;

    println!("{}", serde_json::to_string(&prediction)?);
    Ok(())
}
