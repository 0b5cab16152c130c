//! YoBit account smoke test
//!
//! Verifies:
//! 1. Credentials load from the environment (`.env` supported)
//! 2. A signed `getInfo` round-trips, solving the edge-proxy challenge if needed
//! 3. The resulting cookie session is persisted for the next run
//!
//! Usage: `yobit_account [config.yaml]`

use std::path::Path;

use anyhow::Context;
use yobit_trade::config::{constants, load_config, ClientConfig};
use yobit_trade::core::{init_logging, Credentials};
use yobit_trade::TradeApiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    constants::log_configuration();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))
            .with_context(|| format!("loading configuration from {}", path))?,
        None => ClientConfig::default(),
    };

    let credentials = Credentials::from_env().context("reading API keys from the environment")?;
    let client = TradeApiClient::from_config(&config, credentials)?;

    let info = client.get_info().await?;
    if info["success"].as_i64() == Some(1) {
        tracing::info!(
            open_orders = %info["return"]["open_orders"],
            server_time = %info["return"]["server_time"],
            "Account info received"
        );
    } else {
        tracing::warn!(error = %info["error"], "Exchange rejected getInfo");
    }

    client.save_session()?;
    tracing::info!(cookie_count = client.session().len(), "Session persisted");
    Ok(())
}
