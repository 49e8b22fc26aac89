use std::{sync::Arc, time::Duration};

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{debug, info};

use common::log_archive::LogArchiver;
use common::logger;
use exchange::BybitClient;

use crate::config::Config;
use crate::server::AppState;
use crate::services::execution_service::ExecutionService;
use crate::services::signal_validator::SignalValidator;

mod config;
mod server;
mod services;

const LOG_ARCHIVE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;

    let _log_guard = logger::setup_logger(&config.log_dir).context("Failed to set up logging")?;
    debug!("System starting up...");

    let _archiver =
        LogArchiver::new(&config.log_dir, config.log_retention_days).spawn(LOG_ARCHIVE_INTERVAL);

    let exchange = BybitClient::new(config.exchange.clone())
        .context("Failed to build exchange client")?;
    info!(
        "Exchange: {} ({})",
        exchange.base_url(),
        if config.testnet { "testnet" } else { "mainnet" }
    );

    let state = AppState {
        validator: Arc::new(SignalValidator::new(config.webhook_secret.clone())),
        execution: Arc::new(ExecutionService::new(Arc::new(exchange))),
    };

    server::serve(config.bind_addr, state).await
}
