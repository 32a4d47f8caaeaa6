use anyhow::{Context, Result};
use log::info;

use tally::{Config, Database, Service, SystemDetector};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(&Config::default_path())?;

    // Configured level is the baseline; per-module RUST_LOG directives
    // still apply on top of it.
    env_logger::Builder::from_default_env()
        .filter_level(config.log_level())
        .init();

    info!("tallyd starting up");

    let database = Database::new(config.database.path.clone())?;
    let detector = SystemDetector::spawn()?;

    let mut service = Service::new(&config, Box::new(detector), database);
    service.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("received shutdown signal");

    service.stop().await?;
    info!("tallyd stopped");

    Ok(())
}
