//! Entry point for `armlink`.
//!
//! Owns process setup only: argument parsing, logging, configuration,
//! wiring the serial link to the HTTP server. The behavior lives in
//! the library modules.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use armlink::calibration::CalibrationStore;
use armlink::config::Config;
use armlink::link::{LinkSettings, SerialDriver, SerialLink};
use armlink::server::routes::AppState;
use armlink::server::{init_tracing, ApiServer};

/// Browser-based serial controller for hobby robot arms.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to a config file (default: the per-user config location).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port to dial at startup, overriding the config.
    #[arg(short, long)]
    port: Option<String>,

    /// Address to serve the API on, overriding the config.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    config.validate().context("invalid configuration")?;

    let addr = config.server.bind_address()?;

    let link = SerialLink::new(Box::new(SerialDriver), LinkSettings::from(&config.serial));

    // The arm is often unplugged at boot; the reconnector dials it in
    // once it shows up.
    if let Err(error) = link.connect(&config.serial.port).await {
        warn!(error = %error, "initial connect failed");
    }

    if config.serial.auto_reconnect {
        let _ = link.spawn_reconnector();
    }

    let state = AppState {
        link: link.clone(),
        calibration: Arc::new(CalibrationStore::new(&config.server.static_dir)),
        auth: config.auth.clone(),
        static_dir: config.server.static_dir.clone(),
    };

    let mut server = ApiServer::new(state, addr);
    server.try_bind().await.context("failed to bind API server")?;
    if let Err(error) = server.run().await {
        anyhow::bail!("API server failed: {error}");
    }

    link.close().await;
    info!("serial port closed");

    Ok(())
}
