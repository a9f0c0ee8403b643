//! playmeterd - Session timing and billing service for rental gaming terminals

use anyhow::{Context, Result};
use clap::Parser;
use playmeter_config::{Config, load_config};
use playmeter_util::default_config_path;
use playmeterd::Service;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// playmeterd - Session timing and billing for rental gaming terminals
#[derive(Parser, Debug)]
#[command(name = "playmeterd")]
#[command(about = "Session timing and billing for rental gaming terminals", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/playmeter/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set PLAYMETER_SOCKET env var)
    #[arg(short, long, env = "PLAYMETER_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set PLAYMETER_DATA_DIR env var)
    #[arg(short, long, env = "PLAYMETER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        let config = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;
        info!(
            config_path = %args.config.display(),
            terminal_count = config.terminals.len(),
            "Configuration loaded"
        );
        config
    } else {
        warn!(
            config_path = %args.config.display(),
            "Config file not found, using built-in defaults"
        );
        Config::default()
    };

    if let Some(socket) = &args.socket {
        config.service.socket_path = socket.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        config.service.data_dir = data_dir.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "playmeterd starting");

    let config = resolve_config(&args)?;

    let service = Service::new(&config).await?;
    service.run().await
}
