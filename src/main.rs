//! Intake Relay Server
//!
//! Run with: cargo run -- serve
//!
//! # Configuration
//!
//! Read from `--config`, or the first of
//! `$CONFIG_DIR/intake-relay/config.toml`, `/etc/intake-relay/config.toml`,
//! `./config.toml`. Environment variables:
//! - `PORT` / `RELAY_PORT`: Port to listen on (default: 3001)
//! - `RELAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `RELAY_CORS_ORIGINS`: Comma-separated origin allow-list
//! - `RELAY_LOG_LEVEL`, `RELAY_LOG_FORMAT`: Logging (default: info, pretty)
//! - `RUST_LOG`: Full filter directive, overrides `RELAY_LOG_LEVEL`

use anyhow::Context;
use clap::{Parser, Subcommand};
use intake_relay::config::{generate_default_config, Config, LoggingConfig};
use intake_relay::{serve, AppState};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "intake-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Relays live patient intake form activity to staff observers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay server (default)
    Serve,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config { output }) = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => std::fs::write(path, content)
                .with_context(|| format!("Failed to write config to {:?}", path))?,
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default().context("Failed to load configuration")?,
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting intake relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Allowed origins: {:?}", config.server.cors_origins);

    let state = AppState::new(config.server.clone());
    serve(state, &config.server)
        .await
        .context("Relay server failed")?;

    tracing::info!("Intake relay stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("intake_relay={},tower_http=info", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
