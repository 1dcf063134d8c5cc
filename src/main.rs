//! Local development server with live reload.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                   LIVESERVE                       │
//!                        │                                                   │
//!    GET /index.html     │  ┌─────────┐    ┌─────────┐    ┌──────────────┐  │
//!    ────────────────────┼─▶│   net   │───▶│  http   │───▶│    static    │  │
//!                        │  │listener │    │ server  │    │    files     │  │
//!                        │  └─────────┘    └─────────┘    └──────────────┘  │
//!                        │                      │                           │
//!    Connection: Upgrade │                      ▼                           │
//!    ────────────────────┼───────────▶ ┌──────────────┐                     │
//!                        │             │   registry   │◀──────────┐         │
//!                        │             └──────────────┘           │         │
//!                        │                                        │         │
//!    file change         │  ┌─────────┐    ┌──────────────┐  broadcast     │
//!    ────────────────────┼─▶│  watch  │───▶│  broadcast   │──────┘          │
//!                        │  │(notify) │    │ (fan-out)    │                 │
//!                        │  └─────────┘    └──────────────┘                 │
//!                        │                                                   │
//!                        │  ┌─────────────────────────────────────────────┐ │
//!                        │  │            Cross-Cutting Concerns            │ │
//!                        │  │  ┌─────────┐  ┌────────────┐  ┌───────────┐ │ │
//!                        │  │  │ config  │  │ lifecycle  │  │ observa-  │ │ │
//!                        │  │  │         │  │ start/stop │  │ bility    │ │ │
//!                        │  │  └─────────┘  └────────────┘  └───────────┘ │ │
//!                        │  └─────────────────────────────────────────────┘ │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use liveserve::config::loader::load_config;
use liveserve::config::validation::validate_config;
use liveserve::lifecycle::controller::LifecycleController;
use liveserve::observability::logging;
use liveserve::ServeConfig;

#[derive(Parser)]
#[command(name = "liveserve")]
#[command(about = "Local development server with live reload", long_about = None)]
struct Cli {
    /// Directory to serve. Defaults to the current directory.
    root: Option<PathBuf>,

    /// Bind port. Port 0 asks the OS for an ephemeral port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind host.
    #[arg(long)]
    host: Option<String>,

    /// Optional TOML configuration file. CLI flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debounce delay for change notifications, in milliseconds.
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Disable reload-client script injection into served HTML.
    #[arg(long)]
    no_inject: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServeConfig::default(),
    };

    if let Some(root) = cli.root {
        config.root = root;
    }
    if config.root.as_os_str().is_empty() {
        config.root = std::env::current_dir()?;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(debounce_ms) = cli.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    if cli.no_inject {
        config.inject = false;
    }

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err("configuration validation failed".into());
    }

    tracing::info!(
        root = %config.root.display(),
        host = %config.host,
        port = config.port,
        debounce_ms = config.debounce_ms,
        "Configuration loaded"
    );

    let controller = Arc::new(LifecycleController::new(config));

    if let Some(addr) = controller.start().await? {
        tracing::info!(address = %addr, "Serving");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    controller.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
