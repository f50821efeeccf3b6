//! Headless REST API server (v1)
//!
//! Serves the `/headless/v1` endpoints over a seeded content store.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  HEADLESS API                     │
//!                        │                                                   │
//!     Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!     ───────────────────┼─▶│  http   │───▶│ resolver │───▶│   content   │  │
//!                        │  │ server  │    │ url→query│    │    store    │  │
//!                        │  └─────────┘    └──────────┘    └──────┬──────┘  │
//!                        │                                        │         │
//!     Client Response    │  ┌─────────┐    ┌──────────┐           │         │
//!     ◀──────────────────┼──│ handler │◀───│  shaper  │◀──────────┘         │
//!                        │  └─────────┘    └──────────┘                     │
//!                        │                                                   │
//!                        │  Cross-cutting: config (hot reload),              │
//!                        │  observability, lifecycle                         │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use headless_rest::config::{load_config, ConfigWatcher, HeadlessConfig};
use headless_rest::content::MemoryStore;
use headless_rest::lifecycle::{signals, Shutdown};
use headless_rest::observability::{logging, metrics};
use headless_rest::HttpServer;

#[derive(Parser)]
#[command(name = "headless-rest")]
#[command(about = "Headless REST API server", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload rewrite rules and site settings when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => HeadlessConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("headless-rest v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_url = %config.site.base_url,
        seed_path = %config.content.seed_path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = MemoryStore::load(Path::new(&config.content.seed_path), config.site.home_settings())?;

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(config, Arc::new(store))?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
