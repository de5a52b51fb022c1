//! segment-router server.
//!
//! ```text
//!   config.toml ──▶ loader + validation ──▶ startup ──┬─▶ cache file (warm start)
//!                                                    └─▶ compile definitions
//!                                                              │
//!   Client ──▶ axum fallback ──▶ RouteTable::resolve ──▶ RouteMatch::fire_callback
//!                                     ▲
//!   watcher (notify) ──▶ new config ──┘ (table rebuilt and swapped)
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use segment_router::config::{load_config, watcher::ConfigWatcher, RouterConfig};
use segment_router::http::HttpServer;
use segment_router::lifecycle::shutdown::{wait_for_signal, Shutdown};
use segment_router::lifecycle::startup::{build_table, cache_is_fresh};
use segment_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "segment-router")]
#[command(about = "Path router with precompiled route tables", long_about = None)]
struct Args {
    /// Route configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore the route cache and compile from definitions.
    #[arg(long)]
    no_cache: bool,

    /// Reload routes when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("segment-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        aliases = config.aliases.len(),
        priority = ?config.router.priority,
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

    let use_cache = !args.no_cache
        && match (&config.router.cache_path, &args.config) {
            (Some(cache), Some(cfg)) => cache_is_fresh(Path::new(cache), cfg),
            (Some(_), None) => true,
            _ => false,
        };
    let built = build_table(&config, use_cache)?;
    tracing::info!(source = built.source.as_str(), routes = built.table.len(), "Route table ready");

    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        _ => {
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::with_table(config, built.table);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
