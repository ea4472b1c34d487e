//! linequery server
//!
//! Answers "is this exact line in the dataset?" over a length-prefixed TCP
//! protocol.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client frame          ┌──────────┐   ┌───────────┐   ┌──────────────┐
//!     ──────────────────────▶│   net    │──▶│  server   │──▶│   dataset    │
//!                            │ listener │   │  handler  │   │ cache (swap) │
//!                            └──────────┘   └─────┬─────┘   └──────┬───────┘
//!                                                 │                │ snapshot
//!     Verdict frame                               ▼                ▼
//!     ◀──────────────────────────────────── ┌──────────────────────────┐
//!                                           │  matching (7 strategies) │
//!                                           └──────────────────────────┘
//!
//!     Cross-cutting: config · observability · lifecycle (signals, drain)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use linequery::config::legacy::read_dataset_path;
use linequery::config::loader::read_config;
use linequery::config::validation::validate_config;
use linequery::config::{ConfigError, ServerConfig};
use linequery::dataset::watcher::DatasetWatcher;
use linequery::dataset::{DatasetCache, FileSource, RefreshPolicy};
use linequery::lifecycle::{signals, Shutdown};
use linequery::matching::Strategy;
use linequery::net::{tls, Listener};
use linequery::observability::{logging, metrics};
use linequery::SearchServer;

#[derive(Parser)]
#[command(name = "linequery")]
#[command(about = "Exact-line query server", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Legacy key=value file; its `linuxpath` entry sets the dataset path
    #[arg(long)]
    legacy_config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override dataset.refresh_policy ("always" or "lazy")
    #[arg(long)]
    refresh_policy: Option<RefreshPolicy>,

    /// Override dataset.strategy
    #[arg(long)]
    strategy: Option<Strategy>,
}

fn resolve_config(args: &Args) -> Result<ServerConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(path) = &args.legacy_config {
        config.dataset.path = Some(read_dataset_path(path)?);
    }
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(policy) = args.refresh_policy {
        config.dataset.refresh_policy = Some(policy);
    }
    if let Some(strategy) = args.strategy {
        config.dataset.strategy = strategy;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init(&config.observability)?;
    tracing::info!("linequery v{} starting", env!("CARGO_PKG_VERSION"));

    let dataset_path = PathBuf::from(config.dataset.require_path()?);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        dataset = ?dataset_path,
        refresh_policy = %config.dataset.require_policy()?,
        strategy = %config.dataset.strategy,
        max_payload_bytes = config.protocol.max_payload_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let cache = Arc::new(DatasetCache::new(Arc::new(FileSource::new(&dataset_path))));
    if config.dataset.preload {
        let snapshot = cache.refresh()?;
        tracing::info!(
            lines = snapshot.line_count(),
            bytes = snapshot.text().len(),
            "Dataset preloaded"
        );
    }

    // Dropping the watcher stops it.
    let _watcher = if config.dataset.watch {
        Some(DatasetWatcher::new(&dataset_path, Arc::clone(&cache)).run()?)
    } else {
        None
    };
    let _hangup = signals::spawn_reload_on_hangup(Arc::clone(&cache))?;

    let listener = Listener::bind(&config.listener).await?;

    let mut server = SearchServer::new(&config, cache)?;
    if let Some(tls_config) = &config.listener.tls {
        let acceptor = tls::load_acceptor(Path::new(&tls_config.cert_path), Path::new(&tls_config.key_path))?;
        server = server.with_tls(acceptor);
    }
    let tracker = server.tracker();

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = signals::shutdown_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => {
            result??;
        }
    }

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    shutdown.drain(&tracker, grace).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
