//! Graph Gateway
//!
//! HTTP front end for an Azure Cosmos DB Gremlin graph.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request         ┌──────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ http server ──▶ handlers ──▶ graph queries │
//!                            │                                  │           │
//!                            │                                  ▼           │
//!                            │                        ResilientSubmitter    │
//!                            │                     (reconnect + backoff)    │
//!                            │                                  │           │
//!     Client Response        │                                  ▼           │
//!     ◀──────────────────────┼── JSON body ◀──── gremlin connection ◀───────┼──── Cosmos DB
//!                            │                    (WebSocket, GraphSON)     │     Gremlin API
//!                            │                                              │
//!                            │  config (TOML + env, hot reload)             │
//!                            │  observability (tracing, Prometheus)         │
//!                            │  lifecycle (signals, graceful shutdown)      │
//!                            └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use graph_gateway::config::watcher::ConfigWatcher;
use graph_gateway::config::{load_config, load_from_env, GatewayConfig};
use graph_gateway::gremlin::CosmosConnector;
use graph_gateway::lifecycle::{wait_for_signal, Shutdown};
use graph_gateway::net::tls::load_tls_config;
use graph_gateway::observability::{logging, metrics};
use graph_gateway::{HttpServer, ResilientSubmitter};

#[derive(Parser)]
#[command(name = "graph-gateway")]
#[command(about = "HTTP gateway for a Cosmos DB Gremlin graph", long_about = None)]
struct Args {
    /// TOML configuration file. Without one, settings come from the environment.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config: GatewayConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "graph-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.graph.endpoint,
        database = %config.graph.database,
        collection = %config.graph.collection,
        max_retries = config.retry.max_retries,
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

    let connector = CosmosConnector::new(
        &config.graph,
        Duration::from_secs(config.timeouts.connect_secs),
        Duration::from_secs(config.timeouts.submit_secs),
    )?;
    let submitter = Arc::new(ResilientSubmitter::new(Arc::new(connector)));
    submitter.warm_up().await;

    // The watcher stops when dropped, so hold it for the life of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), rx),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    (None, rx)
                }
            }
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, submitter.clone());

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(&tls).await?;
            server
                .run_tls(addr, rustls, config_updates, server_shutdown)
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    submitter.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
