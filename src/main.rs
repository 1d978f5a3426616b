//! Query proxy core (v1)
//!
//! Loads the cluster and user configuration, builds the accounting registry
//! and exposes it through the admin API.
//!
//! # Architecture Overview
//!
//! ```text
//!   request handler (external)
//!        │  authenticated (user, credential, cluster)
//!        ▼
//!   ┌──────────────┐   select node    ┌──────────────┐
//!   │ Scope::admit │─────────────────▶│   Cluster    │
//!   │  (counters)  │                  │ nodes+cursor │
//!   └──────┬───────┘                  └──────┬───────┘
//!          │ drop = release                  │ kill_queries
//!          ▼                                 ▼
//!   user / credential / node          KILL QUERY → every node
//!   counters decremented
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use query_proxy::admin::{self, AdminState};
use query_proxy::config::loader::load_config;
use query_proxy::observability::logging::init_logging;
use query_proxy::registry::Registry;

#[derive(Parser)]
#[command(name = "query-proxy")]
#[command(about = "Admission control and backend selection for an analytical database proxy", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    init_logging(&config.log)?;

    tracing::info!("query-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = Arc::new(Registry::from_config(&config)?);

    for cluster in registry.clusters() {
        tracing::info!(
            cluster = %cluster.name(),
            nodes = cluster.current_node_count(),
            kill_queries = cluster.kill_query_user().is_some(),
            "Cluster loaded"
        );
    }
    tracing::info!(users = registry.users().count(), "Configuration loaded");

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(registry.clone(), config.admin.api_key.clone());
        admin::serve(listener, state, shutdown_signal()).await?;
    } else {
        shutdown_signal().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
