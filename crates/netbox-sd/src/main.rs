//! netbox-sd daemon
//!
//! Generates Prometheus file_sd target files from NetBox and exposes metrics
//! about every group over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use eyre::{WrapErr, eyre};
use kameo::prelude::*;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use netbox_sd_core::{FileSink, GroupWorker, RegisterGroup, SupervisorActor, SupervisorActorArgs};
use netbox_sd_inventory::{InventorySource, NetboxClient};

mod api;
mod config;
mod metrics;
mod router;
mod state;

use crate::config::Config;
use crate::metrics::PrometheusRecorder;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "netbox-sd", version)]
#[command(about = "Prometheus file_sd target generator for NetBox", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address of the metrics endpoint, overrides `daemon.listen`
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(args.debug);

    // Load configuration
    let (config, path) =
        Config::load_default(args.config.as_deref()).wrap_err("failed to load configuration")?;
    let groups = config
        .validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    info!(path = %path.display(), groups = groups.len(), "configuration loaded");

    let recorder = Arc::new(PrometheusRecorder::new().wrap_err("failed to set up metrics")?);
    recorder.set_group_count(groups.len());

    // Connect to NetBox
    let client = NetboxClient::new(&config.base_url, &config.api_token, config.allow_insecure)
        .wrap_err("failed to create NetBox client")?;
    let version = client
        .verify_connectivity()
        .await
        .wrap_err("failed to connect to NetBox")?;
    info!(version = %version, url = %config.base_url, "connected to NetBox");

    if config.allow_insecure {
        warn!("TLS certificate verification is disabled");
    }

    let inventory: Arc<dyn InventorySource> = Arc::new(client);

    // Initialize actors
    let supervisor = SupervisorActor::spawn(SupervisorActorArgs::default());

    for group in groups {
        let file = group.file.clone();
        let worker = GroupWorker::new(
            group,
            inventory.clone(),
            recorder.clone(),
            Arc::new(FileSink),
        );

        supervisor
            .ask(RegisterGroup { worker })
            .await
            .map_err(|e| eyre!("failed to register group {file}: {e}"))?;
    }

    // Start HTTP server
    let listen = args.listen.unwrap_or(config.daemon.listen);
    let listener = TcpListener::bind(&listen)
        .await
        .wrap_err_with(|| format!("failed to bind {listen}"))?;
    info!(listen = %listen, "serving metrics");

    let state = Arc::new(AppState::new(supervisor.clone(), recorder));
    axum::serve(listener, router::create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("http server failed")?;

    supervisor.stop_gracefully().await.ok();
    supervisor.wait_for_shutdown().await;
    info!("netbox-sd stopped");

    Ok(())
}
