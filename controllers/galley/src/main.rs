//! Galley Controller
//!
//! Watches one Kubernetes resource kind (the ProducerService CRD by default),
//! keeps an in-memory view of it and publishes a new snapshot whenever the
//! view changes after the initial listing.

mod config;
mod error;
mod server;

use crate::config::{Config, LogFormat};
use crate::error::ControllerError;
use crate::server::Server;
use anyhow::Context;
use std::sync::Arc;
use store_client::KubeStoreClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    // Configure rustls crypto provider (use ring for compatibility)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        info!("rustls crypto provider already installed");
    }

    info!("Starting Galley Controller");
    info!("Configuration:");
    info!("  Resource: {} ({})", config.resource.kind, config.resource.plural);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Resync: {:?}", config.resync);

    let client = kube::Client::try_default()
        .await
        .map_err(ControllerError::Kube)?;
    let store = KubeStoreClient::new(client, config.namespace.clone());

    let server: Server<_, serde_json::Value> = Server::from_config(Arc::new(store), &config);
    server.start().await?;
    info!("Galley Controller running");

    let result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
            Ok(())
        }
        result = server.run() => result,
    };

    server.stop().await;
    if let Err(e) = &result {
        error!("Galley Controller failed: {}", e);
    }
    result?;
    Ok(())
}
