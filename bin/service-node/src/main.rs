use anyhow::{Context, Result};
use mesh_consul::ConsulDiscovery;
use mesh_core::NodeConfig;
use mesh_node::{serve, MetricsCollector, RequestForwarder, ServiceNode};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = NodeConfig::from_env().context("invalid configuration")?;
    info!(
        "Starting service-node {} ({}) on port {}",
        config.service_name, config.service_id, config.port
    );
    info!("  - Consul agent: {}", config.consul_addr);
    info!("  - Call timeout: {:?}", config.call_timeout);
    info!("  - Connect sidecar: {}", config.connect_sidecar);

    let discovery = Arc::new(ConsulDiscovery::from_config(&config)?);
    let forwarder = Arc::new(RequestForwarder::new(config.call_timeout));
    let node = Arc::new(ServiceNode::new(config.identity(), discovery, forwarder));
    let metrics = Arc::new(MetricsCollector::new().context("failed to create metrics collector")?);

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    // The node must not serve traffic unregistered
    if let Err(e) = node.register().await {
        error!("Registration failed, exiting: {}", e);
        return Err(e.into());
    }

    serve(listener, node, metrics, shutdown_signal()).await?;
    info!("service-node stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
