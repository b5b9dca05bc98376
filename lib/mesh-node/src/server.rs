//! Connection accept loop

use crate::http::handle_request;
use crate::metrics::MetricsCollector;
use crate::node::ServiceNode;
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::tokio::TokioIo;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Serve HTTP/1 connections until `shutdown` resolves.
///
/// Each connection runs on its own task, so a slow upstream call only holds
/// up the request that made it.
pub async fn serve<F>(
    listener: TcpListener,
    node: Arc<ServiceNode>,
    metrics: Arc<MetricsCollector>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    info!(
        "{} listening on {}",
        node.identity().name,
        listener.local_addr()?
    );

    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        };

        let io = TokioIo::new(stream);
        let node = node.clone();
        let metrics = metrics.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle_request(req, node.clone(), metrics.clone()));

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving connection from {}: {}", peer_addr, e);
            }
        });
    }
}
