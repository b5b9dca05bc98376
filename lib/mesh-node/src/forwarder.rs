//! Outbound HTTP client used to call other service instances

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::tokio::TokioExecutor;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout as tokio_timeout;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("invalid upstream url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build request for {url}: {reason}")]
    Request { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("reading response from {url} failed: {reason}")]
    Body { url: String, reason: String },

    #[error("request to {url} timed out after {secs}s", secs = .timeout.as_secs_f64())]
    Timeout { url: String, timeout: Duration },
}

/// Issues a GET to another instance and returns the response body.
///
/// Any HTTP response counts as delivered, whatever its status.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, url: &str) -> Result<Bytes, ForwardError>;
}

/// HTTP request forwarder with connection pooling and a bounded timeout.
///
/// The timeout covers connecting, waiting for headers and reading the body.
pub struct RequestForwarder {
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl RequestForwarder {
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        connector.set_keepalive(Some(Duration::from_secs(30)));

        let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(connector);

        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, url: &str, request: Request<Full<Bytes>>) -> Result<Bytes, ForwardError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ForwardError::Transport {
                url: url.to_string(),
                reason: error_chain(&e),
            })?;

        debug!("Upstream {} responded with status {}", url, response.status());

        let collected = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ForwardError::Body {
                url: url.to_string(),
                reason: error_chain(&e),
            })?;
        Ok(collected.to_bytes())
    }
}

#[async_trait]
impl Upstream for RequestForwarder {
    async fn get(&self, url: &str) -> Result<Bytes, ForwardError> {
        let uri: Uri = url
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| ForwardError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let request = Request::get(uri)
            .body(Full::new(Bytes::new()))
            .map_err(|e| ForwardError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Calling upstream {} with {:?} timeout", url, self.timeout);

        match tokio_timeout(self.timeout, self.send(url, request)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    debug!("Upstream call failed: {}", e);
                }
                result
            }
            Err(_) => {
                debug!("Upstream {} timed out after {:?}", url, self.timeout);
                Err(ForwardError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

/// Render an error together with its source chain
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_forwarder_creation() {
        let forwarder = RequestForwarder::new(Duration::from_secs(3));
        assert_eq!(forwarder.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_timeout_message() {
        let err = ForwardError::Timeout {
            url: "http://127.0.0.1:5002/".to_string(),
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "request to http://127.0.0.1:5002/ timed out after 1.5s");
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let inner =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, inner);
        assert_eq!(error_chain(&outer), "connection refused");

        #[derive(Debug, Error)]
        #[error("client error (Connect)")]
        struct Wrapper(#[source] std::io::Error);

        let wrapped = Wrapper(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&wrapped), "client error (Connect): connection refused");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let forwarder = RequestForwarder::new(Duration::from_secs(1));
        let err = forwarder.get("http://bad host/").await.unwrap_err();
        assert!(matches!(err, ForwardError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = RequestForwarder::new(Duration::from_secs(1));
        let err = forwarder.get(&format!("http://{}/", addr)).await.unwrap_err();
        match err {
            ForwardError::Transport { reason, .. } => assert!(!reason.is_empty()),
            ForwardError::Timeout { .. } => {}
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection without ever answering
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let forwarder = RequestForwarder::new(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = forwarder.get(&format!("http://{}/", addr)).await.unwrap_err();

        assert!(matches!(err, ForwardError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_body_returned_verbatim() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let body = "Hello from B";
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
        });

        let forwarder = RequestForwarder::new(Duration::from_secs(2));
        let body = forwarder.get(&format!("http://{}/", addr)).await.unwrap();
        assert_eq!(&body[..], b"Hello from B");
    }
}
