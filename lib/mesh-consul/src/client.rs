//! HTTP client for the Consul agent API

use crate::catalog::{CatalogService, ServiceRegistration};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const TOKEN_HEADER: &str = "X-Consul-Token";

#[derive(Error, Debug)]
pub enum ConsulError {
    #[error("request to Consul agent failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Consul agent returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// ConsulClient talks to a local Consul agent over its HTTP API
#[derive(Clone)]
pub struct ConsulClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl ConsulClient {
    /// Create a client for the agent at `address` (scheme optional)
    pub fn new(
        address: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConsulError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(address),
            token,
        })
    }

    /// Base URL all API paths are appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn normalize_base_url(address: &str) -> String {
        let address = address.trim().trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ConsulError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        Err(ConsulError::Status {
            status,
            body: body.trim().to_string(),
        })
    }

    /// Register a service instance with the local agent
    pub async fn register_service(
        &self,
        registration: &ServiceRegistration,
    ) -> Result<(), ConsulError> {
        let url = self.url("/agent/service/register");
        debug!("PUT {} (service id {})", url, registration.id);

        let request = self.authorize(self.http.put(&url).json(registration));
        Self::check_status(request.send().await?).await?;
        Ok(())
    }

    /// List catalog entries for a service name, in catalog order
    pub async fn catalog_service(&self, name: &str) -> Result<Vec<CatalogService>, ConsulError> {
        let url = self.url(&format!("/catalog/service/{}", name));
        debug!("GET {}", url);

        let request = self.authorize(self.http.get(&url));
        let response = Self::check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }
}
