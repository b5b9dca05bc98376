//! Consul-backed implementation of the discovery contract

use crate::catalog::ServiceRegistration;
use crate::client::{ConsulClient, ConsulError};
use async_trait::async_trait;
use mesh_core::{CoreError, Discovery, Instance, NodeConfig, Result, ServiceIdentity};
use std::time::Duration;
use tracing::{debug, info};

const AGENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra fields attached to every registration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistrationOptions {
    /// Attach an HTTP check against the instance's /health endpoint
    pub http_check: bool,
    /// Ask the agent to provision a Connect sidecar proxy
    pub connect_sidecar: bool,
}

/// ConsulDiscovery registers and resolves services through a Consul agent
pub struct ConsulDiscovery {
    client: ConsulClient,
    options: RegistrationOptions,
}

impl ConsulDiscovery {
    pub fn new(client: ConsulClient, options: RegistrationOptions) -> Self {
        Self { client, options }
    }

    /// Build from node configuration
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        let client = ConsulClient::new(
            &config.consul_addr,
            config.consul_token.clone(),
            AGENT_TIMEOUT,
        )
        .map_err(|e| CoreError::InvalidConfiguration(format!("Consul client: {}", e)))?;

        Ok(Self::new(
            client,
            RegistrationOptions {
                http_check: config.register_check,
                connect_sidecar: config.connect_sidecar,
            },
        ))
    }

    pub fn client(&self) -> &ConsulClient {
        &self.client
    }

    fn registration(&self, identity: &ServiceIdentity) -> ServiceRegistration {
        let mut registration = ServiceRegistration::from_identity(identity);
        if self.options.http_check {
            registration = registration.with_http_check(identity.health_url());
        }
        if self.options.connect_sidecar {
            registration = registration.with_sidecar();
        }
        registration
    }
}

#[async_trait]
impl Discovery for ConsulDiscovery {
    async fn register(&self, identity: &ServiceIdentity) -> Result<()> {
        let registration = self.registration(identity);
        self.client
            .register_service(&registration)
            .await
            .map_err(|e: ConsulError| CoreError::RegistrationFailed {
                instance_id: identity.instance_id.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "Registered {} as {} with Consul at {}",
            identity.name,
            identity.instance_id,
            self.client.base_url()
        );
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<Vec<Instance>> {
        let entries = self
            .client
            .catalog_service(name)
            .await
            .map_err(|e| CoreError::LookupFailed {
                service: name.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Consul catalog returned {} instances of {}", entries.len(), name);
        Ok(entries.iter().map(|entry| entry.instance()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery(options: RegistrationOptions) -> ConsulDiscovery {
        let client = ConsulClient::new("127.0.0.1:8500", None, AGENT_TIMEOUT).expect("client");
        ConsulDiscovery::new(client, options)
    }

    #[test]
    fn test_plain_registration() {
        let identity = ServiceIdentity::new("a", "a-1", "127.0.0.1", 5001);
        let registration = discovery(RegistrationOptions::default()).registration(&identity);
        assert!(registration.check.is_none());
        assert!(registration.connect.is_none());
    }

    #[test]
    fn test_registration_options_applied() {
        let identity = ServiceIdentity::new("a", "a-1", "127.0.0.1", 5001);
        let registration = discovery(RegistrationOptions {
            http_check: true,
            connect_sidecar: true,
        })
        .registration(&identity);

        assert_eq!(
            registration.check.map(|c| c.http).as_deref(),
            Some("http://127.0.0.1:5001/health")
        );
        assert!(registration.connect.is_some());
    }

    #[test]
    fn test_from_config() {
        let config = NodeConfig {
            consul_addr: "10.0.0.5:8500".to_string(),
            connect_sidecar: true,
            ..NodeConfig::default()
        };
        let discovery = ConsulDiscovery::from_config(&config).unwrap();
        assert_eq!(discovery.client().base_url(), "http://10.0.0.5:8500");
        assert!(discovery.options.connect_sidecar);
        assert!(discovery.options.http_check);
    }
}
