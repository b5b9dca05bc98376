//! Wire types for the Consul agent and catalog HTTP APIs

use mesh_core::{Instance, ServiceIdentity};
use serde::{Deserialize, Serialize};

/// Body of `PUT /v1/agent/service/register`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRegistration {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<AgentCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<ConnectConfig>,
}

/// HTTP health check the agent runs against the registered instance
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    pub interval: String,
    pub timeout: String,
}

/// Connect block asking the agent to manage a sidecar proxy
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectConfig {
    pub sidecar_service: SidecarService,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SidecarService {}

impl ServiceRegistration {
    pub fn from_identity(identity: &ServiceIdentity) -> Self {
        Self {
            id: identity.instance_id.clone(),
            name: identity.name.clone(),
            address: identity.address.clone(),
            port: identity.port,
            check: None,
            connect: None,
        }
    }

    pub fn with_http_check(mut self, url: String) -> Self {
        self.check = Some(AgentCheck {
            http: url,
            interval: "10s".to_string(),
            timeout: "5s".to_string(),
        });
        self
    }

    pub fn with_sidecar(mut self) -> Self {
        self.connect = Some(ConnectConfig::default());
        self
    }
}

/// One element of `GET /v1/catalog/service/:name`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogService {
    /// Address of the agent node hosting the service
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "ServiceID")]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
    /// Address the service registered with; empty when it inherited the node's
    #[serde(default)]
    pub service_address: String,
    pub service_port: u16,
}

impl CatalogService {
    pub fn instance(&self) -> Instance {
        let address = if self.service_address.is_empty() {
            &self.address
        } else {
            &self.service_address
        };
        Instance::new(address.clone(), self.service_port)
    }
}
