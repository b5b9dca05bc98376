//! Identity a service node registers under

use serde::{Deserialize, Serialize};

/// Name, instance id and advertised address of this process.
///
/// Built once at boot and shared read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub name: String,
    pub instance_id: String,
    pub address: String,
    pub port: u16,
}

impl ServiceIdentity {
    pub fn new(
        name: impl Into<String>,
        instance_id: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            instance_id: instance_id.into(),
            address: address.into(),
            port,
        }
    }

    /// Default instance id for a service name
    pub fn default_instance_id(name: &str) -> String {
        format!("{}-1", name)
    }

    /// URL of this node's health endpoint as seen from the registry
    pub fn health_url(&self) -> String {
        format!("http://{}:{}/health", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_instance_id() {
        assert_eq!(ServiceIdentity::default_instance_id("service-1"), "service-1-1");
    }

    #[test]
    fn test_health_url() {
        let identity = ServiceIdentity::new("billing", "billing-1", "127.0.0.1", 5003);
        assert_eq!(identity.health_url(), "http://127.0.0.1:5003/health");
    }
}
