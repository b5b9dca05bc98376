//! In-process service registry

use crate::{Discovery, Instance, Result, ServiceIdentity};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// ServiceRegistry keeps registered instances in memory.
///
/// Records are keyed by instance id, so registering the same instance twice
/// replaces the earlier record. Cloning shares the underlying map, which lets
/// several nodes in one process discover each other.
#[derive(Clone)]
pub struct ServiceRegistry {
    instances: Arc<RwLock<BTreeMap<String, ServiceIdentity>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            instances: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Get count of registered instances across all services
    pub async fn instance_count(&self) -> usize {
        let instances = self.instances.read().await;
        instances.len()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Discovery for ServiceRegistry {
    async fn register(&self, identity: &ServiceIdentity) -> Result<()> {
        let mut instances = self.instances.write().await;
        let replaced = instances
            .insert(identity.instance_id.clone(), identity.clone())
            .is_some();

        debug!(
            "Registered instance {} of {} at {}:{} (replaced: {})",
            identity.instance_id, identity.name, identity.address, identity.port, replaced
        );
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<Vec<Instance>> {
        let instances = self.instances.read().await;
        Ok(instances
            .values()
            .filter(|identity| identity.name == name)
            .map(|identity| Instance::new(identity.address.clone(), identity.port))
            .collect())
    }
}
