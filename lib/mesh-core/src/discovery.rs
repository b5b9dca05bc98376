//! Contract for the external discovery backend

use crate::{Instance, Result, ServiceIdentity};
use async_trait::async_trait;

/// Registry mapping service names to live instances.
///
/// Re-registering an identity with the same `instance_id` overwrites the
/// previous record.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Register (or re-register) an instance
    async fn register(&self, identity: &ServiceIdentity) -> Result<()>;

    /// All known instances of `name`, in backend order. Empty when unknown.
    async fn lookup(&self, name: &str) -> Result<Vec<Instance>>;
}
