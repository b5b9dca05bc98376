//! Service node operations

use crate::forwarder::Upstream;
use mesh_core::{CallResult, Discovery, Result, ServiceIdentity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A service node owns this process's identity and reaches other services
/// through the discovery backend.
///
/// Collaborators are injected so tests can swap in fakes.
pub struct ServiceNode {
    identity: Arc<ServiceIdentity>,
    discovery: Arc<dyn Discovery>,
    upstream: Arc<dyn Upstream>,
    registered: AtomicBool,
}

impl ServiceNode {
    pub fn new(
        identity: ServiceIdentity,
        discovery: Arc<dyn Discovery>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            discovery,
            upstream,
            registered: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Register this node with the discovery backend.
    ///
    /// Meant to run once at startup; callers treat an error as fatal.
    pub async fn register(&self) -> Result<()> {
        self.discovery.register(&self.identity).await?;
        if !self.registered.swap(true, Ordering::AcqRel) {
            info!(
                "{} registered as {} at {}:{}",
                self.identity.name,
                self.identity.instance_id,
                self.identity.address,
                self.identity.port
            );
        }
        Ok(())
    }

    pub fn health(&self) -> String {
        format!("{} is healthy", self.identity.name)
    }

    pub fn greeting(&self) -> String {
        format!("Hello from {}", self.identity.name)
    }

    /// Resolve `target` and GET its root path.
    ///
    /// Only the first instance returned by discovery is tried. That is a
    /// simplification, not a balancing policy.
    pub async fn call(&self, target: &str) -> CallResult {
        if !is_service_name(target) {
            debug!("Rejecting call to invalid service name {:?}", target);
            return CallResult::NotFound;
        }

        let instances = match self.discovery.lookup(target).await {
            Ok(instances) => instances,
            Err(e) => {
                debug!("Discovery lookup for {} failed: {}", target, e);
                return CallResult::UpstreamError(e.to_string());
            }
        };

        let Some(instance) = instances.first() else {
            debug!("No instances of {} registered", target);
            return CallResult::NotFound;
        };

        debug!(
            "{} -> {}: selected {} of {} instances",
            self.identity.name,
            target,
            instance,
            instances.len()
        );

        match self.upstream.get(&instance.root_url()).await {
            Ok(body) => CallResult::Success(String::from_utf8_lossy(&body).into_owned()),
            Err(e) => CallResult::UpstreamError(e.to_string()),
        }
    }
}

/// Service names are non-empty and limited to ASCII alphanumerics, `-`, `_`, `.`
pub fn is_service_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}
