//! Core service-node types and the discovery backend contract
//!
//! This library provides:
//! - Service identity and instance records
//! - The `Discovery` trait consumed by a service node
//! - An in-process service registry implementing `Discovery`
//! - Environment-driven node configuration

pub mod call;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod registry;

pub use call::CallResult;
pub use config::NodeConfig;
pub use discovery::Discovery;
pub use endpoint::Instance;
pub use error::{CoreError, Result};
pub use identity::ServiceIdentity;
pub use registry::ServiceRegistry;
