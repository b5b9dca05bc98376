//! Consul agent integration
pub mod catalog;
pub mod client;
pub mod discovery;

pub use client::{ConsulClient, ConsulError};
pub use discovery::{ConsulDiscovery, RegistrationOptions};
