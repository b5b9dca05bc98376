//! Node configuration loaded from environment variables

use crate::{CoreError, Result, ServiceIdentity};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SERVICE_NAME: &str = "service-1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_ADVERTISE_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_CONSUL_ADDR: &str = "http://127.0.0.1:8500";
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Configuration for a service node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeConfig {
    /// Service name to register under (SERVICE_NAME)
    pub service_name: String,
    /// Instance id; defaults to `{service_name}-1` (SERVICE_ID)
    pub service_id: String,
    /// Address advertised to the registry (SERVICE_ADDRESS)
    pub advertise_address: String,
    /// Local interface to listen on (BIND_ADDRESS)
    pub bind_address: IpAddr,
    /// Listen and advertised port (PORT)
    pub port: u16,
    /// Consul agent HTTP address (CONSUL_HTTP_ADDR)
    pub consul_addr: String,
    /// Consul ACL token (CONSUL_HTTP_TOKEN)
    pub consul_token: Option<String>,
    /// Bound on each outbound call (CALL_TIMEOUT_SECS)
    pub call_timeout: Duration,
    /// Ask the agent to provision a Connect sidecar (CONSUL_CONNECT_SIDECAR)
    pub connect_sidecar: bool,
    /// Attach an HTTP health check to the registration (CONSUL_REGISTER_CHECK)
    pub register_check: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_id: ServiceIdentity::default_instance_id(DEFAULT_SERVICE_NAME),
            advertise_address: DEFAULT_ADVERTISE_ADDRESS.to_string(),
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            consul_addr: DEFAULT_CONSUL_ADDR.to_string(),
            consul_token: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            connect_sidecar: false,
            register_check: true,
        }
    }
}

impl NodeConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let service_name = get("SERVICE_NAME").unwrap_or(defaults.service_name);
        let service_id = get("SERVICE_ID")
            .unwrap_or_else(|| ServiceIdentity::default_instance_id(&service_name));

        let call_timeout = match get("CALL_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse("CALL_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(CoreError::InvalidConfiguration(
                        "CALL_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.call_timeout,
        };

        Ok(Self {
            service_name,
            service_id,
            advertise_address: get("SERVICE_ADDRESS").unwrap_or(defaults.advertise_address),
            bind_address: get("BIND_ADDRESS")
                .map(|raw| parse("BIND_ADDRESS", &raw))
                .transpose()?
                .unwrap_or(defaults.bind_address),
            port: get("PORT")
                .map(|raw| parse("PORT", &raw))
                .transpose()?
                .unwrap_or(defaults.port),
            consul_addr: get("CONSUL_HTTP_ADDR").unwrap_or(defaults.consul_addr),
            consul_token: get("CONSUL_HTTP_TOKEN"),
            call_timeout,
            connect_sidecar: get("CONSUL_CONNECT_SIDECAR")
                .map(|raw| parse_bool("CONSUL_CONNECT_SIDECAR", &raw))
                .transpose()?
                .unwrap_or(defaults.connect_sidecar),
            register_check: get("CONSUL_REGISTER_CHECK")
                .map(|raw| parse_bool("CONSUL_REGISTER_CHECK", &raw))
                .transpose()?
                .unwrap_or(defaults.register_check),
        })
    }

    /// Identity this node registers under
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity::new(
            self.service_name.clone(),
            self.service_id.clone(),
            self.advertise_address.clone(),
            self.port,
        )
    }

    /// Socket address the HTTP listener binds to
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        CoreError::InvalidConfiguration(format!("{}={:?}: {}", key, raw, e))
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::InvalidConfiguration(format!(
            "{}={:?}: expected a boolean",
            key, raw
        ))),
    }
}
