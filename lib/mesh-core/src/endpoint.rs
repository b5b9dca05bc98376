//! Instance records returned by discovery lookups
use serde::{Deserialize, Serialize};
use std::fmt;

/// One running process of a named service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub address: String,
    pub port: u16,
}

impl Instance {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Root URL of the instance
    pub fn root_url(&self) -> String {
        format!("http://{}:{}/", self.address, self.port)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_url() {
        let instance = Instance::new("10.0.0.7", 5002);
        assert_eq!(instance.root_url(), "http://10.0.0.7:5002/");
        assert_eq!(instance.to_string(), "10.0.0.7:5002");
    }
}
