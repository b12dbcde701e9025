//! NAT traversal configuration

use std::time::Duration;

/// NAT traversal options
#[derive(Debug, Clone)]
pub struct NatConfig {
    /// Service port; also requested as the external port on the gateway
    pub port: u16,

    /// Budget for gateway search plus external-address query
    pub discovery_timeout: Duration,

    /// Budget for the port-mapping request
    pub mapping_timeout: Duration,

    /// Budget for the fallback external-IP lookup
    pub lookup_timeout: Duration,

    /// Budget for the shutdown unmap; exit proceeds when it runs out
    pub teardown_timeout: Duration,

    /// Mapping lease granted by the gateway. Mappings are not renewed: a
    /// process that outlives the lease loses its mapping until restart.
    pub lease_duration: Duration,

    /// Public, unauthenticated external-IP lookup endpoint
    pub lookup_url: String,

    /// Label shown in the gateway's mapping table
    pub mapping_description: String,
}

impl Default for NatConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            discovery_timeout: Duration::from_secs(10),
            mapping_timeout: Duration::from_secs(15),
            lookup_timeout: Duration::from_secs(5),
            teardown_timeout: Duration::from_secs(3),
            lease_duration: Duration::from_secs(2 * 60 * 60),
            lookup_url: "https://api.ipify.org".to_string(),
            mapping_description: "audiocast relay".to_string(),
        }
    }
}

impl NatConfig {
    /// Create a config for the given service port
    pub fn for_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Set the discovery timeout
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the mapping timeout
    pub fn mapping_timeout(mut self, timeout: Duration) -> Self {
        self.mapping_timeout = timeout;
        self
    }

    /// Set the lookup timeout
    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the teardown timeout
    pub fn teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Set the mapping lease duration
    pub fn lease_duration(mut self, lease: Duration) -> Self {
        self.lease_duration = lease;
        self
    }

    /// Set the external-IP lookup endpoint
    pub fn lookup_url(mut self, url: impl Into<String>) -> Self {
        self.lookup_url = url.into();
        self
    }

    /// Set the mapping table label
    pub fn mapping_description(mut self, description: impl Into<String>) -> Self {
        self.mapping_description = description.into();
        self
    }
}
