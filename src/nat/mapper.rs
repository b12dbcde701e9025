//! Port mapping backends
//!
//! UPnP gateway control behind a trait, so the manager's fallback sequencing
//! can be exercised against stub gateways in tests.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use igd_next::aio::tokio::{search_gateway, Tokio};
use igd_next::aio::Gateway;
use igd_next::{PortMappingProtocol, SearchOptions};

use super::error::NatError;

/// Parameters for one mapping attempt
#[derive(Debug, Clone)]
pub struct MappingRequest {
    /// Port requested on the gateway's external interface
    pub external_port: u16,
    /// Address the gateway forwards accepted traffic to
    pub local_addr: SocketAddr,
    /// Validity period granted by the gateway
    pub lease: Duration,
    /// Label shown in the gateway's mapping table
    pub description: String,
}

/// Gateway port-mapping operations
pub trait PortMapper: Send {
    /// Locate the gateway and report its external address
    fn discover(&mut self) -> impl Future<Output = Result<IpAddr, NatError>> + Send;

    /// Request a forwarding entry
    fn add_mapping(
        &mut self,
        request: &MappingRequest,
    ) -> impl Future<Output = Result<(), NatError>> + Send;

    /// Remove a previously added forwarding entry
    fn remove_mapping(
        &mut self,
        external_port: u16,
    ) -> impl Future<Output = Result<(), NatError>> + Send;
}

/// UPnP (IGD) port mapper
///
/// `discover` must succeed before mapping calls; the discovered gateway is
/// kept for the teardown at shutdown.
pub struct UpnpMapper {
    search_timeout: Duration,
    gateway: Option<Gateway<Tokio>>,
}

impl UpnpMapper {
    /// Create a mapper; `search_timeout` bounds the gateway broadcast search
    pub fn new(search_timeout: Duration) -> Self {
        Self {
            search_timeout,
            gateway: None,
        }
    }
}

impl PortMapper for UpnpMapper {
    async fn discover(&mut self) -> Result<IpAddr, NatError> {
        let options = SearchOptions {
            timeout: Some(self.search_timeout),
            ..SearchOptions::default()
        };
        let gateway = search_gateway(options)
            .await
            .map_err(|e| NatError::Gateway(e.to_string()))?;
        tracing::debug!("Found UPnP gateway");

        let external = gateway
            .get_external_ip()
            .await
            .map_err(|e| NatError::Gateway(e.to_string()))?;
        self.gateway = Some(gateway);
        Ok(external)
    }

    async fn add_mapping(&mut self, request: &MappingRequest) -> Result<(), NatError> {
        let gateway = self.gateway.as_ref().ok_or(NatError::GatewayUnavailable)?;
        gateway
            .add_port(
                PortMappingProtocol::TCP,
                request.external_port,
                request.local_addr,
                request.lease.as_secs() as u32,
                &request.description,
            )
            .await
            .map_err(|e| NatError::Mapping(e.to_string()))
    }

    async fn remove_mapping(&mut self, external_port: u16) -> Result<(), NatError> {
        let gateway = self.gateway.as_ref().ok_or(NatError::GatewayUnavailable)?;
        gateway
            .remove_port(PortMappingProtocol::TCP, external_port)
            .await
            .map_err(|e| NatError::Mapping(e.to_string()))
    }
}
