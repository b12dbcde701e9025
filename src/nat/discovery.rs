//! Address discovery
//!
//! Local interface selection, plus the HTTP fallback used when the gateway
//! cannot report an external address.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};

use local_ip_address::list_afinet_netifas;

use super::error::NatError;

/// Determine the local network address
///
/// First non-loopback, non-link-local IPv4 interface; `127.0.0.1` when the
/// host exposes none.
pub fn local_address() -> IpAddr {
    match list_afinet_netifas() {
        Ok(interfaces) => pick_local_ipv4(interfaces.into_iter().map(|(_, addr)| addr)),
        Err(e) => {
            tracing::warn!(error = %e, "Interface enumeration failed");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn pick_local_ipv4<I>(addrs: I) -> IpAddr
where
    I: IntoIterator<Item = IpAddr>,
{
    for addr in addrs {
        if let IpAddr::V4(v4) = addr {
            if !v4.is_loopback() && !v4.is_link_local() && !v4.is_broadcast() {
                return IpAddr::V4(v4);
            }
        }
    }
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// Resolves this host's public address
pub trait IpLookup: Send + Sync {
    /// Ask an external observer what address this host appears as
    fn lookup(&self) -> impl Future<Output = Result<IpAddr, NatError>> + Send;
}

/// Lookup against a public, unauthenticated external-IP service
///
/// Expects the service to answer a plain GET with the caller's address as the
/// response body (the `api.ipify.org` convention).
#[derive(Debug, Clone)]
pub struct HttpIpLookup {
    url: String,
    client: reqwest::Client,
}

impl HttpIpLookup {
    /// Create a lookup client for the given endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl IpLookup for HttpIpLookup {
    async fn lookup(&self) -> Result<IpAddr, NatError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| NatError::Lookup(e.to_string()))?
            .text()
            .await
            .map_err(|e| NatError::Lookup(e.to_string()))?;

        body.trim()
            .parse()
            .map_err(|_| NatError::Lookup(format!("unparseable address: {:?}", body.trim())))
    }
}
