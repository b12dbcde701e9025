//! NAT traversal orchestration
//!
//! Sequenced, best-effort startup and teardown. Every network step is
//! bounded by a timeout from [`NatConfig`] and failure only advances the
//! chain to the next fallback; the manager runs on its own task so the relay
//! path never waits on a slow gateway.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError};

use tokio::time::timeout;

use super::config::NatConfig;
use super::discovery::{self, HttpIpLookup, IpLookup};
use super::mapper::{MappingRequest, PortMapper, UpnpMapper};
use super::state::{NatState, SharedNatState};

/// Drives address discovery, port mapping and teardown
///
/// After [`startup`](Self::startup) the shared [`NatState`] is always in a
/// well-defined terminal state, down to all-unknown when every step failed.
pub struct NatManager<M = UpnpMapper, L = HttpIpLookup> {
    config: NatConfig,
    mapper: M,
    lookup: L,
    state: SharedNatState,
    mapped_port: Option<u16>,
}

impl NatManager {
    /// Create a manager with the UPnP backend and HTTP lookup fallback
    pub fn new(config: NatConfig) -> Self {
        let mapper = UpnpMapper::new(config.discovery_timeout);
        let lookup = HttpIpLookup::new(config.lookup_url.clone());
        Self::with_backends(config, mapper, lookup)
    }
}

impl<M: PortMapper, L: IpLookup> NatManager<M, L> {
    /// Create a manager with custom backends
    pub fn with_backends(config: NatConfig, mapper: M, lookup: L) -> Self {
        let state = NatState {
            enabled: false,
            public_address: None,
            local_address: discovery::local_address(),
            port: config.port,
        };
        Self {
            config,
            mapper,
            lookup,
            state: state.into_shared(),
            mapped_port: None,
        }
    }

    /// Shared handle to the addressing state
    pub fn state(&self) -> SharedNatState {
        Arc::clone(&self.state)
    }

    /// Current state snapshot
    pub fn current(&self) -> NatState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the startup sequence
    ///
    /// Each step is independent and non-fatal; when nothing succeeds the
    /// server keeps running and reports that manual configuration is needed.
    pub async fn startup(&mut self) {
        let local_address = self.current().local_address;
        tracing::info!(
            local = %local_address,
            port = self.config.port,
            "Starting NAT traversal"
        );

        // External address straight from the gateway
        let discovered = match timeout(self.config.discovery_timeout, self.mapper.discover()).await
        {
            Ok(Ok(external)) => {
                tracing::info!(external = %external, "Gateway reported external address");
                self.update(|state| state.public_address = Some(external));
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Gateway discovery failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.config.discovery_timeout,
                    "Gateway discovery timed out"
                );
                false
            }
        };

        // Port mapping, only meaningful once a gateway answered
        if discovered {
            let request = MappingRequest {
                external_port: self.config.port,
                local_addr: SocketAddr::new(local_address, self.config.port),
                lease: self.config.lease_duration,
                description: self.config.mapping_description.clone(),
            };
            match timeout(self.config.mapping_timeout, self.mapper.add_mapping(&request)).await {
                Ok(Ok(())) => {
                    tracing::info!(
                        port = self.config.port,
                        lease_secs = self.config.lease_duration.as_secs(),
                        "Port mapping established"
                    );
                    self.update(|state| state.enabled = true);
                    self.mapped_port = Some(self.config.port);
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "Port mapping failed"),
                Err(_) => tracing::warn!(
                    timeout = ?self.config.mapping_timeout,
                    "Port mapping timed out"
                ),
            }
        }

        // Fallback: ask a public lookup service what we look like from outside
        if self.current().public_address.is_none() {
            match timeout(self.config.lookup_timeout, self.lookup.lookup()).await {
                Ok(Ok(external)) => {
                    tracing::info!(external = %external, "External address resolved via lookup service");
                    self.update(|state| state.public_address = Some(external));
                }
                Ok(Err(e)) => tracing::warn!(error = %e, "External address lookup failed"),
                Err(_) => tracing::warn!(
                    timeout = ?self.config.lookup_timeout,
                    "External address lookup timed out"
                ),
            }
        }

        let state = self.current();
        if state.public_address.is_none() {
            tracing::warn!(
                "Automatic address discovery unavailable; the public address must be configured manually"
            );
        }
        tracing::info!(
            enabled = state.enabled,
            public = ?state.public_address,
            "NAT traversal startup complete"
        );
    }

    /// Best-effort teardown of the established mapping
    ///
    /// No retries; the unmap gets one bounded attempt and the caller proceeds
    /// to exit whatever the outcome. A manager that never mapped returns
    /// immediately.
    pub async fn shutdown(&mut self) {
        let Some(port) = self.mapped_port.take() else {
            return;
        };

        match timeout(
            self.config.teardown_timeout,
            self.mapper.remove_mapping(port),
        )
        .await
        {
            Ok(Ok(())) => tracing::info!(port = port, "Port mapping removed"),
            Ok(Err(e)) => tracing::warn!(port = port, error = %e, "Port unmapping failed"),
            Err(_) => tracing::warn!(port = port, "Port unmapping timed out"),
        }
        self.update(|state| state.enabled = false);
    }

    /// Drive the manager for the life of the process
    ///
    /// Runs startup, waits for `shutdown_signal`, then tears down. Intended
    /// to be spawned on its own task; a termination signal during startup
    /// cancels the remaining steps and still runs the teardown.
    pub async fn run_until<F>(mut self, shutdown_signal: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown_signal);
        tokio::select! {
            _ = &mut shutdown_signal => {
                tracing::info!("Shutdown signal received during NAT startup");
            }
            _ = self.startup() => {
                shutdown_signal.await;
            }
        }
        self.shutdown().await;
    }

    fn update(&self, apply: impl FnOnce(&mut NatState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nat::error::NatError;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const GATEWAY_IP: &str = "203.0.113.1";
    const LOOKUP_IP: &str = "198.51.100.2";

    struct StubMapper {
        discover_result: Result<IpAddr, NatError>,
        discover_delay: Option<Duration>,
        mapping_result: Result<(), NatError>,
        unmap_result: Result<(), NatError>,
        unmapped: Arc<AtomicBool>,
    }

    impl StubMapper {
        fn working() -> Self {
            Self {
                discover_result: Ok(GATEWAY_IP.parse().unwrap()),
                discover_delay: None,
                mapping_result: Ok(()),
                unmap_result: Ok(()),
                unmapped: Arc::new(AtomicBool::new(false)),
            }
        }

        fn unreachable() -> Self {
            Self {
                discover_result: Err(NatError::Gateway("no igd response".into())),
                ..Self::working()
            }
        }
    }

    impl PortMapper for StubMapper {
        async fn discover(&mut self) -> Result<IpAddr, NatError> {
            if let Some(delay) = self.discover_delay {
                tokio::time::sleep(delay).await;
            }
            self.discover_result.clone()
        }

        async fn add_mapping(&mut self, _request: &MappingRequest) -> Result<(), NatError> {
            self.mapping_result.clone()
        }

        async fn remove_mapping(&mut self, _external_port: u16) -> Result<(), NatError> {
            self.unmapped.store(true, Ordering::SeqCst);
            self.unmap_result.clone()
        }
    }

    struct StubLookup {
        result: Result<IpAddr, NatError>,
        calls: Arc<AtomicUsize>,
    }

    impl StubLookup {
        fn answering() -> Self {
            Self {
                result: Ok(LOOKUP_IP.parse().unwrap()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(NatError::Lookup("service unreachable".into())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl IpLookup for StubLookup {
        async fn lookup(&self) -> Result<IpAddr, NatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn config() -> NatConfig {
        NatConfig::for_port(3000)
    }

    #[tokio::test]
    async fn test_successful_mapping() {
        let mapper = StubMapper::working();
        let mut manager = NatManager::with_backends(config(), mapper, StubLookup::answering());

        manager.startup().await;

        let state = manager.current();
        assert!(state.enabled);
        assert_eq!(state.public_address, Some(GATEWAY_IP.parse().unwrap()));
        assert_eq!(state.port, 3000);
    }

    #[tokio::test]
    async fn test_mapping_success_skips_lookup_service() {
        let lookup = StubLookup::answering();
        let calls = Arc::clone(&lookup.calls);
        let mut manager = NatManager::with_backends(config(), StubMapper::working(), lookup);

        manager.startup().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discovery_timeout_falls_back_to_lookup() {
        let mapper = StubMapper {
            discover_delay: Some(Duration::from_secs(60)),
            ..StubMapper::working()
        };
        let config = config().discovery_timeout(Duration::from_millis(50));
        let mut manager = NatManager::with_backends(config, mapper, StubLookup::answering());

        manager.startup().await;

        let state = manager.current();
        assert!(!state.enabled);
        assert_eq!(state.public_address, Some(LOOKUP_IP.parse().unwrap()));
    }

    #[tokio::test]
    async fn test_gateway_failure_falls_back_to_lookup() {
        let mut manager =
            NatManager::with_backends(config(), StubMapper::unreachable(), StubLookup::answering());

        manager.startup().await;

        let state = manager.current();
        assert!(!state.enabled);
        assert_eq!(state.public_address, Some(LOOKUP_IP.parse().unwrap()));
    }

    #[tokio::test]
    async fn test_mapping_failure_keeps_gateway_address() {
        let mapper = StubMapper {
            mapping_result: Err(NatError::Mapping("ConflictInMappingEntry".into())),
            ..StubMapper::working()
        };
        let lookup = StubLookup::answering();
        let calls = Arc::clone(&lookup.calls);
        let mut manager = NatManager::with_backends(config(), mapper, lookup);

        manager.startup().await;

        let state = manager.current();
        assert!(!state.enabled);
        // Gateway already told us the external address, no lookup needed
        assert_eq!(state.public_address, Some(GATEWAY_IP.parse().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_total_failure_leaves_well_defined_state() {
        let mut manager =
            NatManager::with_backends(config(), StubMapper::unreachable(), StubLookup::failing());

        manager.startup().await;

        let state = manager.current();
        assert!(!state.enabled);
        assert_eq!(state.public_address, None);
        assert_eq!(state.port, 3000);
    }

    #[tokio::test]
    async fn test_shutdown_unmaps_once() {
        let mapper = StubMapper::working();
        let unmapped = Arc::clone(&mapper.unmapped);
        let mut manager = NatManager::with_backends(config(), mapper, StubLookup::answering());

        manager.startup().await;
        manager.shutdown().await;

        assert!(unmapped.load(Ordering::SeqCst));
        assert!(!manager.current().enabled);

        // A second shutdown finds nothing mapped
        unmapped.store(false, Ordering::SeqCst);
        manager.shutdown().await;
        assert!(!unmapped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_without_mapping_is_noop() {
        let mapper = StubMapper::unreachable();
        let unmapped = Arc::clone(&mapper.unmapped);
        let mut manager = NatManager::with_backends(config(), mapper, StubLookup::failing());

        manager.startup().await;
        manager.shutdown().await;

        assert!(!unmapped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_shutdown_proceeds_past_unmap_error() {
        let mapper = StubMapper {
            unmap_result: Err(NatError::Mapping("gateway rebooted".into())),
            ..StubMapper::working()
        };
        let unmapped = Arc::clone(&mapper.unmapped);
        let mut manager = NatManager::with_backends(config(), mapper, StubLookup::answering());

        manager.startup().await;
        manager.shutdown().await;

        // The attempt was made and the error absorbed
        assert!(unmapped.load(Ordering::SeqCst));
        assert!(!manager.current().enabled);
    }

    #[tokio::test]
    async fn test_run_until_completes_on_shutdown_signal() {
        let manager =
            NatManager::with_backends(config(), StubMapper::working(), StubLookup::answering());

        let done = tokio::time::timeout(
            Duration::from_secs(5),
            manager.run_until(std::future::ready(())),
        )
        .await;

        assert!(done.is_ok());
    }
}
